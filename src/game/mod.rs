//! Game domain: coordinates, aircraft, boards, player sessions and the match state machine.
//!
//! Nothing in here performs I/O; the server layer drives it one intent at a time.

pub mod types;
pub mod error;
pub mod state;

pub mod entities;
pub mod grid;
