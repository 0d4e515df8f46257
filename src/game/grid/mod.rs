//! Grid module.
//!
//! Holds the per-player hidden board.

pub mod board;

pub use board::*;
