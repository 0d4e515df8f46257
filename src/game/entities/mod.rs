//! Game entities module.
//!
//! This module organizes aircraft and player session logic.

pub mod aircraft;
pub mod player;

pub use aircraft::*;
pub use player::*;
