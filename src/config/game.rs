/// Game configuration constants.
/// 
/// This module defines the board dimensions and the fleet composition
/// every player must deploy before a match can start.
pub const BOARD_SIZE: u8 = 10;

/// Number of aircraft each player places per match.
pub const AIRCRAFT_PER_PLAYER: usize = 3;

/// Number of cells covered by a single aircraft (head included).
pub const AIRCRAFT_CELLS: usize = 10;
