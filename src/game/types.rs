use serde::{Serialize, Deserialize};

use crate::config::game::BOARD_SIZE;
use crate::game::error::GameError;

/// A cell position on a 10x10 board. Both axes are in `0..BOARD_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u8,
    pub y: u8,
}

impl Coordinate {
    pub fn new(x: u8, y: u8) -> Result<Self, GameError> {
        if x >= BOARD_SIZE || y >= BOARD_SIZE {
            return Err(GameError::InvalidCoordinate { x, y });
        }
        Ok(Self { x, y })
    }

    /// Apply a signed offset, returning `None` if the result leaves the board.
    pub fn offset(self, dx: i16, dy: i16) -> Option<Self> {
        let x = self.x as i16 + dx;
        let y = self.y as i16 + dy;
        let size = BOARD_SIZE as i16;
        if x < 0 || y < 0 || x >= size || y >= size {
            return None;
        }
        Some(Self { x: x as u8, y: y as u8 })
    }
}

/// Kind of aircraft part. Only the head is critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipPart {
    Head,
    Wing,
    Body,
    Tail,
}

impl ShipPart {
    pub fn is_head(self) -> bool {
        self == ShipPart::Head
    }
}

/// Heading of an aircraft. `Up` is the baseline shape (head on top, tail below);
/// the others are clockwise rotations of it around the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[serde(alias = "horizontal")]
    Up,
    Right,
    Down,
    #[serde(alias = "vertical")]
    Left,
}

impl Orientation {
    #[cfg(test)]
    pub const ALL: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Right,
        Orientation::Down,
        Orientation::Left,
    ];

    /// Rotate a baseline offset into this orientation.
    pub fn rotate(self, dx: i16, dy: i16) -> (i16, i16) {
        match self {
            Orientation::Up => (dx, dy),
            Orientation::Right => (-dy, dx),
            Orientation::Down => (-dx, -dy),
            Orientation::Left => (dy, -dx),
        }
    }
}

/// State of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    Empty,
    Ship,
    Hit,
    Miss,
    Fatal,
}

impl CellState {
    /// True once the cell has received a shot. Shot cells are terminal.
    pub fn is_shot(self) -> bool {
        matches!(self, CellState::Hit | CellState::Miss | CellState::Fatal)
    }
}

/// Identifier of an aircraft, unique within one player's fleet.
pub type AircraftId = u8;

/// Result of a resolved shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    Miss,
    /// A non-head part was hit. `destroyed` is set when this hit finished the aircraft.
    Hit { destroyed: Option<AircraftId> },
    /// The head was hit; the aircraft is destroyed instantly. `destroyed` is `None` when
    /// attrition had already brought it down.
    Fatal { destroyed: Option<AircraftId> },
}

impl ShotOutcome {
    pub fn destroyed(&self) -> Option<AircraftId> {
        match *self {
            ShotOutcome::Miss => None,
            ShotOutcome::Hit { destroyed } | ShotOutcome::Fatal { destroyed } => destroyed,
        }
    }
}

/// Wire and storage label of a shot result, without the destruction detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotKind {
    Miss,
    Hit,
    Fatal,
}

impl From<ShotOutcome> for ShotKind {
    fn from(outcome: ShotOutcome) -> Self {
        match outcome {
            ShotOutcome::Miss => ShotKind::Miss,
            ShotOutcome::Hit { .. } => ShotKind::Hit,
            ShotOutcome::Fatal { .. } => ShotKind::Fatal,
        }
    }
}
