//! Gameplay error types.
//!
//! `GameError` covers everything an inbound intent can be refused for. Each variant maps
//! to a `RejectCode` that is sent back to the offending session only.

use serde::{Serialize, Deserialize};

use crate::game::types::Coordinate;

/// Machine-readable reason attached to a `Rejected` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectCode {
    NotYourTurn,
    NotPlaying,
    NotPlacing,
    AlreadyPlaced,
    WrongAircraftCount,
    OutOfBounds,
    Overlap,
    InvalidCoordinate,
    NotInMatch,
    AlreadyInMatch,
    StaleMatch,
    InvalidMessage,
    RateLimited,
    Internal,
}

/// Why a candidate aircraft cannot be placed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("expected {expected} aircraft, got {got}")]
    WrongCount { expected: usize, got: usize },

    #[error("aircraft {index} leaves the board")]
    OutOfBounds { index: usize },

    #[error("aircraft {index} overlaps an aircraft already placed at ({}, {})", .at.x, .at.y)]
    Overlap { index: usize, at: Coordinate },
}

/// Board invariant violations. Callers validate first, so these indicate a bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("cell ({}, {}) is already occupied or shot", .0.x, .0.y)]
    Occupied(Coordinate),

    #[error("cell ({}, {}) has already been shot", .0.x, .0.y)]
    AlreadyShot(Coordinate),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("not your turn")]
    NotYourTurn,

    #[error("match is not in play")]
    NotPlaying,

    #[error("match is no longer accepting placements")]
    NotPlacing,

    #[error("aircraft already placed for this match")]
    AlreadyPlaced,

    #[error("coordinate ({x}, {y}) is outside the board")]
    InvalidCoordinate { x: u8, y: u8 },

    #[error("session is not a participant of this match")]
    NotInMatch,

    #[error("session is already in a match")]
    AlreadyInMatch,

    #[error("match is not the session's current match")]
    StaleMatch,

    #[error("invalid placement: {0}")]
    Placement(#[from] PlacementError),

    #[error("board invariant violated: {0}")]
    Board(#[from] BoardError),
}

impl GameError {
    pub fn code(&self) -> RejectCode {
        match self {
            GameError::NotYourTurn => RejectCode::NotYourTurn,
            GameError::NotPlaying => RejectCode::NotPlaying,
            GameError::NotPlacing => RejectCode::NotPlacing,
            GameError::AlreadyPlaced => RejectCode::AlreadyPlaced,
            GameError::InvalidCoordinate { .. } => RejectCode::InvalidCoordinate,
            GameError::NotInMatch => RejectCode::NotInMatch,
            GameError::AlreadyInMatch => RejectCode::AlreadyInMatch,
            GameError::StaleMatch => RejectCode::StaleMatch,
            GameError::Placement(PlacementError::WrongCount { .. }) => RejectCode::WrongAircraftCount,
            GameError::Placement(PlacementError::OutOfBounds { .. }) => RejectCode::OutOfBounds,
            GameError::Placement(PlacementError::Overlap { .. }) => RejectCode::Overlap,
            GameError::Board(_) => RejectCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_errors_map_to_codes() {
        let err: GameError = PlacementError::WrongCount { expected: 3, got: 2 }.into();
        assert_eq!(err.code(), RejectCode::WrongAircraftCount);
        assert_eq!(err.to_string(), "invalid placement: expected 3 aircraft, got 2");

        let err: GameError = PlacementError::Overlap { index: 1, at: Coordinate { x: 4, y: 5 } }.into();
        assert_eq!(err.code(), RejectCode::Overlap);
        assert!(err.to_string().contains("(4, 5)"));
    }

    #[test]
    fn test_reject_code_wire_format() {
        let json = serde_json::to_string(&RejectCode::NotYourTurn).unwrap();
        assert_eq!(json, "\"NOT_YOUR_TURN\"");
    }
}
