use std::time::Instant;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::config::game::{AIRCRAFT_PER_PLAYER, BOARD_SIZE};
use crate::config::matchmaking::GUEST_USERNAME;
use crate::game::entities::aircraft::Aircraft;
use crate::game::error::{GameError, PlacementError};
use crate::game::grid::Board;
use crate::game::types::{AircraftId, Coordinate, Orientation};

/// Opaque identity of one websocket connection.
pub type ConnectionId = Uuid;

/// Identifier of a match.
pub type MatchId = Uuid;

/// Authenticated user, as resolved by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
}

/// Candidate aircraft submitted by a client: head position and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftConfig {
    pub x: u8,
    pub y: u8,
    pub orientation: Orientation,
}

/// Ephemeral, game-relevant state of one connected player.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub id: ConnectionId,
    pub identity: Option<Identity>,
    /// Set by `join(anonymous = true)`: play the next pairing as a guest even if authenticated.
    pub guest: bool,
    pub board: Board,
    pub aircraft: Vec<Aircraft>,
    pub ready: bool,
    pub connected_at: Instant,
    /// Current or last match. Cleared when the session moves on.
    pub match_id: Option<MatchId>,
}

impl PlayerSession {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            identity: None,
            guest: false,
            board: Board::new(),
            aircraft: Vec::new(),
            ready: false,
            connected_at: Instant::now(),
            match_id: None,
        }
    }

    /// Identity used for persistence, `None` for guests.
    pub fn tracked_identity(&self) -> Option<&Identity> {
        if self.guest {
            None
        } else {
            self.identity.as_ref()
        }
    }

    pub fn display_name(&self) -> &str {
        self.tracked_identity()
            .map(|i| i.username.as_str())
            .unwrap_or(GUEST_USERNAME)
    }

    /// Clear board, aircraft and ready flag before a fresh pairing.
    pub fn reset_for_match(&mut self) {
        self.board = Board::new();
        self.aircraft.clear();
        self.ready = false;
    }

    /// Validate and deploy exactly three aircraft. On error nothing changes.
    pub fn deploy(&mut self, configs: &[AircraftConfig]) -> Result<(), GameError> {
        if self.ready {
            return Err(GameError::AlreadyPlaced);
        }
        if configs.len() != AIRCRAFT_PER_PLAYER {
            return Err(PlacementError::WrongCount {
                expected: AIRCRAFT_PER_PLAYER,
                got: configs.len(),
            }
            .into());
        }

        let mut occupied: Vec<Coordinate> = self.board.ship_coordinates();
        let mut fleet = Vec::with_capacity(AIRCRAFT_PER_PLAYER);
        for (index, config) in configs.iter().enumerate() {
            if config.x >= BOARD_SIZE || config.y >= BOARD_SIZE {
                return Err(PlacementError::OutOfBounds { index }.into());
            }
            let head = Coordinate::new(config.x, config.y)?;
            Aircraft::can_place(index, head, config.orientation, &occupied)?;
            let aircraft = Aircraft::new(index as AircraftId, head, config.orientation)?;
            occupied.extend(aircraft.coordinates());
            fleet.push(aircraft);
        }

        let mut board = self.board;
        for aircraft in &fleet {
            board = board.place_ship(aircraft.coordinates())?;
        }

        self.board = board;
        self.aircraft = fleet;
        self.ready = true;
        Ok(())
    }

    /// True once every aircraft is destroyed. The board is used as a cross-check.
    pub fn has_lost(&self) -> bool {
        if !self.ready {
            return false;
        }
        let fleet_down = !self.aircraft.is_empty() && self.aircraft.iter().all(|a| a.is_destroyed());
        fleet_down || !self.board.has_ships_remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::standard_fleet;
    use crate::game::types::CellState;

    #[test]
    fn test_deploy_marks_thirty_cells() {
        let mut session = PlayerSession::new(Uuid::new_v4());
        session.deploy(&standard_fleet()).unwrap();
        assert!(session.ready);
        assert_eq!(session.aircraft.len(), 3);
        assert_eq!(session.board.count(CellState::Ship), 30);
        let ids: Vec<AircraftId> = session.aircraft.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_deploy_rejects_wrong_count() {
        let mut session = PlayerSession::new(Uuid::new_v4());
        let err = session.deploy(&standard_fleet()[..2]).unwrap_err();
        assert_eq!(err, GameError::Placement(PlacementError::WrongCount { expected: 3, got: 2 }));
        assert!(!session.ready);
        assert_eq!(session.board.count(CellState::Ship), 0);
    }

    #[test]
    fn test_deploy_rejects_overlap_within_same_call() {
        let mut session = PlayerSession::new(Uuid::new_v4());
        let mut fleet = standard_fleet();
        fleet[2] = AircraftConfig { x: 3, y: 1, orientation: Orientation::Up };
        let err = session.deploy(&fleet).unwrap_err();
        assert!(matches!(err, GameError::Placement(PlacementError::Overlap { index: 2, .. })));
        assert!(!session.ready);
        assert!(session.aircraft.is_empty());
    }

    #[test]
    fn test_deploy_rejects_out_of_bounds() {
        let mut session = PlayerSession::new(Uuid::new_v4());
        let mut fleet = standard_fleet();
        fleet[0] = AircraftConfig { x: 0, y: 0, orientation: Orientation::Up };
        let err = session.deploy(&fleet).unwrap_err();
        assert_eq!(err, GameError::Placement(PlacementError::OutOfBounds { index: 0 }));

        fleet[0] = AircraftConfig { x: 12, y: 0, orientation: Orientation::Up };
        let err = session.deploy(&fleet).unwrap_err();
        assert_eq!(err, GameError::Placement(PlacementError::OutOfBounds { index: 0 }));
    }

    #[test]
    fn test_deploy_twice_is_refused() {
        let mut session = PlayerSession::new(Uuid::new_v4());
        session.deploy(&standard_fleet()).unwrap();
        assert_eq!(session.deploy(&standard_fleet()), Err(GameError::AlreadyPlaced));
    }

    #[test]
    fn test_reset_for_match() {
        let mut session = PlayerSession::new(Uuid::new_v4());
        session.deploy(&standard_fleet()).unwrap();
        session.reset_for_match();
        assert!(!session.ready);
        assert!(session.aircraft.is_empty());
        assert_eq!(session.board, Board::new());
    }

    #[test]
    fn test_guest_hides_identity() {
        let mut session = PlayerSession::new(Uuid::new_v4());
        session.identity = Some(Identity { id: 7, username: "ace".into() });
        assert_eq!(session.display_name(), "ace");
        session.guest = true;
        assert!(session.tracked_identity().is_none());
        assert_eq!(session.display_name(), GUEST_USERNAME);
    }
}
