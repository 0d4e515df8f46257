//! Match state machine.
//!
//! A `Match` references its two participants by connection id; the sessions themselves
//! (boards, aircraft, ready flags) are owned by the arena and lent to the match for the
//! duration of one operation. Status only moves PLACING → PLAYING → FINISHED.

use std::time::Instant;

use serde::{Serialize, Deserialize};

use crate::game::entities::{AircraftConfig, ConnectionId, MatchId, PlayerSession};
use crate::game::error::{BoardError, GameError};
use crate::game::types::{CellState, Coordinate, ShotOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Placing,
    Playing,
    Finished,
}

/// Seat of a participant. `Player1` waited longer and shoots first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player1,
    Player2,
}

/// How a finished match ended for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
}

/// Per-participant shot counters, fed into user statistics when the match completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotTally {
    pub shots: u32,
    pub hits: u32,
    pub misses: u32,
    pub fatal_hits: u32,
}

impl ShotTally {
    fn record(&mut self, outcome: &ShotOutcome) {
        self.shots += 1;
        match outcome {
            ShotOutcome::Miss => self.misses += 1,
            ShotOutcome::Hit { .. } => self.hits += 1,
            ShotOutcome::Fatal { .. } => {
                self.hits += 1;
                self.fatal_hits += 1;
            }
        }
    }
}

/// What a processed shot did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotReport {
    pub coordinate: Coordinate,
    pub outcome: ShotOutcome,
    pub move_number: u32,
    /// The defender lost their last aircraft and the match is now FINISHED.
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct Match {
    pub id: MatchId,
    /// `players[0]` is player1 (first turn), `players[1]` is player2.
    pub players: [ConnectionId; 2],
    /// Both participants were authenticated when the match was formed.
    pub tracked: bool,
    pub started_at: Instant,
    status: MatchStatus,
    turn: ConnectionId,
    move_count: u32,
    winner: Option<ConnectionId>,
    tallies: [ShotTally; 2],
}

impl Match {
    pub fn new(id: MatchId, first: ConnectionId, second: ConnectionId, tracked: bool) -> Self {
        Self {
            id,
            players: [first, second],
            tracked,
            started_at: Instant::now(),
            status: MatchStatus::Placing,
            turn: first,
            move_count: 0,
            winner: None,
            tallies: [ShotTally::default(); 2],
        }
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Current turn holder. Only meaningful while PLAYING.
    pub fn turn(&self) -> Option<ConnectionId> {
        (self.status == MatchStatus::Playing).then_some(self.turn)
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn winner(&self) -> Option<ConnectionId> {
        self.winner
    }

    /// Win/lose from one participant's point of view, once the match is decided.
    pub fn outcome_for(&self, id: ConnectionId) -> Option<Outcome> {
        let winner = self.winner?;
        if !self.is_participant(id) {
            return None;
        }
        Some(if winner == id { Outcome::Win } else { Outcome::Lose })
    }

    pub fn is_active(&self) -> bool {
        self.status != MatchStatus::Finished
    }

    pub fn is_participant(&self, id: ConnectionId) -> bool {
        self.players.contains(&id)
    }

    pub fn role_of(&self, id: ConnectionId) -> Option<Role> {
        if self.players[0] == id {
            Some(Role::Player1)
        } else if self.players[1] == id {
            Some(Role::Player2)
        } else {
            None
        }
    }

    pub fn opponent_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        match self.role_of(id)? {
            Role::Player1 => Some(self.players[1]),
            Role::Player2 => Some(self.players[0]),
        }
    }

    pub fn tally(&self, id: ConnectionId) -> ShotTally {
        match self.role_of(id) {
            Some(Role::Player1) => self.tallies[0],
            Some(Role::Player2) => self.tallies[1],
            None => ShotTally::default(),
        }
    }

    pub fn duration_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Deploy a participant's three aircraft. Valid only while PLACING and only once.
    /// Returns the move number assigned to the placement.
    pub fn place_ships(&mut self, session: &mut PlayerSession, configs: &[AircraftConfig]) -> Result<u32, GameError> {
        if !self.is_participant(session.id) {
            return Err(GameError::NotInMatch);
        }
        if self.status != MatchStatus::Placing {
            return Err(GameError::NotPlacing);
        }
        session.deploy(configs)?;
        self.move_count += 1;
        Ok(self.move_count)
    }

    /// PLACING → PLAYING, with player1 holding the first turn. Returns false if not PLACING.
    pub fn start(&mut self) -> bool {
        if self.status != MatchStatus::Placing {
            return false;
        }
        self.status = MatchStatus::Playing;
        self.turn = self.players[0];
        true
    }

    /// Fire at the defender's board.
    ///
    /// Returns `Ok(None)` when the cell was already shot: the request is ignored with no
    /// state change and no turn change.
    pub fn fire(
        &mut self,
        shooter: ConnectionId,
        defender: &mut PlayerSession,
        coordinate: Coordinate,
    ) -> Result<Option<ShotReport>, GameError> {
        if !self.is_participant(shooter) {
            return Err(GameError::NotInMatch);
        }
        if self.status != MatchStatus::Playing {
            return Err(GameError::NotPlaying);
        }
        if self.turn != shooter {
            return Err(GameError::NotYourTurn);
        }
        if self.opponent_of(shooter) != Some(defender.id) {
            return Err(GameError::NotInMatch);
        }
        if defender.board.is_cell_shot(coordinate) {
            return Ok(None);
        }

        let outcome = resolve_shot(defender, coordinate)?;
        self.move_count += 1;
        if let Some(idx) = self.players.iter().position(|p| *p == shooter) {
            self.tallies[idx].record(&outcome);
        }

        let finished = defender.has_lost();
        if finished {
            self.status = MatchStatus::Finished;
            self.winner = Some(shooter);
        } else {
            self.turn = defender.id;
        }

        Ok(Some(ShotReport {
            coordinate,
            outcome,
            move_number: self.move_count,
            finished,
        }))
    }
}

/// Apply one shot to an unshot cell of the defender's board and update aircraft state.
///
/// A head hit is always FATAL and destroys the aircraft outright. A non-head hit destroys
/// it once every non-head part is HIT or FATAL, whether or not the head was ever touched.
/// Nothing is destroyed twice.
fn resolve_shot(defender: &mut PlayerSession, coordinate: Coordinate) -> Result<ShotOutcome, BoardError> {
    let board = defender.board;
    let Some(aircraft) = defender
        .aircraft
        .iter_mut()
        .find(|a| a.part_at(coordinate).is_some())
    else {
        defender.board = board.shoot(coordinate, false, false)?;
        return Ok(ShotOutcome::Miss);
    };

    let is_head = aircraft.part_at(coordinate).is_some_and(|p| p.is_head());
    let already_down = aircraft.is_destroyed();

    if is_head {
        defender.board = board.shoot(coordinate, true, true)?;
        if already_down {
            return Ok(ShotOutcome::Fatal { destroyed: None });
        }
        aircraft.destroy();
        return Ok(ShotOutcome::Fatal { destroyed: Some(aircraft.id) });
    }

    if already_down {
        defender.board = board.shoot(coordinate, true, false)?;
        return Ok(ShotOutcome::Hit { destroyed: None });
    }

    let next = board.shoot(coordinate, true, false)?;
    let worn_down = aircraft
        .parts()
        .iter()
        .filter(|p| !p.kind.is_head())
        .all(|p| matches!(next.cell(p.coordinate), CellState::Hit | CellState::Fatal));
    defender.board = next;
    if worn_down {
        aircraft.destroy();
        return Ok(ShotOutcome::Hit { destroyed: Some(aircraft.id) });
    }
    Ok(ShotOutcome::Hit { destroyed: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use crate::game::test_support::standard_fleet;
    use crate::game::types::ShipPart;

    fn coord(x: u8, y: u8) -> Coordinate {
        Coordinate::new(x, y).unwrap()
    }

    /// A match in PLAYING state with both fleets deployed. X is player1.
    fn playing_match() -> (Match, PlayerSession, PlayerSession) {
        let mut x = PlayerSession::new(Uuid::new_v4());
        let mut y = PlayerSession::new(Uuid::new_v4());
        let mut game = Match::new(Uuid::new_v4(), x.id, y.id, false);
        game.place_ships(&mut x, &standard_fleet()).unwrap();
        game.place_ships(&mut y, &standard_fleet()).unwrap();
        assert!(game.start());
        (game, x, y)
    }

    /// Cells on the standard fleet layout that never hold an aircraft part.
    fn empty_cells() -> impl Iterator<Item = Coordinate> {
        (0..10).flat_map(|x| [coord(x, 4), coord(x, 9)])
    }

    #[test]
    fn test_status_only_moves_forward() {
        let (mut game, _, _) = playing_match();
        assert_eq!(game.status(), MatchStatus::Playing);
        assert!(!game.start());
        assert_eq!(game.status(), MatchStatus::Playing);
    }

    #[test]
    fn test_place_ships_after_start_is_refused() {
        let (mut game, mut x, _) = playing_match();
        x.reset_for_match();
        assert_eq!(game.place_ships(&mut x, &standard_fleet()), Err(GameError::NotPlacing));
    }

    #[test]
    fn test_place_ships_by_outsider_is_refused() {
        let mut outsider = PlayerSession::new(Uuid::new_v4());
        let mut game = Match::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), false);
        assert_eq!(game.place_ships(&mut outsider, &standard_fleet()), Err(GameError::NotInMatch));
    }

    #[test]
    fn test_first_turn_belongs_to_player1() {
        let (game, x, _) = playing_match();
        assert_eq!(game.turn(), Some(x.id));
        assert_eq!(game.role_of(x.id), Some(Role::Player1));
    }

    #[test]
    fn test_shooting_out_of_turn_changes_nothing() {
        let (mut game, mut x, mut y) = playing_match();
        let before = x.board;
        assert_eq!(game.fire(y.id, &mut x, coord(2, 0)), Err(GameError::NotYourTurn));
        assert_eq!(x.board, before);
        assert_eq!(game.turn(), Some(x.id));
        // Still X's turn afterwards.
        assert!(game.fire(x.id, &mut y, coord(0, 9)).unwrap().is_some());
    }

    #[test]
    fn test_shooting_while_placing_is_refused() {
        let x = PlayerSession::new(Uuid::new_v4());
        let mut y = PlayerSession::new(Uuid::new_v4());
        let mut game = Match::new(Uuid::new_v4(), x.id, y.id, false);
        game.place_ships(&mut y, &standard_fleet()).unwrap();
        assert_eq!(game.fire(x.id, &mut y, coord(2, 0)), Err(GameError::NotPlaying));
    }

    #[test]
    fn test_head_hit_is_fatal_and_flips_turn() {
        let (mut game, x, mut y) = playing_match();
        let report = game.fire(x.id, &mut y, coord(2, 0)).unwrap().unwrap();
        assert_eq!(report.outcome, ShotOutcome::Fatal { destroyed: Some(0) });
        assert!(!report.finished);
        assert!(y.aircraft[0].is_destroyed());
        assert_eq!(y.board.cell(coord(2, 0)), CellState::Fatal);
        assert_eq!(game.turn(), Some(y.id));
    }

    #[test]
    fn test_miss_marks_cell() {
        let (mut game, x, mut y) = playing_match();
        let report = game.fire(x.id, &mut y, coord(5, 4)).unwrap().unwrap();
        assert_eq!(report.outcome, ShotOutcome::Miss);
        assert_eq!(y.board.cell(coord(5, 4)), CellState::Miss);
    }

    #[test]
    fn test_repeat_shot_is_ignored() {
        let (mut game, mut x, mut y) = playing_match();
        game.fire(x.id, &mut y, coord(3, 1)).unwrap();
        game.fire(y.id, &mut x, coord(0, 9)).unwrap();

        let board = y.board;
        let moves = game.move_count();
        assert_eq!(game.fire(x.id, &mut y, coord(3, 1)), Ok(None));
        assert_eq!(y.board, board);
        assert_eq!(game.move_count(), moves);
        assert_eq!(game.turn(), Some(x.id));
    }

    #[test]
    fn test_attrition_destroys_on_ninth_body_hit() {
        let (mut game, mut x, mut y) = playing_match();
        let body: Vec<Coordinate> = y.aircraft[2]
            .parts()
            .iter()
            .filter(|p| p.kind != ShipPart::Head)
            .map(|p| p.coordinate)
            .collect();
        assert_eq!(body.len(), 9);

        let mut misses = empty_cells();
        for (i, target) in body.iter().enumerate() {
            let report = game.fire(x.id, &mut y, *target).unwrap().unwrap();
            if i < 8 {
                assert_eq!(report.outcome, ShotOutcome::Hit { destroyed: None });
                assert!(!y.aircraft[2].is_destroyed());
            } else {
                assert_eq!(report.outcome, ShotOutcome::Hit { destroyed: Some(2) });
                assert!(y.aircraft[2].is_destroyed());
            }
            game.fire(y.id, &mut x, misses.next().unwrap()).unwrap();
        }
        // The head was never touched.
        let head = y.aircraft[2].head;
        assert_eq!(y.board.cell(head), CellState::Ship);

        // Shooting it afterwards is still fatal, without a second destruction.
        let report = game.fire(x.id, &mut y, head).unwrap().unwrap();
        assert_eq!(report.outcome, ShotOutcome::Fatal { destroyed: None });
        assert_eq!(y.board.cell(head), CellState::Fatal);
        assert!(y.aircraft[2].is_destroyed());
        assert_eq!(game.tally(x.id).fatal_hits, 1);
    }

    #[test]
    fn test_turn_alternates_strictly() {
        let (mut game, mut x, mut y) = playing_match();
        let mut cells = empty_cells();
        for i in 0..10 {
            let (shooter, defender) = if i % 2 == 0 { (x.id, &mut y) } else { (y.id, &mut x) };
            assert_eq!(game.turn(), Some(shooter));
            game.fire(shooter, defender, cells.next().unwrap()).unwrap().unwrap();
        }
        assert_eq!(game.turn(), Some(x.id));
        assert_eq!(game.tally(x.id).misses, 5);
        assert_eq!(game.tally(y.id).shots, 5);
    }

    #[test]
    fn test_match_finishes_exactly_once() {
        let (mut game, mut x, mut y) = playing_match();
        let heads: Vec<Coordinate> = y.aircraft.iter().map(|a| a.head).collect();
        let mut misses = empty_cells();

        for (i, head) in heads.iter().enumerate() {
            let report = game.fire(x.id, &mut y, *head).unwrap().unwrap();
            assert_eq!(report.finished, i == 2);
            if i < 2 {
                assert_eq!(game.status(), MatchStatus::Playing);
                game.fire(y.id, &mut x, misses.next().unwrap()).unwrap();
            }
        }

        assert_eq!(game.status(), MatchStatus::Finished);
        assert_eq!(game.winner(), Some(x.id));
        assert_eq!(game.outcome_for(x.id), Some(Outcome::Win));
        assert_eq!(game.outcome_for(y.id), Some(Outcome::Lose));
        assert!(y.has_lost());
        assert_eq!(game.turn(), None);
        assert_eq!(game.tally(x.id).fatal_hits, 3);
        assert_eq!(game.fire(x.id, &mut y, coord(0, 9)), Err(GameError::NotPlaying));
    }

    #[test]
    fn test_shot_on_wreckage_is_a_plain_hit() {
        let (mut game, mut x, mut y) = playing_match();
        game.fire(x.id, &mut y, coord(2, 0)).unwrap();
        game.fire(y.id, &mut x, coord(0, 9)).unwrap();
        let report = game.fire(x.id, &mut y, coord(2, 1)).unwrap().unwrap();
        assert_eq!(report.outcome, ShotOutcome::Hit { destroyed: None });
        assert_eq!(y.board.cell(coord(2, 1)), CellState::Hit);
    }
}
