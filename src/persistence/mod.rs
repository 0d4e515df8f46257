//! Persistence collaborator.
//!
//! Completed and in-flight matches between two authenticated players are recorded through
//! a `MatchStore`. The arena never talks to the store directly: it emits `PersistCommand`s
//! that the `Recorder` actor applies in the background, so storage failures can neither
//! block nor undo gameplay.

pub mod memory;
pub mod recorder;

use actix::prelude::*;
use serde::{Serialize, Deserialize};

use crate::game::entities::{Identity, MatchId};
use crate::game::state::{MatchStatus, Outcome, ShotTally};
use crate::game::types::{Coordinate, ShotKind};

/// Identifier handed out by `MatchStore::create_session`.
pub type SessionRecordId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    PlaceShips,
    Shoot,
}

/// One entry of a match's move log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub player_id: i64,
    pub kind: MoveKind,
    pub coordinate: Option<Coordinate>,
    pub result: Option<ShotKind>,
    pub move_number: u32,
}

/// Cumulative per-user statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStats {
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub total_shots: u32,
    pub hits: u32,
    pub misses: u32,
    pub fatal_hits: u32,
    pub average_game_duration: f64,
    /// Percentage in `0.0..=100.0`.
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no session record for match {0}")]
    UnknownMatch(MatchId),

    #[error("no session record with id {0}")]
    UnknownSession(SessionRecordId),

    #[error("a session record already exists for match {0}")]
    DuplicateMatch(MatchId),

}

/// Lifecycle of a stored record. `Abandoned` marks a tracked match torn down by a
/// disconnect; it never counts as a completed game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Placing,
    Playing,
    Finished,
    Abandoned,
}

impl From<MatchStatus> for RecordStatus {
    fn from(status: MatchStatus) -> Self {
        match status {
            MatchStatus::Placing => RecordStatus::Placing,
            MatchStatus::Playing => RecordStatus::Playing,
            MatchStatus::Finished => RecordStatus::Finished,
        }
    }
}

/// A stored match with its ordered move log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub id: SessionRecordId,
    pub match_id: MatchId,
    pub player1: Identity,
    pub player2: Identity,
    pub status: RecordStatus,
    pub winner_id: Option<i64>,
    pub duration_secs: Option<u64>,
    /// Unix seconds.
    pub created_at: u64,
    pub moves: Vec<MoveRecord>,
}

impl SessionRecord {
    /// One line of `user_id`'s match history, or `None` if they did not play in it.
    pub fn summary_for(&self, user_id: i64) -> Option<MatchSummary> {
        let opponent = if self.player1.id == user_id {
            &self.player2
        } else if self.player2.id == user_id {
            &self.player1
        } else {
            return None;
        };
        let outcome = match (self.status, self.winner_id) {
            (RecordStatus::Finished, Some(winner)) if winner == user_id => Some(Outcome::Win),
            (RecordStatus::Finished, Some(_)) => Some(Outcome::Lose),
            _ => None,
        };
        Some(MatchSummary {
            match_id: self.match_id,
            opponent: opponent.clone(),
            status: self.status,
            outcome,
            duration_secs: self.duration_secs,
            created_at: self.created_at,
            move_count: self.moves.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub opponent: Identity,
    pub status: RecordStatus,
    pub outcome: Option<Outcome>,
    pub duration_secs: Option<u64>,
    pub created_at: u64,
    pub move_count: usize,
}

pub trait MatchStore {
    fn create_session(
        &mut self,
        match_id: MatchId,
        player1: &Identity,
        player2: &Identity,
    ) -> Result<SessionRecordId, StoreError>;

    fn record_move(&mut self, session: SessionRecordId, record: MoveRecord) -> Result<(), StoreError>;

    fn update_status(
        &mut self,
        match_id: MatchId,
        status: MatchStatus,
        winner_id: Option<i64>,
        duration_secs: Option<u64>,
    ) -> Result<(), StoreError>;

    fn update_user_stats(
        &mut self,
        user_id: i64,
        outcome: Outcome,
        tally: ShotTally,
        duration_secs: u64,
    ) -> Result<(), StoreError>;

    /// Mark a match as abandoned. Its record keeps the moves played so far.
    fn abandon_session(&mut self, match_id: MatchId) -> Result<(), StoreError>;

    fn user_stats(&self, user_id: i64) -> Option<UserStats>;

    /// Most recent matches first, at most `limit`.
    fn matches_for_user(&self, user_id: i64, limit: usize) -> Vec<MatchSummary>;

    fn match_details(&self, match_id: MatchId) -> Option<SessionRecord>;
}

/// Fire-and-forget write emitted by the arena for tracked matches.
#[derive(Message, Debug, Clone, PartialEq)]
#[rtype(result = "()")]
pub enum PersistCommand {
    CreateSession {
        match_id: MatchId,
        player1: Identity,
        player2: Identity,
    },
    RecordMove {
        match_id: MatchId,
        player_id: i64,
        kind: MoveKind,
        coordinate: Option<Coordinate>,
        result: Option<ShotKind>,
        move_number: u32,
    },
    UpdateStatus {
        match_id: MatchId,
        status: MatchStatus,
        winner_id: Option<i64>,
        duration_secs: Option<u64>,
    },
    UpdateUserStats {
        user_id: i64,
        outcome: Outcome,
        tally: ShotTally,
        duration_secs: u64,
    },
    /// The match was torn down before it finished.
    Abandon {
        match_id: MatchId,
    },
}
