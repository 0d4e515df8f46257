use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::game::entities::{Identity, MatchId};
use crate::game::state::{MatchStatus, Outcome, ShotTally};
use crate::persistence::{
    MatchStore, MatchSummary, MoveRecord, RecordStatus, SessionRecord, SessionRecordId, StoreError, UserStats,
};

/// Process-local store. Everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: SessionRecordId,
    sessions: HashMap<SessionRecordId, SessionRecord>,
    by_match: HashMap<MatchId, SessionRecordId>,
    stats: HashMap<i64, UserStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_mut(&mut self, match_id: MatchId) -> Result<&mut SessionRecord, StoreError> {
        let id = *self.by_match.get(&match_id).ok_or(StoreError::UnknownMatch(match_id))?;
        self.sessions.get_mut(&id).ok_or(StoreError::UnknownSession(id))
    }
}

impl MatchStore for MemoryStore {
    fn create_session(
        &mut self,
        match_id: MatchId,
        player1: &Identity,
        player2: &Identity,
    ) -> Result<SessionRecordId, StoreError> {
        if self.by_match.contains_key(&match_id) {
            return Err(StoreError::DuplicateMatch(match_id));
        }
        self.next_id += 1;
        let id = self.next_id;
        self.sessions.insert(
            id,
            SessionRecord {
                id,
                match_id,
                player1: player1.clone(),
                player2: player2.clone(),
                status: RecordStatus::Placing,
                winner_id: None,
                duration_secs: None,
                created_at: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
                moves: Vec::new(),
            },
        );
        self.by_match.insert(match_id, id);
        debug!("[MemoryStore] Created session record {} for match {}", id, match_id);
        Ok(id)
    }

    fn record_move(&mut self, session: SessionRecordId, record: MoveRecord) -> Result<(), StoreError> {
        let entry = self
            .sessions
            .get_mut(&session)
            .ok_or(StoreError::UnknownSession(session))?;
        entry.moves.push(record);
        Ok(())
    }

    fn update_status(
        &mut self,
        match_id: MatchId,
        status: MatchStatus,
        winner_id: Option<i64>,
        duration_secs: Option<u64>,
    ) -> Result<(), StoreError> {
        let entry = self.record_mut(match_id)?;
        entry.status = status.into();
        if winner_id.is_some() {
            entry.winner_id = winner_id;
        }
        if duration_secs.is_some() {
            entry.duration_secs = duration_secs;
        }
        Ok(())
    }

    fn update_user_stats(
        &mut self,
        user_id: i64,
        outcome: Outcome,
        tally: ShotTally,
        duration_secs: u64,
    ) -> Result<(), StoreError> {
        let stats = self.stats.entry(user_id).or_default();
        let previous_games = stats.games_played as f64;

        stats.games_played += 1;
        match outcome {
            Outcome::Win => stats.games_won += 1,
            Outcome::Lose => stats.games_lost += 1,
        }
        stats.total_shots += tally.shots;
        stats.hits += tally.hits;
        stats.misses += tally.misses;
        stats.fatal_hits += tally.fatal_hits;

        let games = stats.games_played as f64;
        stats.average_game_duration =
            (stats.average_game_duration * previous_games + duration_secs as f64) / games;
        stats.win_rate = stats.games_won as f64 / games * 100.0;
        Ok(())
    }

    fn abandon_session(&mut self, match_id: MatchId) -> Result<(), StoreError> {
        let entry = self.record_mut(match_id)?;
        entry.status = RecordStatus::Abandoned;
        debug!("[MemoryStore] Session record {} abandoned after {} moves", entry.id, entry.moves.len());
        Ok(())
    }

    fn user_stats(&self, user_id: i64) -> Option<UserStats> {
        self.stats.get(&user_id).cloned()
    }

    fn matches_for_user(&self, user_id: i64, limit: usize) -> Vec<MatchSummary> {
        let mut records: Vec<&SessionRecord> = self.sessions.values().collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records
            .into_iter()
            .filter_map(|record| record.summary_for(user_id))
            .take(limit)
            .collect()
    }

    fn match_details(&self, match_id: MatchId) -> Option<SessionRecord> {
        self.by_match.get(&match_id).and_then(|id| self.sessions.get(id)).cloned()
    }
}
