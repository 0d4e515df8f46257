use std::collections::HashMap;

use actix::prelude::*;
use log::{debug, error};

use crate::game::entities::MatchId;
use crate::game::state::MatchStatus;
use crate::persistence::{
    MatchStore, MatchSummary, MoveRecord, PersistCommand, SessionRecord, SessionRecordId, StoreError, UserStats,
};

/// Background writer. Owns the store and the match id → session record mapping.
pub struct Recorder {
    store: Box<dyn MatchStore>,
    sessions: HashMap<MatchId, SessionRecordId>,
}

impl Recorder {
    pub fn new<S: MatchStore + 'static>(store: S) -> Self {
        Self {
            store: Box::new(store),
            sessions: HashMap::new(),
        }
    }

    pub fn apply(&mut self, command: PersistCommand) -> Result<(), StoreError> {
        match command {
            PersistCommand::CreateSession { match_id, player1, player2 } => {
                let record = self.store.create_session(match_id, &player1, &player2)?;
                self.sessions.insert(match_id, record);
                debug!("[Recorder] Match {} -> session record {}", match_id, record);
            }
            PersistCommand::RecordMove { match_id, player_id, kind, coordinate, result, move_number } => {
                let record = *self.sessions.get(&match_id).ok_or(StoreError::UnknownMatch(match_id))?;
                self.store.record_move(
                    record,
                    MoveRecord { player_id, kind, coordinate, result, move_number },
                )?;
            }
            PersistCommand::UpdateStatus { match_id, status, winner_id, duration_secs } => {
                self.store.update_status(match_id, status, winner_id, duration_secs)?;
                if status == MatchStatus::Finished {
                    self.sessions.remove(&match_id);
                }
            }
            PersistCommand::UpdateUserStats { user_id, outcome, tally, duration_secs } => {
                self.store.update_user_stats(user_id, outcome, tally, duration_secs)?;
            }
            PersistCommand::Abandon { match_id } => {
                self.sessions.remove(&match_id);
                self.store.abandon_session(match_id)?;
            }
        }
        Ok(())
    }

    pub fn user_stats(&self, user_id: i64) -> Option<UserStats> {
        self.store.user_stats(user_id)
    }
}

impl Actor for Recorder {
    type Context = Context<Self>;
}

impl Handler<PersistCommand> for Recorder {
    type Result = ();

    fn handle(&mut self, msg: PersistCommand, _: &mut Context<Self>) -> Self::Result {
        if let Err(err) = self.apply(msg) {
            error!("[Recorder] Persistence failed: {}", err);
        }
    }
}

#[derive(Message)]
#[rtype(result = "Option<UserStats>")]
pub struct GetUserStats {
    pub user_id: i64,
}

impl Handler<GetUserStats> for Recorder {
    type Result = MessageResult<GetUserStats>;

    fn handle(&mut self, msg: GetUserStats, _: &mut Context<Self>) -> Self::Result {
        MessageResult(self.user_stats(msg.user_id))
    }
}

#[derive(Message)]
#[rtype(result = "Vec<MatchSummary>")]
pub struct GetUserMatches {
    pub user_id: i64,
    pub limit: usize,
}

impl Handler<GetUserMatches> for Recorder {
    type Result = MessageResult<GetUserMatches>;

    fn handle(&mut self, msg: GetUserMatches, _: &mut Context<Self>) -> Self::Result {
        MessageResult(self.store.matches_for_user(msg.user_id, msg.limit))
    }
}

#[derive(Message)]
#[rtype(result = "Option<SessionRecord>")]
pub struct GetMatchDetails {
    pub match_id: MatchId,
}

impl Handler<GetMatchDetails> for Recorder {
    type Result = MessageResult<GetMatchDetails>;

    fn handle(&mut self, msg: GetMatchDetails, _: &mut Context<Self>) -> Self::Result {
        MessageResult(self.store.match_details(msg.match_id))
    }
}
