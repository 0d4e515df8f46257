//! Authoritative matchmaking and match core.
//!
//! `Arena` owns every piece of shared gameplay state: the session map, the waiting queue
//! and the match map. Each public method handles one inbound intent to completion and
//! reports its effects through an `EventSink`. Callers must serialize calls; the
//! `GameServer` actor does so through its mailbox.

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::config::matchmaking::{OPPONENT_LEFT_MESSAGE, WAITING_MESSAGE, WAITING_SHIPS_MESSAGE};
use crate::game::entities::{AircraftConfig, ConnectionId, Identity, MatchId, PlayerSession};
use crate::game::error::{GameError, RejectCode};
use crate::game::state::{Match, MatchStatus, Outcome, Role};
use crate::game::types::{Coordinate, ShotKind};
use crate::persistence::{MoveKind, PersistCommand};
use crate::server::matchmaking::queue::MatchmakingQueue;
use crate::server::notifications::{AdminEvent, EventSink, QueueAction};
use crate::server::protocol::{OpponentSummary, ServerEvent};

/// Snapshot served by `/stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArenaStats {
    pub active_sessions: usize,
    pub queue_length: usize,
    pub active_matches: usize,
    pub total_connections: u64,
    pub peak_sessions: usize,
    /// Completed tracked games. Guest and anonymous matches are not counted.
    pub total_games_played: u64,
    pub uptime_secs: u64,
}

pub struct Arena {
    sessions: HashMap<ConnectionId, PlayerSession>,
    queue: MatchmakingQueue,
    matches: HashMap<MatchId, Match>,
    /// Identities captured when a tracked match formed, in seat order.
    tracked: HashMap<MatchId, [Identity; 2]>,
    started_at: Instant,
    total_connections: u64,
    peak_sessions: usize,
    total_games_played: u64,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            queue: MatchmakingQueue::new(),
            matches: HashMap::new(),
            tracked: HashMap::new(),
            started_at: Instant::now(),
            total_connections: 0,
            peak_sessions: 0,
            total_games_played: 0,
        }
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            active_sessions: self.sessions.len(),
            queue_length: self.queue.len(),
            active_matches: self.matches.values().filter(|m| m.is_active()).count(),
            total_connections: self.total_connections,
            peak_sessions: self.peak_sessions,
            total_games_played: self.total_games_played,
            uptime_secs: self.started_at.elapsed().as_secs(),
        }
    }

    pub fn connect(&mut self, id: ConnectionId, sink: &mut dyn EventSink) {
        self.sessions.insert(id, PlayerSession::new(id));
        self.total_connections += 1;
        self.peak_sessions = self.peak_sessions.max(self.sessions.len());
        info!("[Arena] Connected {} ({} online)", id, self.sessions.len());
        sink.notify(AdminEvent::UserConnected {
            connection_id: id,
            total_users: self.sessions.len(),
        });
    }

    /// Attach a verified identity. A match already in progress keeps the identities it
    /// was formed with.
    pub fn authenticate(&mut self, id: ConnectionId, identity: Identity, sink: &mut dyn EventSink) {
        let Some(session) = self.sessions.get_mut(&id) else {
            warn!("[Arena] Authenticate for unknown session {}", id);
            return;
        };
        info!("[Arena] Session {} authenticated as {} ({})", id, identity.username, identity.id);
        session.identity = Some(identity.clone());
        sink.send(id, ServerEvent::Authenticated { user: identity });
    }

    pub fn join(&mut self, id: ConnectionId, anonymous: bool, sink: &mut dyn EventSink) {
        if !self.sessions.contains_key(&id) {
            warn!("[Arena] Join from unknown session {}", id);
            return;
        }
        if let Some(current) = self.active_match_of(&id) {
            debug!("[Arena] {} tried to join while in match {}", id, current);
            reject(sink, id, GameError::AlreadyInMatch);
            return;
        }
        // Applies to the next pairing, including one this session is already queued for.
        if let Some(session) = self.sessions.get_mut(&id) {
            session.guest = anonymous;
        }

        if self.queue.contains(&id) {
            sink.send(id, ServerEvent::Waiting { message: WAITING_MESSAGE.to_string() });
            return;
        }

        self.release_match(id);
        self.pair_or_enqueue(id, QueueAction::Joined, WAITING_MESSAGE, sink);
    }

    pub fn place_ships(
        &mut self,
        id: ConnectionId,
        match_id: MatchId,
        configs: &[AircraftConfig],
        sink: &mut dyn EventSink,
    ) {
        let Some(opponent) = self.locate(id, match_id, sink) else {
            return;
        };

        let placed = match (self.matches.get_mut(&match_id), self.sessions.get_mut(&id)) {
            (Some(game), Some(session)) => game.place_ships(session, configs),
            _ => return,
        };
        let move_number = match placed {
            Ok(n) => n,
            Err(err) => {
                debug!("[Arena] Placement by {} refused: {}", id, err);
                reject(sink, id, err);
                return;
            }
        };
        info!("[Arena] {} placed aircraft in match {}", id, match_id);

        if let Some(player_id) = self.tracked_player(match_id, id) {
            sink.persist(PersistCommand::RecordMove {
                match_id,
                player_id,
                kind: MoveKind::PlaceShips,
                coordinate: None,
                result: None,
                move_number,
            });
        }

        let opponent_ready = self.sessions.get(&opponent).is_some_and(|s| s.ready);
        if !opponent_ready {
            sink.send(id, ServerEvent::WaitingOnOpponentShips { message: WAITING_SHIPS_MESSAGE.to_string() });
            return;
        }

        let Some(game) = self.matches.get_mut(&match_id) else {
            return;
        };
        if !game.start() {
            return;
        }
        let turn = game.turn();
        let players = game.players;
        info!("[Arena] Match {} is playing, {:?} shoots first", match_id, turn);

        for player in players {
            sink.send(player, ServerEvent::RoundStart { your_turn: turn == Some(player) });
        }
        sink.notify(AdminEvent::MatchStatusChanged { match_id, status: MatchStatus::Playing });
        if self.tracked.contains_key(&match_id) {
            sink.persist(PersistCommand::UpdateStatus {
                match_id,
                status: MatchStatus::Playing,
                winner_id: None,
                duration_secs: None,
            });
        }
    }

    pub fn shoot(&mut self, id: ConnectionId, match_id: MatchId, x: u8, y: u8, sink: &mut dyn EventSink) {
        let Some(opponent) = self.locate(id, match_id, sink) else {
            return;
        };
        let coordinate = match Coordinate::new(x, y) {
            Ok(c) => c,
            Err(err) => {
                reject(sink, id, err);
                return;
            }
        };

        let fired = match (self.matches.get_mut(&match_id), self.sessions.get_mut(&opponent)) {
            (Some(game), Some(defender)) => game.fire(id, defender, coordinate),
            // Only a finished match can outlive the opponent's session.
            (Some(_), None) => Err(GameError::NotPlaying),
            _ => return,
        };
        let report = match fired {
            Ok(Some(report)) => report,
            Ok(None) => {
                debug!("[Arena] Ignored repeat shot by {} at ({}, {})", id, x, y);
                return;
            }
            Err(err) => {
                debug!("[Arena] Shot by {} refused: {}", id, err);
                reject(sink, id, err);
                return;
            }
        };

        let result = ShotKind::from(report.outcome);
        let destroyed_aircraft = report.outcome.destroyed();
        debug!(
            "[Arena] Match {} move {}: {} fired at ({}, {}) -> {:?}",
            match_id, report.move_number, id, x, y, report.outcome
        );
        for player in [id, opponent] {
            sink.send(
                player,
                ServerEvent::ShotResult { x, y, result, destroyed_aircraft, is_my_shot: player == id },
            );
        }

        if let Some(player_id) = self.tracked_player(match_id, id) {
            sink.persist(PersistCommand::RecordMove {
                match_id,
                player_id,
                kind: MoveKind::Shoot,
                coordinate: Some(coordinate),
                result: Some(result),
                move_number: report.move_number,
            });
        }

        if report.finished {
            self.finish(match_id, sink);
            return;
        }

        if let Some(turn) = self.matches.get(&match_id).and_then(|m| m.turn()) {
            for player in [id, opponent] {
                sink.send(player, ServerEvent::TurnChanged { your_turn: player == turn });
            }
            sink.notify(AdminEvent::TurnChanged {
                match_id,
                current_turn: turn,
                move_number: report.move_number,
            });
        }
    }

    pub fn disconnect(&mut self, id: ConnectionId, sink: &mut dyn EventSink) {
        let Some(session) = self.sessions.remove(&id) else {
            return;
        };
        let username = session.display_name().to_string();
        let connected_secs = session.connected_at.elapsed().as_secs();

        if self.queue.leave(&id) {
            sink.notify(AdminEvent::QueueUpdated {
                connection_id: id,
                username: username.clone(),
                action: QueueAction::Left,
                queue_length: self.queue.len(),
            });
        }

        if let Some(match_id) = session.match_id {
            match self.matches.get(&match_id).map(|m| m.is_active()) {
                Some(true) => self.abandon(match_id, id, sink),
                Some(false) => self.drop_if_unreferenced(match_id),
                None => {}
            }
        }

        info!("[Arena] Disconnected {} ({} online)", id, self.sessions.len());
        sink.notify(AdminEvent::UserDisconnected {
            connection_id: id,
            username,
            total_users: self.sessions.len(),
            connected_secs,
        });
    }

    /// Resolve the match an intent refers to and return the acting session's opponent.
    ///
    /// Unknown match ids send the session back to the queue. Ids of a match the session
    /// is not (or no longer) playing are refused. A vanished opponent tears the match down.
    fn locate(&mut self, id: ConnectionId, match_id: MatchId, sink: &mut dyn EventSink) -> Option<ConnectionId> {
        let current = self.sessions.get(&id)?.match_id;

        let Some(game) = self.matches.get(&match_id) else {
            if let Some(active) = self.active_match_of(&id) {
                debug!("[Arena] {} referenced unknown match {} while in {}", id, match_id, active);
                reject(sink, id, GameError::StaleMatch);
            } else if self.queue.contains(&id) {
                sink.send(id, ServerEvent::Waiting { message: WAITING_MESSAGE.to_string() });
            } else {
                warn!("[Arena] {} referenced unknown match {}, requeueing", id, match_id);
                self.release_match(id);
                self.pair_or_enqueue(id, QueueAction::Requeued, WAITING_MESSAGE, sink);
            }
            return None;
        };

        if !game.is_participant(id) {
            reject(sink, id, GameError::NotInMatch);
            return None;
        }
        if current != Some(match_id) {
            reject(sink, id, GameError::StaleMatch);
            return None;
        }

        let opponent = game.opponent_of(id)?;
        if game.is_active() && !self.sessions.contains_key(&opponent) {
            warn!("[Arena] Opponent {} of {} vanished from match {}", opponent, id, match_id);
            self.abandon(match_id, opponent, sink);
            return None;
        }
        Some(opponent)
    }

    /// Pair `id` with the longest-waiting live session, or queue it.
    fn pair_or_enqueue(
        &mut self,
        id: ConnectionId,
        action: QueueAction,
        waiting_message: &str,
        sink: &mut dyn EventSink,
    ) {
        let (sessions, matches) = (&self.sessions, &self.matches);
        let partner = self.queue.pop_live(|candidate| {
            *candidate != id
                && sessions.get(candidate).is_some_and(|s| {
                    s.match_id
                        .and_then(|m| matches.get(&m))
                        .is_none_or(|m| !m.is_active())
                })
        });

        match partner {
            Some(first) => self.start_match(first, id, sink),
            None => {
                self.queue.push(id);
                let username = self
                    .sessions
                    .get(&id)
                    .map(|s| s.display_name().to_string())
                    .unwrap_or_default();
                debug!("[Arena] {} waiting ({} queued)", id, self.queue.len());
                sink.send(id, ServerEvent::Waiting { message: waiting_message.to_string() });
                sink.notify(AdminEvent::QueueUpdated {
                    connection_id: id,
                    username,
                    action,
                    queue_length: self.queue.len(),
                });
            }
        }
    }

    fn start_match(&mut self, first: ConnectionId, second: ConnectionId, sink: &mut dyn EventSink) {
        self.release_match(first);
        self.release_match(second);

        let match_id = Uuid::new_v4();
        let mut identities = Vec::with_capacity(2);
        for player in [first, second] {
            if let Some(session) = self.sessions.get_mut(&player) {
                session.reset_for_match();
                session.match_id = Some(match_id);
                identities.push(session.tracked_identity().cloned());
            }
        }

        let tracked = match identities.as_slice() {
            [Some(a), Some(b)] => Some([a.clone(), b.clone()]),
            _ => None,
        };
        let game = Match::new(match_id, first, second, tracked.is_some());
        self.matches.insert(match_id, game);

        let first_summary = self.summary(&first);
        let second_summary = self.summary(&second);
        info!(
            "[Arena] Match {} created: {} vs {} (tracked={})",
            match_id,
            first_summary.username,
            second_summary.username,
            tracked.is_some()
        );

        sink.send(
            first,
            ServerEvent::MatchStart { match_id, opponent: second_summary.clone(), role: Role::Player1 },
        );
        sink.send(
            second,
            ServerEvent::MatchStart { match_id, opponent: first_summary.clone(), role: Role::Player2 },
        );
        sink.notify(AdminEvent::MatchCreated {
            match_id,
            player1: first_summary.username,
            player2: second_summary.username,
            tracked: tracked.is_some(),
        });

        if let Some([player1, player2]) = tracked {
            sink.persist(PersistCommand::CreateSession {
                match_id,
                player1: player1.clone(),
                player2: player2.clone(),
            });
            self.tracked.insert(match_id, [player1, player2]);
        }
    }

    fn finish(&mut self, match_id: MatchId, sink: &mut dyn EventSink) {
        let Some(game) = self.matches.get(&match_id) else {
            return;
        };
        let Some((winner, loser)) = game.winner().and_then(|w| Some((w, game.opponent_of(w)?))) else {
            warn!("[Arena] Match {} finished without a winner", match_id);
            return;
        };
        if game.tracked {
            self.total_games_played += 1;
        }
        let duration_secs = game.duration_secs();

        let fleet = |id: &ConnectionId| self.sessions.get(id).map(|s| s.aircraft.clone()).unwrap_or_default();
        sink.send(
            winner,
            ServerEvent::GameOver { outcome: Outcome::Win, revealed_aircraft: fleet(&loser) },
        );
        sink.send(
            loser,
            ServerEvent::GameOver { outcome: Outcome::Lose, revealed_aircraft: fleet(&winner) },
        );

        let winner_name = self.sessions.get(&winner).map(|s| s.display_name().to_string()).unwrap_or_default();
        let loser_name = self.sessions.get(&loser).map(|s| s.display_name().to_string()).unwrap_or_default();
        info!(
            "[Arena] Match {} finished after {}s and {} moves: {} beat {}",
            match_id,
            duration_secs,
            game.move_count(),
            winner_name,
            loser_name
        );
        sink.notify(AdminEvent::MatchStatusChanged { match_id, status: MatchStatus::Finished });
        sink.notify(AdminEvent::MatchFinished {
            match_id,
            winner: winner_name,
            loser: loser_name,
            duration_secs,
            total_moves: game.move_count(),
            tracked: game.tracked,
            total_games_played: self.total_games_played,
        });

        if let Some(identities) = self.tracked.remove(&match_id) {
            let winner_id = self.tracked_id(game, &identities, winner);
            sink.persist(PersistCommand::UpdateStatus {
                match_id,
                status: MatchStatus::Finished,
                winner_id,
                duration_secs: Some(duration_secs),
            });
            for player in game.players {
                let (Some(user_id), Some(outcome)) =
                    (self.tracked_id(game, &identities, player), game.outcome_for(player))
                else {
                    continue;
                };
                sink.persist(PersistCommand::UpdateUserStats {
                    user_id,
                    outcome,
                    tally: game.tally(player),
                    duration_secs,
                });
            }
        }
    }

    /// Discard an unfinished match and send the remaining participant back to pairing.
    fn abandon(&mut self, match_id: MatchId, left_by: ConnectionId, sink: &mut dyn EventSink) {
        let Some(game) = self.matches.remove(&match_id) else {
            return;
        };
        if self.tracked.remove(&match_id).is_some() {
            sink.persist(PersistCommand::Abandon { match_id });
        }
        let moves_played = game.move_count();
        warn!(
            "[Arena] Match {} abandoned by {} in status {:?} after {} moves",
            match_id,
            left_by,
            game.status(),
            moves_played
        );
        sink.notify(AdminEvent::MatchAbandoned { match_id, left_by, moves_played });

        for player in game.players.into_iter().filter(|p| *p != left_by) {
            let Some(session) = self.sessions.get_mut(&player) else {
                continue;
            };
            session.match_id = None;
            session.reset_for_match();
            self.pair_or_enqueue(player, QueueAction::Requeued, OPPONENT_LEFT_MESSAGE, sink);
        }
    }

    fn active_match_of(&self, id: &ConnectionId) -> Option<MatchId> {
        let match_id = self.sessions.get(id)?.match_id?;
        self.matches.get(&match_id).filter(|m| m.is_active()).map(|m| m.id)
    }

    /// Detach a session from its finished match, dropping the match once nobody refers to it.
    fn release_match(&mut self, id: ConnectionId) {
        let Some(match_id) = self.sessions.get_mut(&id).and_then(|s| s.match_id.take()) else {
            return;
        };
        self.drop_if_unreferenced(match_id);
    }

    fn drop_if_unreferenced(&mut self, match_id: MatchId) {
        let referenced = self.matches.get(&match_id).is_some_and(|game| {
            game.players
                .iter()
                .any(|p| self.sessions.get(p).is_some_and(|s| s.match_id == Some(match_id)))
        });
        if !referenced && self.matches.remove(&match_id).is_some() {
            debug!("[Arena] Released finished match {}", match_id);
        }
    }

    fn summary(&self, id: &ConnectionId) -> OpponentSummary {
        match self.sessions.get(id) {
            Some(session) => OpponentSummary {
                id: session.tracked_identity().map(|i| i.id),
                username: session.display_name().to_string(),
            },
            None => OpponentSummary { id: None, username: String::new() },
        }
    }

    fn tracked_player(&self, match_id: MatchId, id: ConnectionId) -> Option<i64> {
        let identities = self.tracked.get(&match_id)?;
        let game = self.matches.get(&match_id)?;
        self.tracked_id(game, identities, id)
    }

    fn tracked_id(&self, game: &Match, identities: &[Identity; 2], id: ConnectionId) -> Option<i64> {
        match game.role_of(id)? {
            Role::Player1 => Some(identities[0].id),
            Role::Player2 => Some(identities[1].id),
        }
    }
}

fn reject(sink: &mut dyn EventSink, id: ConnectionId, err: GameError) {
    let code: RejectCode = err.code();
    sink.send(id, ServerEvent::rejected(code, err.to_string()));
}
