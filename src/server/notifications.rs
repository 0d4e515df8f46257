//! Outbound side of the arena.
//!
//! The arena never touches sockets, actors or storage. Every effect of an intent goes
//! through an `EventSink`: events for individual connections, observational
//! `AdminEvent`s, and persistence commands.

use actix::prelude::*;
use serde::Serialize;

use crate::game::entities::{ConnectionId, MatchId};
use crate::game::state::MatchStatus;
use crate::persistence::PersistCommand;
use crate::server::protocol::ServerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueAction {
    Joined,
    Left,
    Requeued,
}

/// Observational event pushed to the `/ws/admin` feed. Never needed for correctness.
#[derive(Message, Debug, Clone, PartialEq, Serialize)]
#[rtype(result = "()")]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum AdminEvent {
    UserConnected {
        connection_id: ConnectionId,
        total_users: usize,
    },
    UserDisconnected {
        connection_id: ConnectionId,
        username: String,
        total_users: usize,
        connected_secs: u64,
    },
    QueueUpdated {
        connection_id: ConnectionId,
        username: String,
        action: QueueAction,
        queue_length: usize,
    },
    MatchCreated {
        match_id: MatchId,
        player1: String,
        player2: String,
        tracked: bool,
    },
    MatchStatusChanged {
        match_id: MatchId,
        status: MatchStatus,
    },
    TurnChanged {
        match_id: MatchId,
        current_turn: ConnectionId,
        move_number: u32,
    },
    MatchFinished {
        match_id: MatchId,
        winner: String,
        loser: String,
        duration_secs: u64,
        total_moves: u32,
        tracked: bool,
        /// Completed tracked games since startup.
        total_games_played: u64,
    },
    MatchAbandoned {
        match_id: MatchId,
        left_by: ConnectionId,
        moves_played: u32,
    },
}

pub trait EventSink {
    /// Deliver an event to one connection. Unknown or closed connections are dropped silently.
    fn send(&mut self, to: ConnectionId, event: ServerEvent);

    fn notify(&mut self, event: AdminEvent);

    fn persist(&mut self, command: PersistCommand);
}
