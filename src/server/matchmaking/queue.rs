//! FIFO pool of sessions waiting for an opponent.
//!
//! Insertion order is priority order and an id appears at most once. Entries whose
//! session has gone away are not removed eagerly; `pop_live` discards them when they
//! reach the front.

use std::collections::VecDeque;

use log::debug;

use crate::game::entities::ConnectionId;

#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    waiting: VecDeque<ConnectionId>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self { waiting: VecDeque::new() }
    }

    /// Append a session. Returns false (and changes nothing) if it is already queued.
    pub fn push(&mut self, id: ConnectionId) -> bool {
        if self.waiting.contains(&id) {
            return false;
        }
        self.waiting.push_back(id);
        true
    }

    /// Pop the longest-waiting entry for which `is_live` holds, discarding stale entries on the way.
    pub fn pop_live<F>(&mut self, mut is_live: F) -> Option<ConnectionId>
    where
        F: FnMut(&ConnectionId) -> bool,
    {
        while let Some(candidate) = self.waiting.pop_front() {
            if is_live(&candidate) {
                return Some(candidate);
            }
            debug!("[Matchmaking] Discarded stale queue entry {}", candidate);
        }
        None
    }

    /// Remove a session if present. Idempotent.
    pub fn leave(&mut self, id: &ConnectionId) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|queued| queued != id);
        before != self.waiting.len()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.waiting.contains(id)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }
}
