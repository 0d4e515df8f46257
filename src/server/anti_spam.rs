use std::time::{Duration, Instant};

use log::warn;

use crate::config::anti_spam::{BAN_DURATION_SECONDS, MAX_REQUESTS_PER_SECOND};
use crate::game::entities::ConnectionId;

/// Per-connection flood guard.
///
/// Counts inbound messages in one-second windows. Exceeding `MAX_REQUESTS_PER_SECOND`
/// bans the connection for `BAN_DURATION_SECONDS`; the caller is expected to close it.
pub struct FloodGuard {
    window_started: Instant,
    requests_in_window: u32,
    banned_until: Option<Instant>,
}

impl Default for FloodGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl FloodGuard {
    pub fn new() -> Self {
        Self {
            window_started: Instant::now(),
            requests_in_window: 0,
            banned_until: None,
        }
    }

    /// Call for every inbound message. Returns true if the connection is (now) banned.
    pub fn record_request(&mut self, connection: &ConnectionId) -> bool {
        self.record_request_at(connection, Instant::now())
    }

    fn record_request_at(&mut self, connection: &ConnectionId, now: Instant) -> bool {
        if self.is_banned_at(now) {
            return true;
        }
        if now.duration_since(self.window_started) >= Duration::from_secs(1) {
            self.window_started = now;
            self.requests_in_window = 0;
        }
        self.requests_in_window += 1;
        if self.requests_in_window > MAX_REQUESTS_PER_SECOND {
            let until = now + Duration::from_secs(BAN_DURATION_SECONDS);
            self.banned_until = Some(until);
            warn!(
                "[AntiSpam] Banned connection {} for {}s: {} requests in one second",
                connection, BAN_DURATION_SECONDS, self.requests_in_window
            );
            return true;
        }
        false
    }

    fn is_banned_at(&self, now: Instant) -> bool {
        self.banned_until.is_some_and(|until| now < until)
    }

    /// Remaining ban duration in seconds, or 0 if not banned.
    pub fn ban_remaining_secs(&self) -> u64 {
        self.banned_until
            .and_then(|until| until.checked_duration_since(Instant::now()))
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_burst_over_limit_bans() {
        let id = Uuid::new_v4();
        let mut guard = FloodGuard::new();
        let now = Instant::now();
        for _ in 0..MAX_REQUESTS_PER_SECOND {
            assert!(!guard.record_request_at(&id, now));
        }
        assert!(guard.record_request_at(&id, now));
        assert!(guard.is_banned_at(Instant::now()));
        assert!(guard.ban_remaining_secs() > 0);
    }

    #[test]
    fn test_window_resets_each_second() {
        let id = Uuid::new_v4();
        let mut guard = FloodGuard::new();
        let start = Instant::now();
        for second in 0..3u64 {
            let at = start + Duration::from_secs(second + 1);
            for _ in 0..MAX_REQUESTS_PER_SECOND {
                assert!(!guard.record_request_at(&id, at));
            }
        }
        assert!(!guard.is_banned_at(Instant::now()));
        assert_eq!(guard.ban_remaining_secs(), 0);
    }
}
