/// Matchmaking configuration constants.
/// 
/// This module defines the texts pushed to sessions while they wait for a pairing,
/// and the display name used for sessions without an authenticated identity.
pub const WAITING_MESSAGE: &str = "Waiting for an opponent...";

/// Sent to a session whose opponent vanished while the match was being set up or played.
pub const OPPONENT_LEFT_MESSAGE: &str = "Opponent left; searching for a new match...";

/// Sent to the placing session until the opponent has deployed as well.
pub const WAITING_SHIPS_MESSAGE: &str = "Waiting for opponent to place ships...";

/// Display name for guests.
pub const GUEST_USERNAME: &str = "Guest Player";
