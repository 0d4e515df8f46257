//! Server layer root module.
//!
//! This module organizes the networked side of the game:
//! - The authoritative arena (matchmaking queue and matches) and its actor
//! - Player and admin WebSocket connections
//! - Wire protocol, notifications and flood protection
//! - HTTP routing and shared application state

pub mod admin_feed;
pub mod anti_spam;
pub mod game_session;
pub mod matchmaking;
pub mod notifications;
pub mod protocol;
pub mod router;
pub mod state;
pub mod ws_actor_utils;
pub mod ws_error;
