/// Main configuration module.
/// 
/// Re-exports submodules for game, matchmaking, anti-spam, auth, and server configuration.
pub mod matchmaking;
pub mod game;
pub mod anti_spam;
pub mod auth;
pub mod server;
