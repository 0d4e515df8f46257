//! Game session module: the arena core, the actor that serializes access to it, and the
//! per-player websocket connection.

pub mod arena;
pub mod server;
pub mod session;

pub use server::GameServer;
