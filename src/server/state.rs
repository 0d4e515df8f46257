//! Application state shared by the HTTP and WebSocket handlers.

use std::sync::Arc;

use actix::Addr;

use crate::auth::TokenAuthenticator;
use crate::persistence::recorder::Recorder;
use crate::server::admin_feed::AdminFeed;
use crate::server::game_session::server::GameServer;

pub struct AppState {
    /// Owner of all gameplay state.
    pub game_server: Addr<GameServer>,
    pub admin_feed: Addr<AdminFeed>,
    /// Background persistence writer, also queried for user statistics.
    pub recorder: Addr<Recorder>,
    pub authenticator: Arc<TokenAuthenticator>,
}

impl AppState {
    pub fn new(
        game_server: Addr<GameServer>,
        admin_feed: Addr<AdminFeed>,
        recorder: Addr<Recorder>,
        authenticator: Arc<TokenAuthenticator>,
    ) -> Self {
        AppState {
            game_server,
            admin_feed,
            recorder,
            authenticator,
        }
    }
}
