//! Main entry point for the aircraft duel server.
//!
//! Initializes logging and the actor system (game server, admin feed, persistence
//! recorder), then launches the HTTP server with the player and admin WebSocket endpoints.

use std::sync::Arc;

use actix::Actor;
use actix_web::{web, App, HttpServer};
use log::info;

use auth::TokenAuthenticator;
use persistence::memory::MemoryStore;
use persistence::recorder::Recorder;
use server::admin_feed::AdminFeed;
use server::game_session::GameServer;

mod auth;
pub mod config;
mod game;
mod persistence;
mod server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Log level comes from RUST_LOG.
    env_logger::init();

    let authenticator = Arc::new(TokenAuthenticator::new(config::auth::token_secret()));

    let recorder = Recorder::new(MemoryStore::new()).start();
    let admin_feed = AdminFeed::new().start();
    let game_server = GameServer::new(admin_feed.clone().recipient(), recorder.clone().recipient()).start();

    let state = web::Data::new(server::state::AppState::new(
        game_server,
        admin_feed,
        recorder,
        authenticator,
    ));

    let (host, port) = config::server::bind_address();
    info!("[Main] Listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "*"))
            )
            .app_data(state.clone())
            .configure(server::router::config)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
