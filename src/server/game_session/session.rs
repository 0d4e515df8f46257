//! Player websocket connection.
//!
//! One `PlayerConnection` actor per socket. It decodes inbound frames, handles the
//! connection-level intents itself (authentication, ping) and forwards gameplay intents
//! to the `GameServer`. Outbound `ServerEvent`s are encoded back onto the socket.

use std::sync::Arc;

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::auth::TokenAuthenticator;
use crate::game::entities::ConnectionId;
use crate::game::error::RejectCode;
use crate::server::anti_spam::FloodGuard;
use crate::server::game_session::server::{Authenticated, Connect, Disconnect, GameServer, Intent};
use crate::server::protocol::{ClientIntent, ServerEvent};
use crate::server::state::AppState;
use crate::server::ws_actor_utils::WsActorUtils;

pub struct PlayerConnection {
    pub id: ConnectionId,
    pub server: Addr<GameServer>,
    pub authenticator: Arc<TokenAuthenticator>,
    /// Token passed as `?token=` when the socket was opened.
    pub initial_token: Option<String>,
    flood_guard: FloodGuard,
}

impl PlayerConnection {
    pub fn new(
        server: Addr<GameServer>,
        authenticator: Arc<TokenAuthenticator>,
        initial_token: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            server,
            authenticator,
            initial_token,
            flood_guard: FloodGuard::new(),
        }
    }

    fn authenticate(&mut self, token: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match self.authenticator.verify(token) {
            Ok(identity) => {
                self.server.do_send(Authenticated { id: self.id, identity });
            }
            Err(err) => {
                info!("[PlayerConnection] Authentication failed for {}: {}", self.id, err);
                self.send_json(ctx, &ServerEvent::AuthenticationError { message: err.to_string() });
            }
        }
    }
}

impl WsActorUtils for PlayerConnection {
    fn flood_guard(&mut self) -> &mut FloodGuard {
        &mut self.flood_guard
    }

    fn connection_id(&self) -> ConnectionId {
        self.id
    }
}

impl Actor for PlayerConnection {
    type Context = ws::WebsocketContext<Self>;

    /// Register with the game server, then apply the connect-time token if any.
    fn started(&mut self, ctx: &mut Self::Context) {
        self.server.do_send(Connect {
            id: self.id,
            addr: ctx.address().recipient(),
        });
        if let Some(token) = self.initial_token.take() {
            self.authenticate(&token, ctx);
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.server.do_send(Disconnect { id: self.id });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for PlayerConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                if !self.admit_request(ctx) {
                    return;
                }
                match serde_json::from_str::<ClientIntent>(&text) {
                    Ok(ClientIntent::Authenticate { token }) => self.authenticate(&token, ctx),
                    Ok(ClientIntent::Ping) => self.send_json(ctx, &ServerEvent::Pong),
                    Ok(intent) => self.server.do_send(Intent { id: self.id, intent }),
                    Err(e) => {
                        debug!("[PlayerConnection] Undecodable frame from {}: {}", self.id, e);
                        self.send_rejection(ctx, RejectCode::InvalidMessage, "Invalid client message");
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                if self.admit_request(ctx) {
                    self.send_rejection(ctx, RejectCode::InvalidMessage, "Binary frames are not supported");
                }
            }
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                warn!("[PlayerConnection] Protocol error on {}: {}", self.id, e);
                ctx.stop();
            }
            _ => (),
        }
    }
}

impl Handler<ServerEvent> for PlayerConnection {
    type Result = ();

    fn handle(&mut self, msg: ServerEvent, ctx: &mut Self::Context) {
        self.send_json(ctx, &msg);
    }
}

/// Extract `token` from a raw query string, URL-decoded.
pub fn token_from_query(query: &str) -> Option<String> {
    query.split('&').find_map(|kv| {
        let (key, value) = kv.split_once('=')?;
        if key != "token" || value.is_empty() {
            return None;
        }
        urlencoding::decode(value).ok().map(|v| v.into_owned())
    })
}

/// WebSocket endpoint for players. Accepts an optional `token` query parameter.
pub async fn ws_game(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let token = token_from_query(req.query_string());
    ws::start(
        PlayerConnection::new(data.game_server.clone(), data.authenticator.clone(), token),
        &req,
        stream,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_query() {
        assert_eq!(token_from_query("token=abc.def.ghi"), Some("abc.def.ghi".to_string()));
        assert_eq!(token_from_query("x=1&token=a%2Eb"), Some("a.b".to_string()));
        assert_eq!(token_from_query("token="), None);
        assert_eq!(token_from_query("tokens=1"), None);
        assert_eq!(token_from_query(""), None);
    }
}
