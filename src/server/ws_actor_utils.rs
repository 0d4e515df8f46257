use actix::{Actor, ActorContext};
use actix_web_actors::ws;
use log::error;
use serde::Serialize;

use crate::game::entities::ConnectionId;
use crate::game::error::RejectCode;
use crate::server::anti_spam::FloodGuard;
use crate::server::ws_error::ws_rejection;

/// Shared behaviour of the websocket actors: JSON framing and flood protection.
pub trait WsActorUtils {
    fn flood_guard(&mut self) -> &mut FloodGuard;
    fn connection_id(&self) -> ConnectionId;

    /// Count one inbound message. Returns false if the connection got banned and was closed.
    fn admit_request<A>(&mut self, ctx: &mut ws::WebsocketContext<A>) -> bool
    where
        A: Actor<Context = ws::WebsocketContext<A>>,
    {
        let id = self.connection_id();
        if self.flood_guard().record_request(&id) {
            self.send_ban_and_close(ctx);
            return false;
        }
        true
    }

    /// Send a `RATE_LIMITED` rejection, close the socket and stop the actor.
    fn send_ban_and_close<A>(&mut self, ctx: &mut ws::WebsocketContext<A>)
    where
        A: Actor<Context = ws::WebsocketContext<A>>,
    {
        let remaining = self.flood_guard().ban_remaining_secs();
        ctx.text(ws_rejection(
            RejectCode::RateLimited,
            &format!("Too many messages; banned for {remaining}s"),
        ));
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Policy,
            description: Some("Rate limited".into()),
        }));
        ctx.stop();
    }

    fn send_rejection<A>(&mut self, ctx: &mut ws::WebsocketContext<A>, code: RejectCode, message: &str)
    where
        A: Actor<Context = ws::WebsocketContext<A>>,
    {
        ctx.text(ws_rejection(code, message));
    }

    /// Serialize and send a frame. Serialization failures close the connection.
    fn send_json<A, T>(&mut self, ctx: &mut ws::WebsocketContext<A>, payload: &T)
    where
        A: Actor<Context = ws::WebsocketContext<A>>,
        T: Serialize,
    {
        match serde_json::to_string(payload) {
            Ok(text) => ctx.text(text),
            Err(e) => {
                error!("[Ws] Failed to serialize frame for {}: {}", self.connection_id(), e);
                ctx.text(ws_rejection(RejectCode::Internal, "Internal server error"));
                ctx.close(Some(ws::CloseReason {
                    code: ws::CloseCode::Error,
                    description: Some("Internal server error".into()),
                }));
                ctx.stop();
            }
        }
    }
}
