//! Observability feed served on `/ws/admin`.
//!
//! `AdminFeed` fans every `AdminEvent` out to the connected admin sockets and keeps a
//! short backlog that new subscribers receive first.

use std::collections::{HashMap, VecDeque};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info};
use uuid::Uuid;

use crate::game::entities::ConnectionId;
use crate::server::anti_spam::FloodGuard;
use crate::server::notifications::AdminEvent;
use crate::server::state::AppState;
use crate::server::ws_actor_utils::WsActorUtils;

const BACKLOG: usize = 50;

#[derive(Default)]
pub struct AdminFeed {
    subscribers: HashMap<Uuid, Recipient<AdminEvent>>,
    backlog: VecDeque<AdminEvent>,
}

impl AdminFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn remember(&mut self, event: AdminEvent) {
        if self.backlog.len() == BACKLOG {
            self.backlog.pop_front();
        }
        self.backlog.push_back(event);
    }
}

impl Actor for AdminFeed {
    type Context = Context<Self>;
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe {
    pub id: Uuid,
    pub addr: Recipient<AdminEvent>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Unsubscribe {
    pub id: Uuid,
}

impl Handler<Subscribe> for AdminFeed {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) {
        for event in &self.backlog {
            msg.addr.do_send(event.clone());
        }
        self.subscribers.insert(msg.id, msg.addr);
        info!("[AdminFeed] Subscriber {} joined ({} total)", msg.id, self.subscribers.len());
    }
}

impl Handler<Unsubscribe> for AdminFeed {
    type Result = ();

    fn handle(&mut self, msg: Unsubscribe, _: &mut Context<Self>) {
        self.subscribers.remove(&msg.id);
    }
}

impl Handler<AdminEvent> for AdminFeed {
    type Result = ();

    fn handle(&mut self, msg: AdminEvent, _: &mut Context<Self>) {
        debug!("[AdminFeed] {:?}", msg);
        for subscriber in self.subscribers.values() {
            subscriber.do_send(msg.clone());
        }
        self.remember(msg);
    }
}

/// One admin websocket. Read-only: inbound text frames only count towards flood protection.
pub struct AdminSession {
    id: Uuid,
    feed: Addr<AdminFeed>,
    flood_guard: FloodGuard,
}

impl WsActorUtils for AdminSession {
    fn flood_guard(&mut self) -> &mut FloodGuard {
        &mut self.flood_guard
    }

    fn connection_id(&self) -> ConnectionId {
        self.id
    }
}

impl Actor for AdminSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.feed.do_send(Subscribe {
            id: self.id,
            addr: ctx.address().recipient(),
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.feed.do_send(Unsubscribe { id: self.id });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for AdminSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(_)) | Ok(ws::Message::Binary(_)) => {
                self.admit_request(ctx);
            }
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(_) => ctx.stop(),
            _ => (),
        }
    }
}

impl Handler<AdminEvent> for AdminSession {
    type Result = ();

    fn handle(&mut self, msg: AdminEvent, ctx: &mut Self::Context) {
        self.send_json(ctx, &msg);
    }
}

pub async fn ws_admin(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    ws::start(
        AdminSession {
            id: Uuid::new_v4(),
            feed: data.admin_feed.clone(),
            flood_guard: FloodGuard::new(),
        },
        &req,
        stream,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlog_is_bounded() {
        let mut feed = AdminFeed::new();
        for _ in 0..BACKLOG + 5 {
            feed.remember(AdminEvent::UserConnected { connection_id: Uuid::new_v4(), total_users: 1 });
        }
        assert_eq!(feed.backlog.len(), BACKLOG);
    }
}
