//! `GameServer` actor: the single execution context around the `Arena`.
//!
//! Every connection event and intent is a message in this actor's mailbox and is handled
//! to completion before the next one. Effects leave through `Dispatch`, which forwards
//! events to connection actors, the admin feed and the recorder with `do_send`.

use std::collections::HashMap;

use actix::prelude::*;
use log::{debug, info, warn};

use crate::game::entities::{ConnectionId, Identity};
use crate::persistence::PersistCommand;
use crate::server::game_session::arena::{Arena, ArenaStats};
use crate::server::notifications::{AdminEvent, EventSink};
use crate::server::protocol::{ClientIntent, ServerEvent};

pub struct GameServer {
    arena: Arena,
    connections: HashMap<ConnectionId, Recipient<ServerEvent>>,
    admin: Recipient<AdminEvent>,
    recorder: Recipient<PersistCommand>,
}

impl GameServer {
    pub fn new(admin: Recipient<AdminEvent>, recorder: Recipient<PersistCommand>) -> Self {
        Self {
            arena: Arena::new(),
            connections: HashMap::new(),
            admin,
            recorder,
        }
    }

    /// Borrow the arena mutably next to a sink over the outbound channels.
    fn split(&mut self) -> (&mut Arena, Dispatch<'_>) {
        (
            &mut self.arena,
            Dispatch {
                connections: &self.connections,
                admin: &self.admin,
                recorder: &self.recorder,
            },
        )
    }
}

impl Actor for GameServer {
    type Context = Context<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        info!("[GameServer] Started");
    }
}

/// Routes arena effects to their destinations.
struct Dispatch<'a> {
    connections: &'a HashMap<ConnectionId, Recipient<ServerEvent>>,
    admin: &'a Recipient<AdminEvent>,
    recorder: &'a Recipient<PersistCommand>,
}

impl EventSink for Dispatch<'_> {
    fn send(&mut self, to: ConnectionId, event: ServerEvent) {
        match self.connections.get(&to) {
            Some(recipient) => recipient.do_send(event),
            None => debug!("[GameServer] Dropped event for closed connection {}", to),
        }
    }

    fn notify(&mut self, event: AdminEvent) {
        debug!("[GameServer] Admin event: {:?}", event);
        self.admin.do_send(event);
    }

    fn persist(&mut self, command: PersistCommand) {
        self.recorder.do_send(command);
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub id: ConnectionId,
    pub addr: Recipient<ServerEvent>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: ConnectionId,
}

/// A token was verified by the connection; attach the identity to its session.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Authenticated {
    pub id: ConnectionId,
    pub identity: Identity,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Intent {
    pub id: ConnectionId,
    pub intent: ClientIntent,
}

#[derive(Message)]
#[rtype(result = "ArenaStats")]
pub struct GetStats;

impl Handler<Connect> for GameServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        self.connections.insert(msg.id, msg.addr);
        let (arena, mut sink) = self.split();
        arena.connect(msg.id, &mut sink);
    }
}

impl Handler<Disconnect> for GameServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        if self.connections.remove(&msg.id).is_none() {
            return;
        }
        let (arena, mut sink) = self.split();
        arena.disconnect(msg.id, &mut sink);
    }
}

impl Handler<Authenticated> for GameServer {
    type Result = ();

    fn handle(&mut self, msg: Authenticated, _: &mut Context<Self>) {
        let (arena, mut sink) = self.split();
        arena.authenticate(msg.id, msg.identity, &mut sink);
    }
}

impl Handler<Intent> for GameServer {
    type Result = ();

    fn handle(&mut self, msg: Intent, _: &mut Context<Self>) {
        let id = msg.id;
        if !self.connections.contains_key(&id) {
            warn!("[GameServer] Intent from unregistered connection {}", id);
            return;
        }
        let (arena, mut sink) = self.split();
        match msg.intent {
            ClientIntent::Join { anonymous } => arena.join(id, anonymous, &mut sink),
            ClientIntent::PlaceShips { match_id, aircraft } => arena.place_ships(id, match_id, &aircraft, &mut sink),
            ClientIntent::Shoot { match_id, x, y } => arena.shoot(id, match_id, x, y, &mut sink),
            ClientIntent::Authenticate { .. } | ClientIntent::Ping => {
                debug!("[GameServer] Connection-level intent reached the server from {}", id);
            }
        }
    }
}

impl Handler<GetStats> for GameServer {
    type Result = MessageResult<GetStats>;

    fn handle(&mut self, _: GetStats, _: &mut Context<Self>) -> Self::Result {
        MessageResult(self.arena.stats())
    }
}
