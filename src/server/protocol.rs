//! Wire shapes exchanged over `/ws/game`.
//!
//! Every frame is a JSON object `{"action": <name>, "data": <payload>}`. Inbound frames
//! decode into `ClientIntent`; outbound frames are produced from `ServerEvent`.

use actix::prelude::*;
use serde::{Serialize, Deserialize};

use crate::game::entities::{Aircraft, AircraftConfig, Identity, MatchId};
use crate::game::error::RejectCode;
use crate::game::state::{Outcome, Role};
use crate::game::types::{AircraftId, ShotKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum ClientIntent {
    Authenticate {
        token: String,
    },
    Join {
        #[serde(default)]
        anonymous: bool,
    },
    PlaceShips {
        match_id: MatchId,
        aircraft: Vec<AircraftConfig>,
    },
    Shoot {
        match_id: MatchId,
        x: u8,
        y: u8,
    },
    Ping,
}

/// What a participant learns about the other side when a match forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentSummary {
    /// Absent for guests.
    pub id: Option<i64>,
    pub username: String,
}

#[derive(Message, Debug, Clone, PartialEq, Serialize)]
#[rtype(result = "()")]
#[serde(tag = "action", content = "data")]
pub enum ServerEvent {
    Waiting {
        message: String,
    },
    MatchStart {
        match_id: MatchId,
        opponent: OpponentSummary,
        role: Role,
    },
    RoundStart {
        your_turn: bool,
    },
    WaitingOnOpponentShips {
        message: String,
    },
    ShotResult {
        x: u8,
        y: u8,
        result: ShotKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        destroyed_aircraft: Option<AircraftId>,
        is_my_shot: bool,
    },
    TurnChanged {
        your_turn: bool,
    },
    GameOver {
        outcome: Outcome,
        revealed_aircraft: Vec<Aircraft>,
    },
    Rejected {
        code: RejectCode,
        message: String,
    },
    Authenticated {
        user: Identity,
    },
    AuthenticationError {
        message: String,
    },
    Pong,
}

impl ServerEvent {
    pub fn rejected(code: RejectCode, message: impl Into<String>) -> Self {
        ServerEvent::Rejected {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::Orientation;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_decode_place_ships() {
        let match_id = Uuid::new_v4();
        let raw = json!({
            "action": "PlaceShips",
            "data": {
                "match_id": match_id,
                "aircraft": [
                    {"x": 2, "y": 0, "orientation": "up"},
                    {"x": 7, "y": 0, "orientation": "horizontal"},
                    {"x": 0, "y": 4, "orientation": "vertical"}
                ]
            }
        });
        let intent: ClientIntent = serde_json::from_value(raw).unwrap();
        let ClientIntent::PlaceShips { match_id: got, aircraft } = intent else {
            panic!("expected PlaceShips");
        };
        assert_eq!(got, match_id);
        assert_eq!(aircraft[1].orientation, Orientation::Up);
        assert_eq!(aircraft[2].orientation, Orientation::Left);
    }

    #[test]
    fn test_decode_join_and_ping() {
        let intent: ClientIntent =
            serde_json::from_str(r#"{"action":"Join","data":{"anonymous":true}}"#).unwrap();
        assert_eq!(intent, ClientIntent::Join { anonymous: true });
        let intent: ClientIntent = serde_json::from_str(r#"{"action":"Join","data":{}}"#).unwrap();
        assert_eq!(intent, ClientIntent::Join { anonymous: false });
        let intent: ClientIntent = serde_json::from_str(r#"{"action":"Ping"}"#).unwrap();
        assert_eq!(intent, ClientIntent::Ping);
    }

    #[test]
    fn test_unknown_action_is_an_error() {
        assert!(serde_json::from_str::<ClientIntent>(r#"{"action":"Cheat","data":{}}"#).is_err());
    }

    #[test]
    fn test_encode_shot_result() {
        let event = ServerEvent::ShotResult {
            x: 3,
            y: 4,
            result: ShotKind::Fatal,
            destroyed_aircraft: Some(1),
            is_my_shot: true,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "action": "ShotResult",
                "data": {"x": 3, "y": 4, "result": "fatal", "destroyed_aircraft": 1, "is_my_shot": true}
            })
        );

        let miss = ServerEvent::ShotResult {
            x: 0,
            y: 0,
            result: ShotKind::Miss,
            destroyed_aircraft: None,
            is_my_shot: false,
        };
        let value = serde_json::to_value(&miss).unwrap();
        assert!(value["data"].get("destroyed_aircraft").is_none());
    }

    #[test]
    fn test_encode_rejected() {
        let value = serde_json::to_value(ServerEvent::rejected(RejectCode::NotYourTurn, "not your turn")).unwrap();
        assert_eq!(value["action"], "Rejected");
        assert_eq!(value["data"]["code"], "NOT_YOUR_TURN");
    }
}
