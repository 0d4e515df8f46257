//! Helpers for error frames and HTTP error bodies.

use actix_web::{HttpResponse, http::StatusCode};
use log::error;
use serde_json::json;

use crate::game::error::RejectCode;
use crate::server::protocol::ServerEvent;

/// Encode a `Rejected` frame. Falls back to a fixed frame if serialization fails.
pub fn ws_rejection(code: RejectCode, message: &str) -> String {
    serde_json::to_string(&ServerEvent::rejected(code, message)).unwrap_or_else(|e| {
        error!("[WsError] Failed to encode rejection: {}", e);
        r#"{"action":"Rejected","data":{"code":"INTERNAL","message":"internal error"}}"#.to_string()
    })
}

/// JSON error response: `{"error": {"code": ..., "message": ...}}`.
pub fn http_error_response(code: &str, message: &str, status: StatusCode) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "error": { "code": code, "message": message }
    }))
}
