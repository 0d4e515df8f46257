//! HTTP and WebSocket routing configuration.

use actix_web::{web, HttpResponse, http::StatusCode};
use log::error;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::config::server::MATCH_HISTORY_LIMIT;
use crate::persistence::recorder::{GetMatchDetails, GetUserMatches, GetUserStats};
use crate::server::admin_feed::ws_admin;
use crate::server::game_session::server::GetStats;
use crate::server::game_session::session::ws_game;
use crate::server::state::AppState;
use crate::server::ws_error::http_error_response;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws/game").to(ws_game))
        .service(web::resource("/ws/admin").to(ws_admin))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/stats").route(web::get().to(stats)))
        .service(web::resource("/stats/users/{user_id}").route(web::get().to(user_stats)))
        .service(web::resource("/stats/users/{user_id}/matches").route(web::get().to(user_matches)))
        .service(web::resource("/matches/{match_id}").route(web::get().to(match_details)));
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

fn history_limit(requested: Option<usize>) -> usize {
    requested.map_or(MATCH_HISTORY_LIMIT, |limit| limit.min(MATCH_HISTORY_LIMIT))
}

fn recorder_unavailable(e: actix::MailboxError) -> HttpResponse {
    error!("[Router] Recorder request failed: {}", e);
    http_error_response("UNAVAILABLE", "Recorder unavailable", StatusCode::SERVICE_UNAVAILABLE)
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true }))
}

/// Arena snapshot: sessions, queue, matches and lifetime counters.
async fn stats(data: web::Data<AppState>) -> HttpResponse {
    match data.game_server.send(GetStats).await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => {
            error!("[Router] Stats request failed: {}", e);
            http_error_response("UNAVAILABLE", "Game server unavailable", StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

async fn user_stats(data: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let user_id = path.into_inner();
    match data.recorder.send(GetUserStats { user_id }).await {
        Ok(Some(stats)) => HttpResponse::Ok().json(stats),
        Ok(None) => http_error_response("NOT_FOUND", "No statistics for this user", StatusCode::NOT_FOUND),
        Err(e) => recorder_unavailable(e),
    }
}

/// Most recent recorded matches of one user.
async fn user_matches(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<HistoryQuery>,
) -> HttpResponse {
    let user_id = path.into_inner();
    let limit = history_limit(query.limit);
    match data.recorder.send(GetUserMatches { user_id, limit }).await {
        Ok(matches) => HttpResponse::Ok().json(matches),
        Err(e) => recorder_unavailable(e),
    }
}

async fn match_details(data: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let match_id = path.into_inner();
    match data.recorder.send(GetMatchDetails { match_id }).await {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => http_error_response("NOT_FOUND", "No record for this match", StatusCode::NOT_FOUND),
        Err(e) => recorder_unavailable(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_limit_is_capped() {
        assert_eq!(history_limit(None), MATCH_HISTORY_LIMIT);
        assert_eq!(history_limit(Some(5)), 5);
        assert_eq!(history_limit(Some(MATCH_HISTORY_LIMIT * 10)), MATCH_HISTORY_LIMIT);
    }
}
