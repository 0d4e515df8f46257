/// HTTP server configuration.
///
/// Defaults match a local development setup; `BIND_HOST` and `PORT` override them.
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Resolve the bind address from the environment.
pub fn bind_address() -> (String, u16) {
    let host = std::env::var("BIND_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    (host, port)
}

/// Upper bound on `/stats/users/{id}/matches`; `?limit=` can only lower it.
pub const MATCH_HISTORY_LIMIT: usize = 20;
