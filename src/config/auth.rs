/// Authentication configuration.
///
/// The token secret is shared with the external account service that issues tokens.
pub const TOKEN_SECRET_ENV: &str = "TOKEN_SECRET";

/// Fallback secret for local development only.
pub const DEV_TOKEN_SECRET: &str = "dev-secret-change-me";

/// Resolve the token secret from the environment, falling back to the development secret.
pub fn token_secret() -> String {
    std::env::var(TOKEN_SECRET_ENV).unwrap_or_else(|_| {
        log::warn!("[Config] {} not set, using development secret", TOKEN_SECRET_ENV);
        DEV_TOKEN_SECRET.to_string()
    })
}
