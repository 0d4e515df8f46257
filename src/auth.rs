//! Bearer token verification.
//!
//! Tokens are HS256 JWTs issued by the account service: `header.claims.signature`, each
//! part base64url without padding, signed with HMAC-SHA256 over `header.claims`.
//! Claims carry `userId`, `username` and `exp` (unix seconds).

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Serialize, Deserialize};
use sha2::Sha256;

use crate::game::entities::Identity;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("malformed token")]
    Malformed,

    #[error("unsupported token algorithm {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid token signature")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("invalid signing key")]
    InvalidKey,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: i64,
    username: String,
    exp: u64,
}

pub struct TokenAuthenticator {
    secret: Vec<u8>,
}

impl TokenAuthenticator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.verify_at(token, unix_now())
    }

    /// Verify against an explicit clock.
    pub fn verify_at(&self, token: &str, now: u64) -> Result<Identity, AuthError> {
        let mut parts = token.trim().split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Malformed);
        };

        let header: Header = decode_json(header)?;
        if header.alg != "HS256" {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| AuthError::Malformed)?;
        let mut mac = self.mac()?;
        mac.update(signing_input(token.trim()).as_bytes());
        mac.verify_slice(&signature).map_err(|_| AuthError::BadSignature)?;

        let claims: Claims = decode_json(claims)?;
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }
        Ok(Identity {
            id: claims.user_id,
            username: claims.username,
        })
    }

    /// Mint a token for `identity` valid for `ttl_secs`. The account service issues
    /// production tokens; this covers round-trips in tests.
    #[cfg(test)]
    pub fn issue(&self, identity: &Identity, ttl_secs: u64) -> Result<String, AuthError> {
        self.issue_at(identity, unix_now() + ttl_secs)
    }

    #[cfg(test)]
    fn issue_at(&self, identity: &Identity, exp: u64) -> Result<String, AuthError> {
        let header = encode_json(&Header { alg: "HS256".into(), typ: Some("JWT".into()) })?;
        let claims = encode_json(&Claims {
            user_id: identity.id,
            username: identity.username.clone(),
            exp,
        })?;
        let input = format!("{header}.{claims}");
        let mut mac = self.mac()?;
        mac.update(input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{input}.{signature}"))
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::InvalidKey)
    }
}

fn signing_input(token: &str) -> &str {
    token.rsplit_once('.').map(|(input, _)| input).unwrap_or(token)
}

fn decode_json<T: for<'de> Deserialize<'de>>(part: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD.decode(part).map_err(|_| AuthError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed)
}

#[cfg(test)]
fn encode_json<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let bytes = serde_json::to_vec(value).map_err(|_| AuthError::Malformed)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pilot() -> Identity {
        Identity { id: 42, username: "maverick".into() }
    }

    #[test]
    fn test_issue_then_verify() {
        let auth = TokenAuthenticator::new("secret");
        let token = auth.issue(&pilot(), 60).unwrap();
        assert_eq!(auth.verify(&token), Ok(pilot()));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = TokenAuthenticator::new("secret").issue(&pilot(), 60).unwrap();
        let other = TokenAuthenticator::new("other");
        assert_eq!(other.verify(&token), Err(AuthError::BadSignature));
    }

    #[test]
    fn test_tampered_claims_are_rejected() {
        let auth = TokenAuthenticator::new("secret");
        let token = auth.issue(&pilot(), 60).unwrap();
        let forged_claims = encode_json(&Claims { user_id: 1, username: "admin".into(), exp: u64::MAX }).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert_eq!(auth.verify(&forged), Err(AuthError::BadSignature));
    }

    #[test]
    fn test_expired_token() {
        let auth = TokenAuthenticator::new("secret");
        let token = auth.issue_at(&pilot(), 1_000).unwrap();
        assert_eq!(auth.verify_at(&token, 999), Ok(pilot()));
        assert_eq!(auth.verify_at(&token, 1_000), Err(AuthError::Expired));
    }

    #[test]
    fn test_malformed_tokens() {
        let auth = TokenAuthenticator::new("secret");
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.##"] {
            assert_eq!(auth.verify(token), Err(AuthError::Malformed), "token {token:?}");
        }
    }

    #[test]
    fn test_other_algorithm_is_refused() {
        let auth = TokenAuthenticator::new("secret");
        let header = encode_json(&Header { alg: "none".into(), typ: None }).unwrap();
        let claims = encode_json(&Claims { user_id: 1, username: "x".into(), exp: u64::MAX }).unwrap();
        let token = format!("{header}.{claims}.");
        assert_eq!(auth.verify(&token), Err(AuthError::UnsupportedAlgorithm("none".into())));
    }
}
