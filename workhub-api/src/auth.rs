//! Token issuance
//!
//! Signs authentication claims with a process-wide secret handed in through
//! [`AuthConfig`] at construction. Tokens expire after the configured TTL
//! (one day by default); there is no refresh, revocation, or rotation.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use workhub_core::config::AuthConfig;
use workhub_core::core_model::User;

use crate::error::{ApiError, ApiResult};

/// Signed authentication payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's identifier
    pub sub: String,

    /// Username at issuance time
    pub username: String,

    /// Issued-at, seconds since epoch
    pub iat: u64,

    /// Expiry, seconds since epoch
    pub exp: u64,
}

/// Issues and verifies signed authentication tokens
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: config.token_ttl,
        }
    }

    /// Sign a token for the user with the configured expiry
    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = unix_now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Token signing failed: {}", e)))
    }

    /// Decode a token, checking signature and expiry
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| {
                ApiError::unauthorized(
                    "Token is missing, expired, or malformed",
                    "Invalid authentication token",
                )
            })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
