use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::domain::UserId;
use crate::config::AuthConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("unable to sign token: {0}")]
    Encode(jsonwebtoken::errors::Error),
    #[error("token rejected: {0}")]
    Rejected(jsonwebtoken::errors::Error),
    #[error("token lifetime of {0} minutes is out of range")]
    Lifetime(i64),
}

/// HS256 bearer token issuer and verifier.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: i64,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self::from_secret(&config.jwt_secret, config.token_ttl_minutes)
    }

    pub fn from_secret(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    pub fn issue(&self, user_id: &UserId) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires = Duration::try_minutes(self.ttl_minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(TokenError::Lifetime(self.ttl_minutes))?;
        let claims = Claims {
            sub: user_id.0.clone(),
            iat: now.timestamp().max(0) as usize,
            exp: expires.timestamp().max(0) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| UserId(data.claims.sub))
            .map_err(TokenError::Rejected)
    }
}
