use chrono::Duration;
use domain::users::DEFAULT_TOKEN_TTL_HOURS;
use domain::{FeedxError, Principal, Role, Timestamp, TokenIssuer, UserId, Username};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 session tokens.
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            ttl,
        }
    }

    fn decode_claims(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)?.claims;
        let username = Username::new(claims.username).ok_or(AuthError::Claims("empty username"))?;
        Ok(Principal {
            id: UserId::new(claims.id),
            username,
            name: claims.name,
            role: claims.role,
        })
    }
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, principal: &Principal, now: Timestamp) -> Result<String, FeedxError> {
        let claims = Claims {
            id: principal.id.as_i64(),
            username: principal.username.as_str().to_string(),
            name: principal.name.clone(),
            role: principal.role,
            iat: now.as_datetime().timestamp(),
            exp: now.plus(self.ttl).as_datetime().timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| FeedxError::Configuration(format!("cannot sign token: {e}")))
    }

    fn verify(&self, token: &str) -> Result<Principal, FeedxError> {
        Ok(self.decode_claims(token)?)
    }
}
