//! Session resolver: stateless verification of signed credentials.
//!
//! The credential is an HS256 JWT carrying `{sub, role, iat, exp}`. Resolution
//! is a pure verification function over the token and the signing secret; no
//! session store is consulted. Absent, malformed, expired, badly signed, and
//! unknown-role tokens all resolve to an authentication failure.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::roles::Role;

use super::principal::Identity;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

pub struct SessionResolver {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionResolver {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is a hard edge, not a window.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a credential embedding the subject and role.
    pub fn issue(&self, subject: &str, role: Role) -> AppResult<String> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Same as `issue` with an explicit clock, for expiry tests.
    pub fn issue_at(&self, subject: &str, role: Role, now: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            sub: subject.to_string(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal("token_encode".to_string(), e.to_string()))
    }

    /// Verify a credential into an `Identity`, or fail as unauthenticated.
    pub fn resolve(&self, credential: Option<&str>) -> AppResult<Identity> {
        let token = credential
            .ok_or_else(|| AppError::auth("token_missing", "no credential supplied"))?;
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::auth("token_expired", "credential expired")
                }
                _ => AppError::auth("token_invalid", "credential rejected"),
            }
        })?;
        let claims = data.claims;
        // An unknown role string never reaches policy lookup.
        let role: Role = claims
            .role
            .parse()
            .map_err(|()| AppError::auth("role_invalid", "credential carries an unknown role"))?;
        let issued_at = Utc
            .timestamp_opt(claims.iat, 0)
            .single()
            .ok_or_else(|| AppError::auth("token_invalid", "credential rejected"))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AppError::auth("token_invalid", "credential rejected"))?;
        Ok(Identity { subject: claims.sub, role, issued_at, expires_at })
    }
}
