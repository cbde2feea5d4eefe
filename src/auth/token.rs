use crate::config::Config;
use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of a session token, in seconds (2 hours).
pub const SESSION_TTL_SECS: u64 = 60 * 60 * 2;
/// Lifetime of a password-reset token, in seconds (20 minutes).
pub const RESET_TTL_SECS: u64 = 60 * 20;

/// Distinguishes what a token may be used for.
///
/// Session tokens and reset tokens are built from the same signing primitive,
/// but a reset token must not be replayable as a session credential (and vice
/// versa), so the purpose is carried as an explicit claim and checked by the
/// request extractors.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    /// Regular authenticated-session access.
    Session,
    /// One-time password-reset authorization.
    Reset,
}

impl TokenPurpose {
    /// Token lifetime for this profile, in seconds.
    pub fn ttl_secs(self) -> u64 {
        match self {
            TokenPurpose::Session => SESSION_TTL_SECS,
            TokenPurpose::Reset => RESET_TTL_SECS,
        }
    }
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: Uuid,
    /// Expiration timestamp (seconds since epoch) for the token.
    pub exp: u64,
    /// Timestamp (seconds since epoch) at which the token was issued.
    pub iat: u64,
    /// Issuer of the token, from server configuration.
    pub iss: String,
    /// What the token authorizes.
    pub purpose: TokenPurpose,
}

/// Signing material and issuer identity for the token service.
///
/// Constructed once at startup from [`Config`] and injected into the app via
/// `web::Data`; a missing secret is therefore a startup failure, never a
/// per-request one.
#[derive(Clone)]
pub struct TokenKeys {
    secret: String,
    issuer: String,
}

impl TokenKeys {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt_secret.clone(), config.jwt_issuer.clone())
    }

    /// Issues a signed token for `user_id` with the expiry profile of `purpose`.
    pub fn issue(&self, user_id: Uuid, purpose: TokenPurpose) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp() as u64;

        let claims = Claims {
            sub: user_id,
            exp: now + purpose.ttl_secs(),
            iat: now,
            iss: self.issuer.clone(),
            purpose,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token's signature, expiry and issuer, and decodes its claims.
    ///
    /// Any failure (malformed token, bad signature, expired, wrong issuer)
    /// yields `None`; verification never surfaces an error to the caller.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .ok()
    }
}
