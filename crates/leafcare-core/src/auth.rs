//! Authentication
//!
//! Access tokens and password hashing.
//!
//! Tokens are HS256 JWTs carrying the user id, email and admin flag. The
//! service only depends on the [`TokenAuthority`] trait, so another signer
//! can be swapped in without touching the handlers.
//!
//! Passwords are stored as Argon2id PHC strings, never in plain text.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::document::DocumentId;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No token was supplied
    #[error("Token not provided")]
    MissingToken,

    /// Token is malformed or its signature does not verify
    #[error("Invalid token")]
    InvalidToken,

    /// Token has expired
    #[error("Token expired")]
    TokenExpired,

    /// Token could not be signed
    #[error("Failed to generate token")]
    TokenGenerationFailed,

    /// Password could not be hashed
    #[error("Failed to hash password: {0}")]
    PasswordHash(String),
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the authenticated user
    pub id: DocumentId,

    /// User's email
    pub email: String,

    /// Whether the user has admin rights
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,
}

impl Claims {
    /// Claims for `id` valid for `ttl` from now
    pub fn new(id: DocumentId, email: impl Into<String>, is_admin: bool, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: email.into(),
            is_admin,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Whether these claims belong to user `id`
    pub fn is_user(&self, id: DocumentId) -> bool {
        self.id == id
    }
}

/// Issues and verifies access tokens
pub trait TokenAuthority: Send + Sync {
    /// Sign `claims` into a token
    fn sign(&self, claims: &Claims) -> AuthResult<String>;

    /// Verify a token and return its claims
    fn verify(&self, token: &str) -> AuthResult<Claims>;

    /// Lifetime of issued tokens
    fn ttl(&self) -> Duration;

    /// Issue a token for a user
    fn issue(&self, id: DocumentId, email: &str, is_admin: bool) -> AuthResult<String> {
        self.sign(&Claims::new(id, email, is_admin, self.ttl()))
    }
}

/// HS256 JWT token authority
#[derive(Clone)]
pub struct JwtAuthority {
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtAuthority {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            ttl,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.token_secret,
            Duration::minutes(config.token_ttl_minutes),
        )
    }
}

impl TokenAuthority for JwtAuthority {
    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)
    }

    fn verify(&self, token: &str) -> AuthResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;
        Ok(data.claims)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Hash a password into an Argon2id PHC string
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Check a password against a stored hash
///
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => hasher()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(not(test))]
fn hasher() -> Argon2<'static> {
    Argon2::default()
}

// cheap parameters keep the test suite fast; verification reads the
// parameters back from the stored hash
#[cfg(test)]
fn hasher() -> Argon2<'static> {
    use argon2::{Algorithm as Argon2Algorithm, Params, Version};
    let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, 1, None)
        .expect("valid argon2 test params");
    Argon2::new(Argon2Algorithm::Argon2id, Version::V0x13, params)
}
