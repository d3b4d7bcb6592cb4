//! Command handlers

pub mod auth;
pub mod config;
pub mod plant;
pub mod pot;
pub mod user;

use leafcare_core::auth::bearer_token;
use leafcare_core::LeafCare;

/// The opened service plus the caller's access token
pub struct Session {
    pub api: LeafCare,
    token: Option<String>,
}

impl Session {
    /// Accepts either a bare token or an `Authorization` header value
    pub fn new(api: LeafCare, token: Option<String>) -> Self {
        Self {
            api,
            token: token.map(|t| normalize_token(&t)),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

fn normalize_token(raw: &str) -> String {
    bearer_token(raw).unwrap_or(raw.trim()).to_string()
}
