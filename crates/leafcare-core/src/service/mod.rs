//! Resource service
//!
//! `LeafCare` holds one [`DocumentStore`] per collection plus the token
//! authority, and implements the user, pot and plant operations on top of
//! the store's six operations. Validation, authorization and uniqueness
//! rules live here; the stores enforce none of them.
//!
//! Operations that need a caller take the raw access token (`Option<&str>`)
//! and fail with `Unauthorized` when it is missing or does not verify.

mod error;
mod plants;
mod pots;
mod users;

pub use error::{ApiError, ApiResult, INTERNAL_MESSAGE};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::auth::{AuthError, Claims, JwtAuthority, TokenAuthority};
use crate::config::Config;
use crate::criteria::Conditions;
use crate::document::{Document, DocumentId};
use crate::storage::StoreResult;
use crate::store::DocumentStore;

/// The LeafCare resource service
#[derive(Clone)]
pub struct LeafCare {
    users: DocumentStore,
    pots: DocumentStore,
    plants: DocumentStore,
    tokens: Arc<dyn TokenAuthority>,
    locks: Arc<WriteLocks>,
}

/// Held from a uniqueness check through the save that depends on it
#[derive(Default)]
struct WriteLocks {
    users: Mutex<()>,
    pots: Mutex<()>,
    plants: Mutex<()>,
}

impl LeafCare {
    pub fn new(
        users: DocumentStore,
        pots: DocumentStore,
        plants: DocumentStore,
        tokens: Arc<dyn TokenAuthority>,
    ) -> Self {
        Self {
            users,
            pots,
            plants,
            tokens,
            locks: Arc::default(),
        }
    }

    /// Open the three collections under the configured data directory
    pub async fn open(config: &Config) -> StoreResult<Self> {
        let users = DocumentStore::open(config.users_path()).await?;
        let pots = DocumentStore::open(config.pots_path()).await?;
        let plants = DocumentStore::open(config.plants_path()).await?;
        Ok(Self::new(
            users,
            pots,
            plants,
            Arc::new(JwtAuthority::from_config(config)),
        ))
    }

    /// Verify the caller's token
    fn authenticate(&self, token: Option<&str>) -> ApiResult<Claims> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        Ok(self.tokens.verify(token)?)
    }

    /// Verify the caller's token and require admin rights
    fn authenticate_admin(&self, token: Option<&str>, denied: &str) -> ApiResult<Claims> {
        let claims = self.authenticate(token)?;
        if !claims.is_admin {
            return Err(ApiError::forbidden(denied));
        }
        Ok(claims)
    }
}

/// Load a typed record by id
async fn load<T: DeserializeOwned>(store: &DocumentStore, id: DocumentId) -> ApiResult<Option<T>> {
    match store.find(id).await {
        Some(doc) => Ok(Some(doc.into_record()?)),
        None => Ok(None),
    }
}

/// Decode a list of documents into typed records
fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> ApiResult<Vec<T>> {
    docs.into_iter()
        .map(|doc| doc.into_record().map_err(ApiError::from))
        .collect()
}

/// Save a typed record and return it as stored
async fn persist<T: Serialize + DeserializeOwned>(store: &DocumentStore, record: &T) -> ApiResult<T> {
    let saved = store.save(Document::from_record(record)?).await?;
    Ok(saved.into_record()?)
}

/// Treat blank input the same as absent input
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// One alternative of a `$or` criteria
fn condition(key: &str, value: impl Into<Value>) -> Conditions {
    let mut conditions = Conditions::new();
    conditions.insert(key.to_string(), value.into());
    conditions
}
