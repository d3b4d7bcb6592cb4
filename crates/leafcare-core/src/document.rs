//! Stored documents
//!
//! A [`Document`] is a free-form mapping of field names to JSON values plus
//! the reserved `id` field, which only the store assigns.
//!
//! Typed records (users, pots, plants) convert to and from documents with
//! [`Document::from_record`] and [`Document::into_record`].

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Name of the reserved identity field
pub const ID_FIELD: &str = "id";

/// Identifier assigned by a store to a saved document
///
/// Ids are positive, strictly increasing in creation order, and never reused
/// within a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    /// The id handed to the first document of an empty collection
    pub const FIRST: DocumentId = DocumentId(1);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id following this one, `None` once ids are exhausted
    pub(crate) fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DocumentId> for Value {
    fn from(id: DocumentId) -> Self {
        Value::from(id.0)
    }
}

/// Error parsing a document id from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid document id '{0}': expected a positive integer")]
pub struct DocumentIdError(pub String);

impl FromStr for DocumentId {
    type Err = DocumentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(DocumentIdError(s.to_string())),
            Ok(v) => Ok(Self(v)),
        }
    }
}

/// One stored record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<DocumentId>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Document {
    /// Create an empty, unsaved document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from a JSON object
    ///
    /// A numeric `id` key is taken as the document id; any other shape of
    /// `id` is rejected.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Convert a serializable record into a document
    pub fn from_record<T: Serialize>(record: &T) -> Result<Self, serde_json::Error> {
        Self::from_value(serde_json::to_value(record)?)
    }

    /// Convert this document into a typed record
    pub fn into_record<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.into_value())
    }

    /// The JSON object form of this document, `id` included
    pub fn into_value(self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        if let Some(id) = self.id {
            map.insert(ID_FIELD.to_string(), id.into());
        }
        map.extend(self.fields);
        Value::Object(map)
    }

    /// The store-assigned id, `None` until first saved
    pub fn id(&self) -> Option<DocumentId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    /// Get a field value (never the id)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a field as a string slice
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Set a field, returning the previous value
    ///
    /// The reserved `id` key is ignored; ids are assigned by the store.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        if key == ID_FIELD {
            return None;
        }
        self.fields.insert(key, value.into())
    }

    /// Builder form of [`Document::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// All non-id fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Value used when matching criteria; `id` resolves to the document id
    pub(crate) fn lookup(&self, key: &str) -> Option<Cow<'_, Value>> {
        if key == ID_FIELD {
            return self.id.map(|id| Cow::Owned(id.into()));
        }
        self.fields.get(key).map(Cow::Borrowed)
    }
}
