//! Collection file persistence
//!
//! Handles saving and loading one collection to/from the filesystem.
//! Uses atomic writes (write to temp file, then rename) to prevent corruption.
//!
//! File format (pretty-printed JSON):
//!
//! ```text
//! {
//!   "next_id": 4,
//!   "documents": [ { "id": 1, ... }, { "id": 3, ... } ]
//! }
//! ```
//!
//! A bare array of documents is accepted on load, and an empty file loads
//! as an empty collection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::{StoreError, StoreResult};
use crate::document::{Document, DocumentId};

/// In-memory image of one collection file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionFile {
    /// Id handed to the next created document
    pub next_id: DocumentId,
    /// Documents in creation order
    pub documents: Vec<Document>,
}

impl Default for CollectionFile {
    fn default() -> Self {
        Self {
            next_id: DocumentId::FIRST,
            documents: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Collection(CollectionFile),
    Documents(Vec<Document>),
}

impl CollectionFile {
    /// Parse file contents, checking the id invariants
    pub fn parse(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let parsed: OnDisk = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let collection = match parsed {
            OnDisk::Collection(c) => c,
            OnDisk::Documents(documents) => Self {
                next_id: DocumentId::FIRST,
                documents,
            },
        };
        collection.validated()
    }

    /// Serialize for writing to disk
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn validated(mut self) -> Result<Self, String> {
        let mut highest: Option<DocumentId> = None;
        let mut seen = std::collections::HashSet::with_capacity(self.documents.len());

        for (index, doc) in self.documents.iter().enumerate() {
            let id = doc
                .id()
                .ok_or_else(|| format!("document at index {} has no id", index))?;
            if !seen.insert(id) {
                return Err(format!("duplicate id {}", id));
            }
            highest = highest.max(Some(id));
        }

        // never hand out an id at or below one already present
        if let Some(highest) = highest {
            if self.next_id <= highest {
                self.next_id = highest
                    .next()
                    .ok_or_else(|| format!("id {} leaves no id for new documents", highest))?;
            }
        }
        Ok(self)
    }
}

/// Persistence handler for one collection file
#[derive(Debug, Clone)]
pub struct CollectionPersistence {
    path: PathBuf,
}

impl CollectionPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the collection file exists on disk
    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Load the collection from disk
    ///
    /// Returns `None` if the file doesn't exist.
    /// Returns an error if the file exists but can't be read or parsed.
    pub async fn load(&self) -> StoreResult<Option<CollectionFile>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::from_read(e, self.path.clone())),
        };

        let collection =
            CollectionFile::parse(&text).map_err(|details| StoreError::InvalidState {
                path: self.path.clone(),
                details,
            })?;
        Ok(Some(collection))
    }

    /// Load an existing collection or create an empty one on disk
    pub async fn load_or_create(&self) -> StoreResult<CollectionFile> {
        if let Some(collection) = self.load().await? {
            return Ok(collection);
        }

        let collection = CollectionFile::default();
        self.save(&collection).await?;
        Ok(collection)
    }

    /// Save the collection to disk using atomic write
    pub async fn save(&self, collection: &CollectionFile) -> StoreResult<()> {
        let bytes = collection.to_bytes()?;
        atomic_write(&self.path, &bytes).await?;
        debug!(
            path = %self.path.display(),
            documents = collection.documents.len(),
            "collection written"
        );
        Ok(())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// The target file is never left in a partially-written state.
pub(crate) async fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::from_io(e, parent.to_path_buf()))?;
    }

    let temp_path = temp_path_for(path);

    let write = async {
        let mut file = File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await
    };
    if let Err(e) = write.await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::from_io(e, temp_path));
    }

    if let Err(source) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::AtomicWriteFailed {
            from: temp_path,
            to: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
