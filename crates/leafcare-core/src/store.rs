//! Document store
//!
//! A `DocumentStore` owns one collection of documents backed by one JSON
//! file. It is a cheap handle: clones share the same collection, so one
//! store per collection is opened at startup and handed to every caller.
//!
//! ## Consistency
//!
//! Reads take a shared lock and return copies. Mutations take the exclusive
//! lock for the whole sequence of computing the new collection, writing it
//! to disk, and publishing it in memory. A mutation whose write fails leaves
//! both the file and the in-memory collection untouched, and a read never
//! sees state that is not yet on disk.
//!
//! ## Usage
//!
//! ```ignore
//! let plants = DocumentStore::open("data/plants.json").await?;
//!
//! let basil = plants.save(Document::new().with("name", "basil")).await?;
//! let mine = plants.find_by(&Criteria::eq("userId", 4)).await;
//! plants.delete(basil.id().unwrap()).await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::criteria::Criteria;
use crate::document::{Document, DocumentId};
use crate::storage::{CollectionFile, CollectionPersistence, StoreError, StoreResult};

/// Durable, queryable storage for one collection
#[derive(Debug, Clone)]
pub struct DocumentStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    persistence: CollectionPersistence,
    collection: RwLock<CollectionFile>,
}

impl DocumentStore {
    /// Open the store backed by `path`
    ///
    /// - Existing, well-formed file: loaded into memory
    /// - Missing file: an empty collection is created and written
    /// - Unparseable file: `StoreError::InvalidState`, the file is left alone
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let persistence = CollectionPersistence::new(path.as_ref());
        let collection = persistence.load_or_create().await?;

        info!(
            path = %persistence.path().display(),
            documents = collection.documents.len(),
            next_id = %collection.next_id,
            "document store opened"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                persistence,
                collection: RwLock::new(collection),
            }),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        self.inner.persistence.path()
    }

    // ==================== Reads ====================

    /// Look up a document by id
    pub async fn find(&self, id: DocumentId) -> Option<Document> {
        let collection = self.inner.collection.read().await;
        collection
            .documents
            .iter()
            .find(|doc| doc.id() == Some(id))
            .cloned()
    }

    /// First document, in collection order, matching `criteria`
    pub async fn find_one_by(&self, criteria: &Criteria) -> Option<Document> {
        let collection = self.inner.collection.read().await;
        collection
            .documents
            .iter()
            .find(|doc| criteria.matches(doc))
            .cloned()
    }

    /// All documents matching `criteria`, in collection order
    pub async fn find_by(&self, criteria: &Criteria) -> Vec<Document> {
        let collection = self.inner.collection.read().await;
        collection
            .documents
            .iter()
            .filter(|doc| criteria.matches(doc))
            .cloned()
            .collect()
    }

    /// Every document, in collection order
    pub async fn find_all(&self) -> Vec<Document> {
        self.inner.collection.read().await.documents.clone()
    }

    /// Number of documents in the collection
    pub async fn len(&self) -> usize {
        self.inner.collection.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // ==================== Mutations ====================

    /// Create or replace a document
    ///
    /// Without an id, the document gets the next id and is appended. With an
    /// id, it replaces the stored document with that id in place; the id must
    /// already exist. The file reflects the change before this returns.
    pub async fn save(&self, mut document: Document) -> StoreResult<Document> {
        let mut collection = self.inner.collection.write().await;
        let mut next = collection.clone();

        match document.id() {
            None => {
                let following = next.next_id.next().ok_or_else(|| StoreError::InvalidState {
                    path: self.path().to_path_buf(),
                    details: "no document ids left".to_string(),
                })?;
                document.assign_id(next.next_id);
                next.next_id = following;
                next.documents.push(document.clone());
            }
            Some(id) => {
                let slot = next
                    .documents
                    .iter_mut()
                    .find(|doc| doc.id() == Some(id))
                    .ok_or_else(|| {
                        warn!(path = %self.path().display(), %id, "update of unknown document");
                        StoreError::NotFound { id }
                    })?;
                *slot = document.clone();
            }
        }

        self.inner.persistence.save(&next).await?;
        *collection = next;
        Ok(document)
    }

    /// Remove a document by id
    ///
    /// Returns the removed document, or `None` if no document has that id.
    /// Removed ids are never handed out again.
    pub async fn delete(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        let mut collection = self.inner.collection.write().await;

        let Some(index) = collection
            .documents
            .iter()
            .position(|doc| doc.id() == Some(id))
        else {
            return Ok(None);
        };

        let mut next = collection.clone();
        let removed = next.documents.remove(index);

        self.inner.persistence.save(&next).await?;
        *collection = next;
        Ok(Some(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use tempfile::TempDir;

    async fn open_store(temp_dir: &TempDir) -> DocumentStore {
        DocumentStore::open(temp_dir.path().join("docs.json"))
            .await
            .unwrap()
    }

    fn named(name: &str) -> Document {
        Document::new().with("name", name)
    }

    fn id(value: u64) -> DocumentId {
        DocumentId::new(value)
    }

    fn conditions(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn names(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.get_str("name").unwrap()).collect()
    }

    #[tokio::test]
    async fn test_open_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("users.json");

        let store = DocumentStore::open(&path).await.unwrap();

        assert!(path.exists());
        assert!(store.is_empty().await);
        assert_eq!(store.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.json");
        std::fs::write(&path, "[{\"id\": 1},").unwrap();

        let err = DocumentStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_not_reused() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        for name in ["a", "b", "c"] {
            store.save(named(name)).await.unwrap();
        }

        let all = store.find_all().await;
        assert_eq!(names(&all), vec!["a", "b", "c"]);
        let ids: Vec<_> = all.iter().map(|d| d.id().unwrap()).collect();
        assert_eq!(ids, vec![id(1), id(2), id(3)]);

        let removed = store.delete(id(2)).await.unwrap().unwrap();
        assert_eq!(removed.get_str("name"), Some("b"));

        let all = store.find_all().await;
        assert_eq!(names(&all), vec!["a", "c"]);
        assert_eq!(all[1].id(), Some(id(3)));

        let d = store.save(named("d")).await.unwrap();
        assert_eq!(d.id(), Some(id(4)));
    }

    #[tokio::test]
    async fn test_deleted_newest_id_not_reused_after_reload() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = open_store(&temp_dir).await;
            store.save(named("a")).await.unwrap();
            store.save(named("b")).await.unwrap();
            store.delete(id(2)).await.unwrap();
        }

        let store = open_store(&temp_dir).await;
        let c = store.save(named("c")).await.unwrap();
        assert_eq!(c.id(), Some(id(3)));
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        let saved = store.save(named("fern")).await.unwrap();
        assert_eq!(store.find(saved.id().unwrap()).await, Some(saved));
        assert!(store.find(id(99)).await.is_none());
    }

    #[tokio::test]
    async fn test_find_one_by_email() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;
        let criteria = Criteria::eq("email", "x@example.com");

        assert!(store.find_one_by(&criteria).await.is_none());

        store
            .save(Document::new().with("email", "other@example.com"))
            .await
            .unwrap();
        let saved = store
            .save(Document::new().with("email", "x@example.com"))
            .await
            .unwrap();

        assert_eq!(store.find_one_by(&criteria).await, Some(saved));
    }

    #[tokio::test]
    async fn test_find_one_by_returns_first_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        store.save(named("a").with("kind", "x")).await.unwrap();
        store.save(named("b").with("kind", "x")).await.unwrap();

        let found = store.find_one_by(&Criteria::eq("kind", "x")).await.unwrap();
        assert_eq!(found.get_str("name"), Some("a"));
    }

    #[tokio::test]
    async fn test_find_by_exact_match() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        store.save(named("a").with("userId", 1)).await.unwrap();
        store.save(named("b").with("userId", "1")).await.unwrap();
        store.save(named("c")).await.unwrap();
        store.save(named("d").with("userId", 1)).await.unwrap();

        let found = store.find_by(&Criteria::eq("userId", 1)).await;
        assert_eq!(names(&found), vec!["a", "d"]);
    }

    #[tokio::test]
    async fn test_find_by_or_criteria() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        store.save(named("both").with("a", 1).with("b", 2)).await.unwrap();
        store.save(named("none").with("a", 2)).await.unwrap();
        store.save(named("only-b").with("b", 2)).await.unwrap();
        store.save(named("only-a").with("a", 1)).await.unwrap();

        let criteria =
            Criteria::any_of([conditions(json!({"a": 1})), conditions(json!({"b": 2}))]);
        let found = store.find_by(&criteria).await;

        // union without duplicates, in collection order
        assert_eq!(names(&found), vec!["both", "only-b", "only-a"]);
    }

    #[tokio::test]
    async fn test_find_by_empty_criteria_is_find_all() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        store.save(named("a")).await.unwrap();
        store.save(named("b")).await.unwrap();

        assert_eq!(store.find_by(&Criteria::all()).await, store.find_all().await);
    }

    #[tokio::test]
    async fn test_find_all_returns_copies() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;
        store.save(named("a")).await.unwrap();

        let mut copies = store.find_all().await;
        copies[0].set("name", "mutated");

        assert_eq!(store.find(id(1)).await.unwrap().get_str("name"), Some("a"));
    }

    #[tokio::test]
    async fn test_update_preserves_position_and_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        for name in ["a", "b", "c"] {
            store.save(named(name)).await.unwrap();
        }

        let mut b = store.find(id(2)).await.unwrap();
        b.set("name", "b2");
        let updated = store.save(b).await.unwrap();
        assert_eq!(updated.id(), Some(id(2)));

        let all = store.find_all().await;
        assert_eq!(names(&all), vec!["a", "b2", "c"]);
        assert_eq!(all[1].id(), Some(id(2)));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;
        store.save(named("a")).await.unwrap();
        let deleted = store.save(named("b")).await.unwrap();
        store.delete(deleted.id().unwrap()).await.unwrap();

        let err = store.save(deleted).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: missing } if missing == id(2)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        assert!(store.delete(id(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_terminal() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        let a = store.save(named("a")).await.unwrap();
        let a_id = a.id().unwrap();
        store.delete(a_id).await.unwrap();

        assert!(store.find(a_id).await.is_none());
        for _ in 0..5 {
            let created = store.save(named("again")).await.unwrap();
            assert_ne!(created.id(), Some(a_id));
        }
    }

    #[tokio::test]
    async fn test_round_trip_durability() {
        let temp_dir = TempDir::new().unwrap();
        let before = {
            let store = open_store(&temp_dir).await;
            store
                .save(named("a").with("count", 3).with("active", true))
                .await
                .unwrap();
            store.save(named("b").with("note", Value::Null)).await.unwrap();
            store.save(named("c").with("ratio", 0.5)).await.unwrap();
            store.delete(id(2)).await.unwrap();
            store.save(named("d")).await.unwrap();
            store.find_all().await
        };

        let reopened = open_store(&temp_dir).await;
        assert_eq!(reopened.find_all().await, before);
    }

    #[tokio::test]
    async fn test_file_tracks_each_mutation() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;
        let on_disk = || {
            let text = std::fs::read_to_string(store.path()).unwrap();
            CollectionFile::parse(&text).unwrap().documents
        };

        store.save(named("a")).await.unwrap();
        assert_eq!(on_disk(), store.find_all().await);

        let mut a = store.find(id(1)).await.unwrap();
        a.set("name", "a2");
        store.save(a).await.unwrap();
        assert_eq!(on_disk(), store.find_all().await);

        store.delete(id(1)).await.unwrap();
        assert!(on_disk().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;
        store.save(named("a")).await.unwrap();
        let before = store.find_all().await;

        // a directory in the temp file's place makes every write fail
        let blocker = temp_dir.path().join("docs.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        let err = store.save(named("b")).await.unwrap_err();
        assert!(err.is_persistence_failure());

        let mut renamed = store.find(id(1)).await.unwrap();
        renamed.set("name", "a2");
        let err = store.save(renamed).await.unwrap_err();
        assert!(err.is_persistence_failure());

        let err = store.delete(id(1)).await.unwrap_err();
        assert!(err.is_persistence_failure());

        assert_eq!(store.find_all().await, before);
        assert_eq!(names(&store.find_all().await), vec!["a"]);

        std::fs::remove_dir(&blocker).unwrap();

        // the failed insert did not use up an id
        let next = store.save(named("c")).await.unwrap();
        assert_eq!(next.id(), Some(id(2)));

        let text = std::fs::read_to_string(store.path()).unwrap();
        let on_disk = CollectionFile::parse(&text).unwrap();
        assert_eq!(on_disk.documents, store.find_all().await);
        assert_eq!(on_disk.next_id, id(3));
        assert_eq!(names(&on_disk.documents), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_insert_fails_when_ids_are_exhausted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs.json");
        let text = json!({"next_id": u64::MAX, "documents": [{"id": 1, "name": "a"}]});
        std::fs::write(&path, text.to_string()).unwrap();

        let store = DocumentStore::open(&path).await.unwrap();
        let err = store.save(named("b")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState { .. }));
        assert_eq!(names(&store.find_all().await), vec!["a"]);

        // updates do not need a new id
        let mut a = store.find(id(1)).await.unwrap();
        a.set("name", "a2");
        store.save(a).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_saves_get_distinct_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.save(named(&format!("n{}", i))).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id().unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);

        let reopened = open_store(&temp_dir).await;
        assert_eq!(reopened.len().await, 20);
    }
}
