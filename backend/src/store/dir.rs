//! Directory store - JSON documents on disk.
//!
//! Layout: `<root>/<collection>/<id>.json`, one pretty-printed document per
//! file. Ids are UUID v4. Queries are evaluated in process over every
//! document of the collection, oldest first.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{merge_update, stamp_new, Document, DocumentStore, FindResult, Query};
use crate::error::{StoreError, StoreResult};
use crate::Record;

/// Directory used when none is given (relative to current dir)
pub const DEFAULT_STORE_DIR: &str = ".docimport/store";

/// Document store backed by a directory tree
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
    default_locale: Option<String>,
}

impl DirStore {
    /// Store rooted at `root`. Directories are created on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: PathBuf::from(root.as_ref()),
            default_locale: None,
        }
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> StoreResult<PathBuf> {
        check_name("collection", collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, id: &str) -> StoreResult<PathBuf> {
        check_name("id", id)?;
        Ok(self.collection_dir(collection)?.join(format!("{}.json", id)))
    }

    async fn write(&self, collection: &str, doc: &Document) -> StoreResult<()> {
        let id = super::document_id(doc)
            .ok_or_else(|| StoreError::Rejected("Document has no id".to_string()))?;
        fs::create_dir_all(self.collection_dir(collection)?).await?;
        let content = serde_json::to_string_pretty(doc)?;
        fs::write(self.document_path(collection, &id)?, content).await?;
        Ok(())
    }

    /// A document by id. Ids that cannot name a file were never written.
    async fn read(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        if check_name("id", id).is_err() {
            return Ok(None);
        }
        let path = self.document_path(collection, id)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Every document of a collection, oldest first.
    pub async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let dir = self.collection_dir(collection)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut docs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            docs.push(serde_json::from_str::<Document>(&content)?);
        }

        docs.sort_by(|a, b| {
            let key = |d: &Document| {
                (
                    d.get("createdAt").and_then(Value::as_str).unwrap_or("").to_string(),
                    super::document_id(d).unwrap_or_default(),
                )
            };
            key(a).cmp(&key(b))
        });
        Ok(docs)
    }
}

impl Default for DirStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_DIR)
    }
}

/// Collection slugs and ids become path components.
fn check_name(kind: &str, name: &str) -> StoreResult<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::Rejected(format!("Invalid {} '{}'", kind, name)))
    }
}

#[async_trait]
impl DocumentStore for DirStore {
    async fn create(&self, collection: &str, data: Record, _locale: Option<&str>) -> StoreResult<Document> {
        let doc = stamp_new(data);
        self.write(collection, &doc).await?;
        Ok(doc)
    }

    async fn update(
        &self,
        id: &str,
        collection: &str,
        data: Record,
        _locale: Option<&str>,
    ) -> StoreResult<Document> {
        let existing = self.read(collection, id).await?.ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        let doc = merge_update(existing, data);
        self.write(collection, &doc).await?;
        Ok(doc)
    }

    async fn find_by_id(
        &self,
        id: &str,
        collection: &str,
        _locale: Option<&str>,
    ) -> StoreResult<Option<Document>> {
        self.read(collection, id).await
    }

    async fn find(&self, collection: &str, query: &Query) -> StoreResult<FindResult> {
        let docs = self.list(collection).await?;
        Ok(FindResult { docs: query.apply(docs) })
    }

    fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{document_id, Where};
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_create_then_find_by_id() {
        let dir = tempdir().unwrap();
        let store = DirStore::new(dir.path());

        let doc = store.create("posts", record(json!({ "title": "Hello" })), None).await.unwrap();
        let id = document_id(&doc).unwrap();
        assert!(dir.path().join("posts").join(format!("{}.json", id)).exists());

        let found = store.find_by_id(&id, "posts", None).await.unwrap().unwrap();
        assert_eq!(found["title"], "Hello");
        assert!(store.find_by_id("missing", "posts", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unusable_id_is_absent() {
        let dir = tempdir().unwrap();
        let store = DirStore::new(dir.path());

        for id in ["legacy 42", "post.7", "1.5", "../etc"] {
            assert!(store.find_by_id(id, "posts", None).await.unwrap().is_none());
            assert!(store.update(id, "posts", Record::new(), None).await.unwrap_err().is_not_found());
        }
        assert!(store.find_by_id("x", "../posts", None).await.is_err());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let dir = tempdir().unwrap();
        let store = DirStore::new(dir.path());

        let doc = store
            .create("posts", record(json!({ "title": "Hello", "views": 1 })), None)
            .await
            .unwrap();
        let id = document_id(&doc).unwrap();

        let updated = store
            .update(&id, "posts", record(json!({ "views": 2 })), Some("fr"))
            .await
            .unwrap();
        assert_eq!(updated["title"], "Hello");
        assert_eq!(updated["views"], 2);

        let err = store.update("nope", "posts", Record::new(), None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_with_filter_and_limit() {
        let dir = tempdir().unwrap();
        let store = DirStore::new(dir.path());
        for name in ["a.png", "b.png", "a.png"] {
            store.create("media", record(json!({ "filename": name })), None).await.unwrap();
        }

        let all = store.find("media", &Query::new()).await.unwrap();
        assert_eq!(all.docs.len(), 3);

        let query = Query::new().filter(Where::equals("filename", "a.png")).limit(1);
        let found = store.find("media", &query).await.unwrap();
        assert_eq!(found.docs.len(), 1);

        let empty = store.find("unknown", &Query::new()).await.unwrap();
        assert!(empty.docs.is_empty());
    }

    #[tokio::test]
    async fn test_path_components_are_checked() {
        let dir = tempdir().unwrap();
        let store = DirStore::new(dir.path()).with_default_locale("en");

        assert!(store.find_by_id("../secret", "posts", None).await.is_err());
        assert!(store.create("../posts", Record::new(), None).await.is_err());
        assert_eq!(store.default_locale(), Some("en"));
    }
}
