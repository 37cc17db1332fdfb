//! In-process document store.
//!
//! Nothing is persisted; used for dry runs and as a test double.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{document_id, merge_update, stamp_new, Document, DocumentStore, FindResult, Query};
use crate::error::{StoreError, StoreResult};
use crate::Record;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    default_locale: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    /// Add a document as is, keeping its id.
    pub async fn insert(&self, collection: &str, doc: Document) {
        let mut collections = self.collections.lock().await;
        collections.entry(collection.to_string()).or_default().push(doc);
    }

    /// Every document of a collection, in insertion order.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        let collections = self.collections.lock().await;
        collections.get(collection).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, data: Record, _locale: Option<&str>) -> StoreResult<Document> {
        let doc = stamp_new(data);
        self.insert(collection, doc.clone()).await;
        Ok(doc)
    }

    async fn update(
        &self,
        id: &str,
        collection: &str,
        data: Record,
        _locale: Option<&str>,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.lock().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| document_id(d).as_deref() == Some(id)))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let doc = merge_update(std::mem::take(slot), data);
        *slot = doc.clone();
        Ok(doc)
    }

    async fn find_by_id(
        &self,
        id: &str,
        collection: &str,
        _locale: Option<&str>,
    ) -> StoreResult<Option<Document>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| document_id(d).as_deref() == Some(id)))
            .cloned())
    }

    async fn find(&self, collection: &str, query: &Query) -> StoreResult<FindResult> {
        let docs = self.documents(collection).await;
        Ok(FindResult { docs: query.apply(docs) })
    }

    fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Where;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_crud() {
        let store = MemoryStore::new();
        store.insert("posts", record(json!({ "id": "seed", "title": "Old" }))).await;

        let created = store.create("posts", record(json!({ "title": "New" })), None).await.unwrap();
        assert_eq!(store.documents("posts").await.len(), 2);

        let updated = store
            .update("seed", "posts", record(json!({ "title": "Renamed" })), None)
            .await
            .unwrap();
        assert_eq!(updated["title"], "Renamed");
        assert_eq!(updated["id"], "seed");

        let id = document_id(&created).unwrap();
        assert!(store.find_by_id(&id, "posts", None).await.unwrap().is_some());
        assert!(store.update("ghost", "posts", Record::new(), None).await.unwrap_err().is_not_found());

        let found = store
            .find("posts", &Query::new().filter(Where::equals("title", "Renamed")))
            .await
            .unwrap();
        assert_eq!(found.docs.len(), 1);
    }
}
