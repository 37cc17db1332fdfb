//! Asset URL resolution.
//!
//! A relationship or upload value given as a URL is replaced by the id of an
//! asset document. Existing assets are matched by URL or filename, otherwise
//! a placeholder asset `{ filename, mimeType, url }` is created. The file
//! itself is never downloaded.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};

use super::AssetResolver;
use crate::config::MediaConfig;
use crate::error::StoreResult;
use crate::logs::{log_entry, LogEntry};
use crate::store::{document_id, DocumentStore, Query, Where};
use crate::Record;

/// Base used to resolve root-relative URLs.
const PLACEHOLDER_ORIGIN: &str = "http://localhost";

/// Last non-empty path segment of a URL, or `unknown`.
pub fn filename_from_url(url: &str) -> String {
    let parsed = if url.starts_with('/') {
        Url::parse(PLACEHOLDER_ORIGIN).and_then(|base| base.join(url))
    } else {
        Url::parse(url)
    };

    parsed
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Content type implied by the URL's file extension.
pub fn mime_type_for(url: &str) -> &'static str {
    let filename = filename_from_url(url);
    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match extension.as_str() {
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "gif" => "image/gif",
        "jpeg" | "jpg" => "image/jpeg",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Resolves asset URLs against a document store.
pub struct StoreAssetResolver<'a> {
    store: &'a dyn DocumentStore,
    asset_collections: Vec<String>,
    media: MediaConfig,
}

impl<'a> StoreAssetResolver<'a> {
    /// `asset_collections` lists the slugs that store assets, in preference order.
    pub fn new(store: &'a dyn DocumentStore, asset_collections: Vec<String>, media: MediaConfig) -> Self {
        Self { store, asset_collections, media }
    }

    async fn find_or_create(&self, collection: &str, url: &str, mime_type: &str) -> StoreResult<Option<String>> {
        let filename = filename_from_url(url);

        let query = Query::new()
            .filter(Where::or(vec![
                Where::equals("url", url),
                Where::equals("filename", filename.as_str()),
            ]))
            .limit(1);
        let existing = self.store.find(collection, &query).await?;
        if let Some(id) = existing.docs.first().and_then(document_id) {
            return Ok(Some(id));
        }

        let mut data = Record::new();
        data.insert("filename".into(), Value::String(filename));
        data.insert("mimeType".into(), Value::String(mime_type.to_string()));
        data.insert("url".into(), Value::String(url.to_string()));

        let created = self.store.create(collection, data, None).await?;
        Ok(document_id(&created))
    }
}

#[async_trait]
impl AssetResolver for StoreAssetResolver<'_> {
    fn is_asset_collection(&self, slug: &str) -> bool {
        self.asset_collections.iter().any(|c| c == slug)
    }

    async fn resolve(&self, url: &str, target: Option<&str>) -> Option<String> {
        if self.asset_collections.is_empty() {
            return None;
        }
        let collection = self
            .media
            .collection
            .as_deref()
            .or(target)
            .or_else(|| self.asset_collections.first().map(String::as_str))?;

        let mime_type = mime_type_for(url);
        let allowed = &self.media.allowed_mime_types;
        if !allowed.is_empty() && !allowed.iter().any(|m| m == mime_type) {
            log_entry(
                LogEntry::warning(format!("MIME type {} not allowed for URL: {}", mime_type, url))
                    .with_context(json!({ "url": url, "mimeType": mime_type })),
            );
            return None;
        }

        match self.find_or_create(collection, url, mime_type).await {
            Ok(id) => id,
            Err(e) => {
                log_entry(
                    LogEntry::warning(format!("Failed to convert URL to media relationship: {}", url))
                        .with_context(json!({ "url": url, "collection": collection, "error": e.to_string() })),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{FindResult, MemoryStore};
    use async_trait::async_trait;

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("https://cdn.test/images/cat.png?w=200"), "cat.png");
        assert_eq!(filename_from_url("/media/docs/report.pdf"), "report.pdf");
        assert_eq!(filename_from_url("https://cdn.test/images/"), "images");
        assert_eq!(filename_from_url("https://cdn.test"), "unknown");
        assert_eq!(filename_from_url("not a url"), "unknown");
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for("https://cdn.test/a.PNG"), "image/png");
        assert_eq!(mime_type_for("https://cdn.test/a.jpeg"), "image/jpeg");
        assert_eq!(mime_type_for("/files/spec.docx"), "application/vnd.openxmlformats-officedocument.wordprocessingml.document");
        assert_eq!(mime_type_for("https://cdn.test/archive.tar.gz"), "application/octet-stream");
        assert_eq!(mime_type_for("https://cdn.test/README"), "application/octet-stream");
    }

    fn media_config() -> MediaConfig {
        MediaConfig::default()
    }

    #[tokio::test]
    async fn test_creates_then_reuses_asset() {
        let store = MemoryStore::new();
        let resolver = StoreAssetResolver::new(&store, vec!["media".into()], media_config());

        let first = resolver.resolve("https://cdn.test/cat.png", None).await.unwrap();
        let again = resolver.resolve("https://cdn.test/cat.png", Some("media")).await.unwrap();
        let same_name = resolver.resolve("https://other.test/cat.png", None).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(first, same_name);

        let docs = store.documents("media").await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["filename"], "cat.png");
        assert_eq!(docs[0]["mimeType"], "image/png");
        assert_eq!(docs[0]["url"], "https://cdn.test/cat.png");
    }

    #[tokio::test]
    async fn test_collection_precedence() {
        let store = MemoryStore::new();
        let assets = vec!["media".to_string(), "files".to_string()];

        let resolver = StoreAssetResolver::new(&store, assets.clone(), media_config());
        resolver.resolve("https://cdn.test/a.pdf", Some("files")).await.unwrap();
        assert_eq!(store.documents("files").await.len(), 1);

        let overridden = MediaConfig { collection: Some("uploads".into()), ..MediaConfig::default() };
        let resolver = StoreAssetResolver::new(&store, assets, overridden);
        resolver.resolve("https://cdn.test/b.pdf", Some("files")).await.unwrap();
        assert_eq!(store.documents("uploads").await.len(), 1);
    }

    #[tokio::test]
    async fn test_no_asset_collection_means_no_reference() {
        let store = MemoryStore::new();
        let resolver = StoreAssetResolver::new(&store, Vec::new(), media_config());
        assert!(resolver.resolve("https://cdn.test/a.png", None).await.is_none());
        assert!(!resolver.is_asset_collection("media"));
    }

    #[tokio::test]
    async fn test_disallowed_mime_type() {
        let store = MemoryStore::new();
        let config = MediaConfig {
            collection: None,
            allowed_mime_types: vec!["image/png".into()],
        };
        let resolver = StoreAssetResolver::new(&store, vec!["media".into()], config);

        assert!(resolver.resolve("https://cdn.test/a.pdf", None).await.is_none());
        assert!(resolver.resolve("https://cdn.test/a.png", None).await.is_some());
        assert_eq!(store.documents("media").await.len(), 1);
    }

    struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn create(&self, _: &str, _: Record, _: Option<&str>) -> StoreResult<Record> {
            Err(StoreError::Rejected("read only".into()))
        }
        async fn update(&self, _: &str, _: &str, _: Record, _: Option<&str>) -> StoreResult<Record> {
            Err(StoreError::Rejected("read only".into()))
        }
        async fn find_by_id(&self, _: &str, _: &str, _: Option<&str>) -> StoreResult<Option<Record>> {
            Ok(None)
        }
        async fn find(&self, _: &str, _: &Query) -> StoreResult<FindResult> {
            Err(StoreError::Transport("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_none() {
        let resolver = StoreAssetResolver::new(&FailingStore, vec!["media".into()], media_config());
        assert!(resolver.resolve("https://cdn.test/a.png", None).await.is_none());
    }
}
