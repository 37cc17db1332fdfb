//! Document store port and its adapters.
//!
//! The importer only talks to [`DocumentStore`]. Three implementations:
//!
//! - [`DirStore`] - JSON documents on disk, one directory per collection
//! - [`HttpStore`] - REST client for a remote document API
//! - [`MemoryStore`] - in-process store for dry runs

pub mod dir;
pub mod http;
pub mod memory;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::Record;

pub use dir::DirStore;
pub use http::HttpStore;
pub use memory::MemoryStore;

/// A stored document.
pub type Document = Record;

/// Documents matched by a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindResult {
    pub docs: Vec<Document>,
}

/// The `id` of a document as text.
pub fn document_id(doc: &Document) -> Option<String> {
    match doc.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Filter of a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    /// Field (dotted path) equals a value.
    Equals { field: String, value: Value },
    /// Any clause matches.
    Or(Vec<Where>),
    /// Every clause matches.
    And(Vec<Where>),
}

impl Where {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Where::Equals { field: field.into(), value: value.into() }
    }

    pub fn or(clauses: Vec<Where>) -> Self {
        Where::Or(clauses)
    }

    pub fn and(clauses: Vec<Where>) -> Self {
        Where::And(clauses)
    }

    /// Evaluate against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Where::Equals { field, value } => lookup(doc, field) == Some(value),
            Where::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
            Where::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
        }
    }

    /// Bracketed query-string pairs, e.g. `where[or][0][url][equals]`.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        self.push_pairs("where", &mut pairs);
        pairs
    }

    fn push_pairs(&self, prefix: &str, pairs: &mut Vec<(String, String)>) {
        match self {
            Where::Equals { field, value } => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                pairs.push((format!("{}[{}][equals]", prefix, field), text));
            }
            Where::Or(clauses) | Where::And(clauses) => {
                let op = if matches!(self, Where::Or(_)) { "or" } else { "and" };
                for (i, clause) in clauses.iter().enumerate() {
                    clause.push_pairs(&format!("{}[{}][{}]", prefix, op, i), pairs);
                }
            }
        }
    }
}

fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// A find request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Where>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Where) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter and truncate documents in order.
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        docs.into_iter()
            .filter(|doc| self.filter.as_ref().map_or(true, |f| f.matches(doc)))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Persistence port of the importer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document and return it as stored.
    async fn create(&self, collection: &str, data: Record, locale: Option<&str>) -> StoreResult<Document>;

    /// Merge `data` into an existing document and return the result.
    async fn update(
        &self,
        id: &str,
        collection: &str,
        data: Record,
        locale: Option<&str>,
    ) -> StoreResult<Document>;

    /// Look a document up by id. A missing document is `Ok(None)`.
    async fn find_by_id(
        &self,
        id: &str,
        collection: &str,
        locale: Option<&str>,
    ) -> StoreResult<Option<Document>>;

    /// Find documents matching a query.
    async fn find(&self, collection: &str, query: &Query) -> StoreResult<FindResult>;

    /// Locale used when a write names none.
    fn default_locale(&self) -> Option<&str> {
        None
    }
}

/// Stamp a new document with a generated id and timestamps.
pub(crate) fn stamp_new(mut data: Record) -> Document {
    let now = Utc::now().to_rfc3339();
    data.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    data.insert("createdAt".into(), Value::String(now.clone()));
    data.insert("updatedAt".into(), Value::String(now));
    data
}

/// Merge changes into a stored document, keeping its id and creation time.
pub(crate) fn merge_update(mut doc: Document, data: Record) -> Document {
    for (key, value) in data {
        if key == "id" || key == "createdAt" {
            continue;
        }
        doc.insert(key, value);
    }
    doc.insert("updatedAt".into(), Value::String(Utc::now().to_rfc3339()));
    doc
}
