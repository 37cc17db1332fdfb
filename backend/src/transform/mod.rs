//! Content transformation.
//!
//! Walks each record with its collection's field tree and enriches the
//! values whose kind needs it:
//!
//! - `richText` leaves holding markup become rich documents
//! - `relationship` / `upload` leaves holding a URL become asset ids
//!
//! Both enrichments go through injected ports ([`RichTextConverter`],
//! [`AssetResolver`]) and never fail a record: conversion errors fall back to
//! a plain-text document, unresolved assets become `null`. Records are
//! processed one after another so a URL seen twice resolves to one asset.

pub mod assets;
pub mod richtext;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::RichTextError;
use crate::logs::{log_entry, LogEntry};
use crate::schema::{walk_record, Field, FieldKind, FieldPath, FieldVisitor, LeafField};

pub use assets::{filename_from_url, mime_type_for, StoreAssetResolver};
pub use richtext::{fallback_document, strip_markup, MarkupConverter};

/// Converts markup into a rich document.
#[async_trait]
pub trait RichTextConverter: Send + Sync {
    async fn convert(&self, markup: &str) -> Result<Value, RichTextError>;
}

/// Turns asset URLs into asset document ids.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Whether documents of `slug` are assets.
    fn is_asset_collection(&self, slug: &str) -> bool;

    /// Id of the asset for `url`, or `None` when no reference can be made.
    ///
    /// `target` is the asset collection the field points at, if known.
    async fn resolve(&self, url: &str, target: Option<&str>) -> Option<String>;
}

/// An enrichment found while walking a record.
#[derive(Debug)]
enum Pending {
    RichText { markup: String },
    Asset { url: String, target: Option<String> },
}

/// Enrichments of one record, addressed by JSON pointer.
struct Collector<'a> {
    assets: &'a dyn AssetResolver,
    pending: Vec<(String, FieldPath, Pending)>,
}

impl<'s> FieldVisitor<'s> for Collector<'_> {
    fn leaf(&mut self, field: &'s LeafField, path: &FieldPath, value: Option<&Value>) {
        let Some(Value::String(text)) = value else {
            return;
        };

        let pending = match field.kind {
            FieldKind::RichText if text.contains('<') => Pending::RichText { markup: text.clone() },
            FieldKind::Relationship | FieldKind::Upload if is_url(text) => {
                let target = field
                    .relation_to
                    .iter()
                    .find(|slug| self.assets.is_asset_collection(slug))
                    .cloned();
                if target.is_none() && field.kind == FieldKind::Relationship {
                    return;
                }
                Pending::Asset { url: text.clone(), target }
            }
            _ => return,
        };

        self.pending.push((path.pointer(), path.clone(), pending));
    }
}

fn is_url(text: &str) -> bool {
    text.starts_with("http") || text.starts_with('/')
}

/// Applies rich-text and asset enrichments across records.
pub struct ContentTransformer<'a> {
    converter: &'a dyn RichTextConverter,
    assets: &'a dyn AssetResolver,
}

impl<'a> ContentTransformer<'a> {
    pub fn new(converter: &'a dyn RichTextConverter, assets: &'a dyn AssetResolver) -> Self {
        Self { converter, assets }
    }

    /// Transform a batch, preserving order.
    pub async fn transform(&self, fields: &[Field], records: Vec<Value>) -> Vec<Value> {
        let mut transformed = Vec::with_capacity(records.len());
        for record in records {
            transformed.push(self.transform_record(fields, record).await);
        }
        transformed
    }

    /// Transform one record. Non-object values are returned unchanged.
    pub async fn transform_record(&self, fields: &[Field], record: Value) -> Value {
        let Value::Object(object) = record else {
            return record;
        };

        let mut collector = Collector { assets: self.assets, pending: Vec::new() };
        walk_record(fields, &object, &mut collector);

        let mut record = Value::Object(object);
        for (pointer, path, pending) in collector.pending {
            let value = self.enrich(&path, pending).await;
            if let Some(slot) = record.pointer_mut(&pointer) {
                *slot = value;
            }
        }
        record
    }

    async fn enrich(&self, path: &FieldPath, pending: Pending) -> Value {
        match pending {
            Pending::RichText { markup } => match self.converter.convert(&markup).await {
                Ok(document) => document,
                Err(e) => {
                    log_entry(
                        LogEntry::warning(format!("Failed to convert HTML to rich text for field: {}", path))
                            .with_context(json!({ "field": path.to_string(), "error": e.to_string() })),
                    );
                    fallback_document(&markup)
                }
            },
            Pending::Asset { url, target } => self
                .assets
                .resolve(&url, target.as_deref())
                .await
                .map(Value::String)
                .unwrap_or(Value::Null),
        }
    }
}
