//! # docimport - schema-driven bulk import of CSV and JSON documents
//!
//! docimport takes a file of records, shapes every record after the field
//! tree of a target collection and writes the result into a document store.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐    ┌───────────┐    ┌───────────┐    ┌───────────┐    ┌───────────┐
//! │ CSV/JSON  │───▶│  Parser   │───▶│ Validator │───▶│ Transform │───▶│  Import   │───▶ store
//! │   file    │    │(unflatten)│    │ (schema)  │    │(rich text,│    │ (create / │
//! └───────────┘    └───────────┘    └───────────┘    │  assets)  │    │  update)  │
//!                                                    └───────────┘    └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docimport::{
//!     CollectionRegistry, DirStore, Importer, ImportOptions, InputFormat,
//!     MarkupConverter, MediaConfig, StoreAssetResolver,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = CollectionRegistry::from_file("collections.json")?;
//!     let store = DirStore::new(".docimport/store");
//!     let converter = MarkupConverter::new();
//!     let assets = StoreAssetResolver::new(&store, registry.asset_collections(), MediaConfig::default());
//!
//!     let bytes = std::fs::read("posts.csv")?;
//!     let result = Importer::new(&store, &converter, &assets)
//!         .import_bytes(&registry, "posts", &bytes, InputFormat::Csv, &ImportOptions::default())
//!         .await?;
//!     println!("{} created, {} updated", result.created, result.updated);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`logs`] - Broadcast logger
//! - [`config`] - Environment configuration
//! - [`schema`] - Collections, field tree and its walker
//! - [`parser`] - Decoding and key unflattening
//! - [`validation`] - Batch validation against a field tree
//! - [`transform`] - Rich-text and asset enrichment
//! - [`store`] - Document store port and adapters
//! - [`import`] - Import orchestration

use serde_json::{Map, Value};

// Core modules
pub mod config;
pub mod error;
pub mod logs;

// Schema
pub mod schema;

// Decoding
pub mod parser;

// Validation
pub mod validation;

// Enrichment
pub mod transform;

// Storage
pub mod store;

// Orchestration
pub mod import;

/// A JSON object record.
pub type Record = Map<String, Value>;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    DecodeError,
    FieldError,
    ImportError,
    RichTextError,
    SchemaError,
    StoreError,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{ImportConfig, MediaConfig};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{
    CollectionRegistry,
    CollectionSchema,
    Field,
    FieldKind,
    LeafField,
    FieldPath,
    FieldVisitor,
    walk_record,
    walk_schema,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_bytes,
    decode_file,
    decode_records,
    preview,
    unflatten,
    InputFormat,
    ParseResult,
    Preview,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{field_paths, validate, SchemaPaths, ValidationResult};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    AssetResolver,
    ContentTransformer,
    MarkupConverter,
    RichTextConverter,
    StoreAssetResolver,
};

// =============================================================================
// Re-exports - Store
// =============================================================================

pub use store::{DirStore, DocumentStore, HttpStore, MemoryStore, Query, Where};

// =============================================================================
// Re-exports - Import
// =============================================================================

pub use import::{
    ImportOptions,
    ImportResult,
    ImportStatus,
    Importer,
    RowError,
};
