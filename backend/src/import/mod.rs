//! Import orchestration.
//!
//! ```text
//! records ──▶ validate ──▶ transform ──▶ for each record, in order:
//!             (abort on     (rich text,    strip nested ids
//!              any error)    assets)       find existing (overwrite only)
//!                                          update or create
//!                                          fold outcome into ImportResult
//! ```
//!
//! A failed write never stops the run; it becomes a [`RowError`] and the
//! next record is processed.

pub mod ids;
pub mod result;

use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use crate::error::{ImportError, RunResult, StoreResult};
use crate::logs::{log_debug, log_entry, log_error, log_info, log_success, log_warning, LogEntry};
use crate::parser::{decode_records, InputFormat};
use crate::schema::{CollectionRegistry, CollectionSchema};
use crate::store::DocumentStore;
use crate::transform::{AssetResolver, ContentTransformer, RichTextConverter};
use crate::validation::validate;
use crate::Record;

pub use ids::strip_nested_ids;
pub use result::{ImportResult, ImportStatus, RowError, RowOutcome};

/// Locale used when nothing else names one.
pub const FALLBACK_LOCALE: &str = "en";

/// Progress is logged every this many rows in debug mode.
const PROGRESS_INTERVAL: usize = 100;

/// Options of one import run
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Update documents whose `id` already exists instead of creating new ones
    pub overwrite_existing: bool,
    /// Locale for this run
    pub locale: Option<String>,
    /// Locale of the surrounding request, used when `locale` is unset
    pub request_locale: Option<String>,
    /// Progress and per-row error logging
    pub debug: bool,
}

/// Pick the write locale: run, then request, then store default, then `en`.
pub fn resolve_locale(options: &ImportOptions, store: &dyn DocumentStore) -> String {
    options
        .locale
        .as_deref()
        .or(options.request_locale.as_deref())
        .or_else(|| store.default_locale())
        .unwrap_or(FALLBACK_LOCALE)
        .to_string()
}

/// The top-level id of a record, when it can address a document.
fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) if id.as_f64() != Some(0.0) => Some(id.to_string()),
        _ => None,
    }
}

/// Runs imports against a store with the given enrichment ports.
pub struct Importer<'a> {
    store: &'a dyn DocumentStore,
    converter: &'a dyn RichTextConverter,
    assets: &'a dyn AssetResolver,
}

impl<'a> Importer<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        converter: &'a dyn RichTextConverter,
        assets: &'a dyn AssetResolver,
    ) -> Self {
        Self { store, converter, assets }
    }

    /// Decode `bytes` and import them into the collection `slug`.
    pub async fn import_bytes(
        &self,
        registry: &CollectionRegistry,
        slug: &str,
        bytes: &[u8],
        format: InputFormat,
        options: &ImportOptions,
    ) -> RunResult<ImportResult> {
        let collection = registry
            .get(slug)
            .ok_or_else(|| ImportError::UnknownCollection(slug.to_string()))?;
        let records = decode_records(bytes, format)?;
        if options.debug {
            log_debug(format!("Parsed {} records for import", records.len()));
        }
        self.run(collection, records, options).await
    }

    /// Validate, transform and write a batch of records.
    ///
    /// Fails only when validation rejects the batch, in which case nothing
    /// is written.
    pub async fn run(
        &self,
        collection: &CollectionSchema,
        records: Vec<Value>,
        options: &ImportOptions,
    ) -> RunResult<ImportResult> {
        let slug = collection.slug.as_str();
        let locale = resolve_locale(options, self.store);
        if options.debug {
            log_entry(
                LogEntry::debug("Starting import").with_context(json!({
                    "collection": slug,
                    "records": records.len(),
                    "overwriteExisting": options.overwrite_existing,
                    "locale": locale,
                })),
            );
        }

        // Validation
        let validation = validate(&collection.fields, &records);
        for warning in &validation.warnings {
            log_warning(warning.as_str());
        }
        if !validation.is_valid {
            log_error(format!(
                "Import into '{}' rejected: {} validation errors",
                slug,
                validation.errors.len()
            ));
            return Err(ImportError::Validation { errors: validation.errors });
        }

        // Enrichment
        let transformer = ContentTransformer::new(self.converter, self.assets);
        let records = transformer.transform(&collection.fields, records).await;

        // Writes
        log_info(format!("Importing {} records into '{}'", records.len(), slug));
        let total = records.len();
        let overwrite = options.overwrite_existing;
        let debug = options.debug;
        let locale = locale.as_str();

        let result = stream::iter(records.into_iter().enumerate())
            .then(move |(index, record)| async move {
                let row = index + 1;
                (row, self.write_row(slug, record, row, overwrite, locale).await)
            })
            .fold(ImportResult::default(), move |result, (row, outcome)| async move {
                if debug {
                    if let RowOutcome::Failed(error) = &outcome {
                        log_entry(
                            LogEntry::error(error.summary())
                                .with_context(json!({ "rowIndex": row, "error": error })),
                        );
                    }
                    if row % PROGRESS_INTERVAL == 0 {
                        log_debug(format!("Processed {} of {} records", row, total));
                    }
                }
                result.tally(outcome)
            })
            .await;

        if result.errors.is_empty() {
            log_success(format!(
                "Import into '{}' completed: {} created, {} updated",
                slug, result.created, result.updated
            ));
        } else {
            log_warning(format!(
                "Import into '{}' completed with {} errors: {} created, {} updated",
                slug,
                result.errors.len(),
                result.created,
                result.updated
            ));
        }

        Ok(result)
    }

    async fn write_row(
        &self,
        slug: &str,
        record: Value,
        row: usize,
        overwrite: bool,
        locale: &str,
    ) -> RowOutcome {
        let Value::Object(record) = record else {
            return RowOutcome::Failed(RowError::new(row, "Record must be an object"));
        };

        match self.write(slug, strip_nested_ids(record), overwrite, locale).await {
            Ok(outcome) => outcome,
            Err(e) => RowOutcome::Failed(RowError::from_store_error(&e, row)),
        }
    }

    async fn write(
        &self,
        slug: &str,
        mut record: Record,
        overwrite: bool,
        locale: &str,
    ) -> StoreResult<RowOutcome> {
        if let Some(id) = record_id(&record).filter(|_| overwrite) {
            let existing = match self.store.find_by_id(&id, slug, Some(locale)).await {
                Ok(doc) => doc,
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e),
            };
            if existing.is_some() {
                self.store.update(&id, slug, record, Some(locale)).await?;
                return Ok(RowOutcome::Updated);
            }
        }

        record.remove("id");
        self.store.create(slug, record, Some(locale)).await?;
        Ok(RowOutcome::Created)
    }
}
