//! Collection and field definitions.
//!
//! A collection's shape is a recursive tree of [`Field`] nodes:
//!
//! ```text
//! Field
//! ├── Leaf          value of one kind (text, number, select, upload, richText, ...)
//! ├── Group         nested object under `name`
//! ├── Array         list of objects under `name`
//! ├── Blocks        list of objects under `name`, shape picked by `blockType`
//! └── Tabs / Row / Collapsible
//!                   layout only, children live in the parent object
//! ```
//!
//! Definitions are loaded from a JSON document (`{"collections": [...]}`) that
//! is checked against the embedded `schemas/collections.schema.json` before it
//! is deserialized.

pub mod walker;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};

pub use walker::{walk_record, walk_schema, FieldPath, FieldVisitor, PathStep, BLOCK_TYPE_KEY};

// =============================================================================
// Field tree
// =============================================================================

/// A node of a collection's field tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawField")]
pub enum Field {
    /// A single value.
    Leaf(LeafField),
    /// A nested object.
    Group { name: String, fields: Vec<Field> },
    /// A list of objects sharing one shape.
    Array { name: String, fields: Vec<Field> },
    /// A list of objects, each shaped by the block its `blockType` names.
    Blocks { name: String, blocks: Vec<Block> },
    /// Layout: tabs whose fields live in the parent object.
    Tabs { tabs: Vec<Tab> },
    /// Layout: a row whose fields live in the parent object.
    Row { fields: Vec<Field> },
    /// Layout: a collapsible panel whose fields live in the parent object.
    Collapsible { fields: Vec<Field> },
}

impl Field {
    /// The record key this node occupies, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Field::Leaf(leaf) => Some(&leaf.name),
            Field::Group { name, .. } | Field::Array { name, .. } | Field::Blocks { name, .. } => {
                Some(name)
            }
            Field::Tabs { .. } | Field::Row { .. } | Field::Collapsible { .. } => None,
        }
    }
}

/// A field holding a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Allowed values for select and radio fields.
    pub options: Vec<SelectOption>,
    /// Target collections of relationship and upload fields.
    pub relation_to: Vec<String>,
    /// Whether the value is a list of values of `kind`.
    pub has_many: bool,
}

impl LeafField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            options: Vec::new(),
            relation_to: Vec::new(),
            has_many: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = values.into_iter().map(|v| SelectOption::Plain(v.into())).collect();
        self
    }

    pub fn relation_to<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relation_to = collections.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_many(mut self) -> Self {
        self.has_many = true;
        self
    }

    /// Option values, in declaration order.
    pub fn option_values(&self) -> Vec<&str> {
        self.options.iter().map(SelectOption::value).collect()
    }
}

impl From<LeafField> for Field {
    fn from(leaf: LeafField) -> Self {
        Field::Leaf(leaf)
    }
}

/// The declared kind of a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
    Checkbox,
    Date,
    Email,
    Select,
    Radio,
    Relationship,
    Upload,
    RichText,
    Json,
    Code,
    Point,
    /// Any kind this importer has no special handling for.
    Other(String),
}

impl FieldKind {
    pub fn from_type(field_type: &str) -> Self {
        match field_type {
            "text" => Self::Text,
            "textarea" => Self::Textarea,
            "number" => Self::Number,
            "checkbox" => Self::Checkbox,
            "date" => Self::Date,
            "email" => Self::Email,
            "select" => Self::Select,
            "radio" => Self::Radio,
            "relationship" => Self::Relationship,
            "upload" => Self::Upload,
            "richText" => Self::RichText,
            "json" => Self::Json,
            "code" => Self::Code,
            "point" => Self::Point,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A select option, either a bare value or a labelled one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SelectOption {
    Plain(String),
    Labeled {
        value: String,
        #[serde(default)]
        label: Option<Value>,
    },
}

impl SelectOption {
    pub fn value(&self) -> &str {
        match self {
            SelectOption::Plain(value) => value,
            SelectOption::Labeled { value, .. } => value,
        }
    }
}

/// One variant of a blocks field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Block {
    /// Value of `blockType` selecting this variant.
    pub slug: String,
    pub fields: Vec<Field>,
}

/// One tab of a tabs field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tab {
    #[serde(default)]
    pub label: Option<String>,
    pub fields: Vec<Field>,
}

/// Field definition as written in the collections document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    has_many: bool,
    #[serde(default)]
    options: Vec<SelectOption>,
    #[serde(default)]
    relation_to: Option<RelationTo>,
    #[serde(default)]
    fields: Option<Vec<Field>>,
    #[serde(default)]
    blocks: Option<Vec<Block>>,
    #[serde(default)]
    tabs: Option<Vec<Tab>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelationTo {
    One(String),
    Many(Vec<String>),
}

impl TryFrom<RawField> for Field {
    type Error = String;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let field_type = raw.field_type;
        let named = |name: Option<String>| {
            name.ok_or_else(|| format!("{} field requires a name", field_type))
        };

        let field = match field_type.as_str() {
            "group" => Field::Group {
                name: named(raw.name)?,
                fields: raw.fields.unwrap_or_default(),
            },
            "array" => Field::Array {
                name: named(raw.name)?,
                fields: raw.fields.unwrap_or_default(),
            },
            "blocks" => Field::Blocks {
                name: named(raw.name)?,
                blocks: raw.blocks.unwrap_or_default(),
            },
            "tabs" => Field::Tabs {
                tabs: raw.tabs.unwrap_or_default(),
            },
            "row" => Field::Row {
                fields: raw.fields.unwrap_or_default(),
            },
            "collapsible" => Field::Collapsible {
                fields: raw.fields.unwrap_or_default(),
            },
            other => Field::Leaf(LeafField {
                name: named(raw.name)?,
                kind: FieldKind::from_type(other),
                required: raw.required,
                options: raw.options,
                relation_to: match raw.relation_to {
                    Some(RelationTo::One(slug)) => vec![slug],
                    Some(RelationTo::Many(slugs)) => slugs,
                    None => Vec::new(),
                },
                has_many: raw.has_many,
            }),
        };

        Ok(field)
    }
}

// =============================================================================
// Collections
// =============================================================================

/// A collection: its slug, whether it stores assets, and its field tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionSchema {
    pub slug: String,
    /// Whether documents of this collection are uploaded assets.
    #[serde(default, deserialize_with = "deserialize_upload")]
    pub upload: bool,
    pub fields: Vec<Field>,
}

impl CollectionSchema {
    pub fn new(slug: impl Into<String>, fields: Vec<Field>) -> Self {
        Self { slug: slug.into(), upload: false, fields }
    }

    pub fn with_upload(mut self) -> Self {
        self.upload = true;
        self
    }
}

/// `upload` is either a flag or an upload options object.
fn deserialize_upload<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(flag) => flag,
        Value::Null => false,
        _ => true,
    })
}

#[derive(Debug, Deserialize)]
struct CollectionsDocument {
    collections: Vec<CollectionSchema>,
}

/// All collections known to an import.
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    collections: Vec<CollectionSchema>,
}

impl CollectionRegistry {
    /// Build a registry from already constructed collections.
    pub fn new(collections: Vec<CollectionSchema>) -> SchemaResult<Self> {
        let mut seen = HashSet::new();
        for collection in &collections {
            if !seen.insert(collection.slug.as_str()) {
                return Err(SchemaError::DuplicateCollection(collection.slug.clone()));
            }
        }
        Ok(Self { collections })
    }

    /// Parse and check a collections document.
    pub fn from_json(content: &str) -> SchemaResult<Self> {
        let document: Value = serde_json::from_str(content)?;
        check_document(&document).map_err(|errors| SchemaError::Invalid { errors })?;
        let parsed: CollectionsDocument =
            serde_json::from_value(document).map_err(|e| SchemaError::Field(e.to_string()))?;
        Self::new(parsed.collections)
    }

    /// Load a collections document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn get(&self, slug: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.slug == slug)
    }

    pub fn list(&self) -> &[CollectionSchema] {
        &self.collections
    }

    /// Slugs of collections that store assets, in declaration order.
    pub fn asset_collections(&self) -> Vec<String> {
        self.collections
            .iter()
            .filter(|c| c.upload)
            .map(|c| c.slug.clone())
            .collect()
    }
}

/// Check a collections document against the embedded JSON Schema.
fn check_document(document: &Value) -> Result<(), Vec<String>> {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/collections.schema.json"))
        .expect("Invalid embedded schema");
    let validator = jsonschema::draft7::new(&schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
