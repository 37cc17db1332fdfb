//! Generic traversal of a field tree.
//!
//! Validation, path listing and content transformation all walk the tree the
//! same way; they only differ in what they do at a leaf. The traversal lives
//! here once and calls a [`FieldVisitor`] for every leaf in scope.
//!
//! Two entry points:
//!
//! - [`walk_schema`] visits every leaf of the tree once, without data. Paths
//!   are logical (`layout.cta.label` for a leaf of block `cta`).
//! - [`walk_record`] follows a record: groups descend into their object,
//!   arrays into each object element, blocks into each element whose
//!   `blockType` names a known block. Paths are concrete (`layout[2].label`).
//!
//! Tabs, rows and collapsibles are transparent in both: their fields are
//! visited against the same object as their siblings.

use serde_json::Value;
use std::fmt;

use super::{Field, LeafField};
use crate::Record;

/// Key holding a block element's discriminator.
pub const BLOCK_TYPE_KEY: &str = "blockType";

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Object key.
    Key(String),
    /// Array position, only in record walks.
    Index(usize),
    /// Block variant, only in schema walks.
    Block(String),
}

/// Location of a field, either logical (schema walk) or concrete (record walk).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    steps: Vec<PathStep>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn key(&self, name: &str) -> Self {
        self.with(PathStep::Key(name.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.with(PathStep::Index(index))
    }

    pub fn block(&self, slug: &str) -> Self {
        self.with(PathStep::Block(slug.to_string()))
    }

    fn with(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// JSON pointer (RFC 6901) to the value inside the walked record.
    ///
    /// Block steps carry no position and are skipped.
    pub fn pointer(&self) -> String {
        let mut pointer = String::new();
        for step in &self.steps {
            match step {
                PathStep::Key(key) => {
                    pointer.push('/');
                    pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
                }
                PathStep::Index(index) => {
                    pointer.push('/');
                    pointer.push_str(&index.to_string());
                }
                PathStep::Block(_) => {}
            }
        }
        pointer
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Key(key) | PathStep::Block(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathStep::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Callbacks of a field tree traversal.
pub trait FieldVisitor<'s> {
    /// Called for every leaf in scope.
    ///
    /// `value` is `None` when the object has no entry for the leaf, and always
    /// `None` in a schema walk.
    fn leaf(&mut self, field: &'s LeafField, path: &FieldPath, value: Option<&Value>);

    /// Called for every named container, before its fields.
    fn container(&mut self, _field: &'s Field, _path: &FieldPath) {}
}

/// Visit every leaf of `fields` once, without data.
pub fn walk_schema<'s, V: FieldVisitor<'s>>(fields: &'s [Field], visitor: &mut V) {
    visit_schema(fields, &FieldPath::root(), visitor);
}

fn visit_schema<'s, V: FieldVisitor<'s>>(fields: &'s [Field], at: &FieldPath, visitor: &mut V) {
    for field in fields {
        match field {
            Field::Leaf(leaf) => visitor.leaf(leaf, &at.key(&leaf.name), None),
            Field::Group { name, fields } | Field::Array { name, fields } => {
                let path = at.key(name);
                visitor.container(field, &path);
                visit_schema(fields, &path, visitor);
            }
            Field::Blocks { name, blocks } => {
                let path = at.key(name);
                visitor.container(field, &path);
                for block in blocks {
                    visit_schema(&block.fields, &path.block(&block.slug), visitor);
                }
            }
            Field::Tabs { tabs } => {
                for tab in tabs {
                    visit_schema(&tab.fields, at, visitor);
                }
            }
            Field::Row { fields } | Field::Collapsible { fields } => {
                visit_schema(fields, at, visitor);
            }
        }
    }
}

/// Visit the leaves of `fields` against `record`.
///
/// A missing or null group is walked as an empty object, so its leaves are
/// still visited (with no value). Arrays and blocks only contribute the
/// elements actually present; block elements with an unknown `blockType` are
/// skipped.
pub fn walk_record<'s, V: FieldVisitor<'s>>(fields: &'s [Field], record: &Record, visitor: &mut V) {
    visit_record(fields, record, &FieldPath::root(), visitor);
}

fn visit_record<'s, V: FieldVisitor<'s>>(
    fields: &'s [Field],
    data: &Record,
    at: &FieldPath,
    visitor: &mut V,
) {
    for field in fields {
        match field {
            Field::Leaf(leaf) => visitor.leaf(leaf, &at.key(&leaf.name), data.get(&leaf.name)),
            Field::Group { name, fields } => {
                let path = at.key(name);
                visitor.container(field, &path);
                match data.get(name) {
                    Some(Value::Object(object)) => visit_record(fields, object, &path, visitor),
                    None | Some(Value::Null) => visit_record(fields, &Record::new(), &path, visitor),
                    Some(_) => {}
                }
            }
            Field::Array { name, fields } => {
                let path = at.key(name);
                visitor.container(field, &path);
                if let Some(Value::Array(items)) = data.get(name) {
                    for (index, item) in items.iter().enumerate() {
                        if let Value::Object(object) = item {
                            visit_record(fields, object, &path.index(index), visitor);
                        }
                    }
                }
            }
            Field::Blocks { name, blocks } => {
                let path = at.key(name);
                visitor.container(field, &path);
                if let Some(Value::Array(items)) = data.get(name) {
                    for (index, item) in items.iter().enumerate() {
                        let Value::Object(object) = item else { continue };
                        let block = object
                            .get(BLOCK_TYPE_KEY)
                            .and_then(Value::as_str)
                            .and_then(|slug| blocks.iter().find(|b| b.slug == slug));
                        if let Some(block) = block {
                            visit_record(&block.fields, object, &path.index(index), visitor);
                        }
                    }
                }
            }
            Field::Tabs { tabs } => {
                for tab in tabs {
                    visit_record(&tab.fields, data, at, visitor);
                }
            }
            Field::Row { fields } | Field::Collapsible { fields } => {
                visit_record(fields, data, at, visitor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Block, FieldKind, Tab};
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        leaves: Vec<(String, Option<Value>)>,
        containers: Vec<String>,
    }

    impl<'s> FieldVisitor<'s> for Recorder {
        fn leaf(&mut self, _field: &'s LeafField, path: &FieldPath, value: Option<&Value>) {
            self.leaves.push((path.to_string(), value.cloned()));
        }

        fn container(&mut self, _field: &'s Field, path: &FieldPath) {
            self.containers.push(path.to_string());
        }
    }

    fn text(name: &str) -> Field {
        LeafField::new(name, FieldKind::Text).into()
    }

    fn fields() -> Vec<Field> {
        vec![
            text("title"),
            Field::Group { name: "meta".into(), fields: vec![text("description")] },
            Field::Array { name: "items".into(), fields: vec![text("label")] },
            Field::Blocks {
                name: "layout".into(),
                blocks: vec![Block { slug: "cta".into(), fields: vec![text("button")] }],
            },
            Field::Tabs {
                tabs: vec![
                    Tab { label: Some("One".into()), fields: vec![text("first")] },
                    Tab { label: None, fields: vec![Field::Row { fields: vec![text("second")] }] },
                ],
            },
            Field::Collapsible { fields: vec![text("third")] },
        ]
    }

    #[test]
    fn test_schema_walk_paths() {
        let fields = fields();
        let mut recorder = Recorder::default();
        walk_schema(&fields, &mut recorder);

        let paths: Vec<&str> = recorder.leaves.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec!["title", "meta.description", "items.label", "layout.cta.button", "first", "second", "third"]
        );
        assert_eq!(recorder.containers, vec!["meta", "items", "layout"]);
    }

    #[test]
    fn test_record_walk_follows_data() {
        let fields = fields();
        let record = json!({
            "title": "Hello",
            "items": [{ "label": "a" }, "not an object", { "label": "c" }],
            "layout": [{ "blockType": "cta", "button": "Go" }, { "blockType": "unknown", "button": "x" }],
            "second": 2
        });
        let mut recorder = Recorder::default();
        walk_record(&fields, record.as_object().unwrap(), &mut recorder);

        assert_eq!(
            recorder.leaves,
            vec![
                ("title".to_string(), Some(json!("Hello"))),
                ("meta.description".to_string(), None),
                ("items[0].label".to_string(), Some(json!("a"))),
                ("items[2].label".to_string(), Some(json!("c"))),
                ("layout[0].button".to_string(), Some(json!("Go"))),
                ("first".to_string(), None),
                ("second".to_string(), Some(json!(2))),
                ("third".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_group_with_scalar_value_is_not_entered() {
        let fields = fields();
        let record = json!({ "meta": "flat" });
        let mut recorder = Recorder::default();
        walk_record(&fields, record.as_object().unwrap(), &mut recorder);
        assert!(!recorder.leaves.iter().any(|(p, _)| p.starts_with("meta")));
    }

    #[test]
    fn test_pointer_escaping() {
        let path = FieldPath::root().key("a/b").index(3).key("c~d");
        assert_eq!(path.pointer(), "/a~1b/3/c~0d");
        assert_eq!(path.to_string(), "a/b[3].c~d");

        let logical = FieldPath::root().key("layout").block("cta").key("button");
        assert_eq!(logical.pointer(), "/layout/button");
    }
}
