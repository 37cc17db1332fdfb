//! HTML to rich document conversion.
//!
//! [`MarkupConverter`] turns a practical subset of HTML into the Lexical JSON
//! document shape:
//!
//! ```text
//! { "root": { "type": "root", "children": [
//!     { "type": "paragraph", "children": [
//!         { "type": "text", "text": "Hello", "format": 1, .. } ] } ] } }
//! ```
//!
//! Supported: paragraphs, headings, block quotes, ordered and bullet lists,
//! line breaks, horizontal rules, links, inline formatting (bold, italic,
//! strikethrough, underline, code, subscript, superscript, highlight) and
//! character entities. Unknown inline tags keep their text; `script`,
//! `style` and `head` content is dropped. Unbalanced markup is an error.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::RichTextConverter;
use crate::error::RichTextError;

// Lexical text format bits.
const BOLD: u32 = 1;
const ITALIC: u32 = 1 << 1;
const STRIKETHROUGH: u32 = 1 << 2;
const UNDERLINE: u32 = 1 << 3;
const CODE: u32 = 1 << 4;
const SUBSCRIPT: u32 = 1 << 5;
const SUPERSCRIPT: u32 = 1 << 6;
const HIGHLIGHT: u32 = 1 << 7;

const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Converts HTML markup into a Lexical document.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupConverter;

impl MarkupConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert synchronously.
    pub fn convert_markup(&self, markup: &str) -> Result<Value, RichTextError> {
        let mut builder = Builder::new();
        for token in tokenize(markup)? {
            builder.push(token)?;
        }
        builder.finish()
    }
}

#[async_trait]
impl RichTextConverter for MarkupConverter {
    async fn convert(&self, markup: &str) -> Result<Value, RichTextError> {
        self.convert_markup(markup)
    }
}

/// Markup with every tag removed and surrounding whitespace trimmed.
///
/// Returns the input unchanged when nothing would be left.
pub fn strip_markup(markup: &str) -> String {
    let stripped = TAG.replace_all(markup, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        markup.to_string()
    } else {
        stripped.to_string()
    }
}

/// Single-paragraph document holding the markup's plain text.
pub fn fallback_document(markup: &str) -> Value {
    let paragraph = element("paragraph", vec![text_node(&strip_markup(markup), 0)]);
    root_document(vec![Value::Object(paragraph)])
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    Close(String),
}

fn tokenize(markup: &str) -> Result<Vec<Token>, RichTextError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while let Some(offset) = markup[pos..].find('<') {
        let start = pos + offset;
        let rest = &markup[start + 1..];

        let end = if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            let end = find_tag_end(markup, start)?;
            push_text(&mut tokens, &markup[text_start..start]);
            tokens.push(parse_open(&markup[start + 1..end]));
            end + 1
        } else if rest.starts_with('/') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            let end = start + markup[start..].find('>').ok_or(RichTextError::UnterminatedTag(start))?;
            push_text(&mut tokens, &markup[text_start..start]);
            let name = markup[start + 2..end].trim().to_ascii_lowercase();
            tokens.push(Token::Close(name));
            end + 1
        } else if rest.starts_with("!--") {
            let close = markup[start + 4..]
                .find("-->")
                .ok_or(RichTextError::UnterminatedTag(start))?;
            push_text(&mut tokens, &markup[text_start..start]);
            start + 4 + close + 3
        } else if rest.starts_with('!') || rest.starts_with('?') {
            let end = start + markup[start..].find('>').ok_or(RichTextError::UnterminatedTag(start))?;
            push_text(&mut tokens, &markup[text_start..start]);
            end + 1
        } else {
            // A lone `<` is text.
            pos = start + 1;
            continue;
        };

        pos = end;
        text_start = end;
    }

    push_text(&mut tokens, &markup[text_start..]);
    Ok(tokens)
}

fn push_text(tokens: &mut Vec<Token>, raw: &str) {
    if !raw.is_empty() {
        tokens.push(Token::Text(decode_entities(raw)));
    }
}

/// Position of the `>` closing the tag opened at `start`, skipping quoted values.
fn find_tag_end(markup: &str, start: usize) -> Result<usize, RichTextError> {
    let mut quote = None;
    for (i, c) in markup[start..].char_indices() {
        match (quote, c) {
            (None, '"') | (None, '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Ok(start + i),
            _ => {}
        }
    }
    Err(RichTextError::UnterminatedTag(start))
}

fn parse_open(inner: &str) -> Token {
    let inner = inner.trim_end();
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(inner) => (inner, true),
        None => (inner, false),
    };

    let name_end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(inner.len());

    Token::Open {
        name: inner[..name_end].to_ascii_lowercase(),
        attrs: parse_attributes(&inner[name_end..]),
        self_closing,
    }
}

fn parse_attributes(mut s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    loop {
        s = s.trim_start();
        if s.is_empty() {
            break;
        }

        let name_end = s
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(s.len());
        let name = s[..name_end].to_ascii_lowercase();
        s = s[name_end..].trim_start();

        let mut value = String::new();
        if let Some(rest) = s.strip_prefix('=') {
            let rest = rest.trim_start();
            match rest.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &rest[1..];
                    let end = body.find(q).unwrap_or(body.len());
                    value = decode_entities(&body[..end]);
                    s = body.get(end + 1..).unwrap_or("");
                }
                _ => {
                    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                    value = decode_entities(&rest[..end]);
                    s = &rest[end..];
                }
            }
        }

        if !name.is_empty() {
            attrs.push((name, value));
        }
    }
    attrs
}

/// Decode named and numeric character references.
fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest[1..]
            .char_indices()
            .take(10)
            .find(|&(_, c)| c == ';')
            .and_then(|(semi, _)| decode_entity(&rest[1..semi + 1]).map(|c| (c, semi + 2)));

        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

// =============================================================================
// Tree builder
// =============================================================================

#[derive(Debug)]
enum Kind {
    Root,
    /// Block-level wrapper whose inline runs become paragraphs.
    Section,
    Paragraph,
    Heading(String),
    Quote,
    List { ordered: bool, start: i64 },
    ListItem,
    Link { url: String, new_tab: bool },
    /// Formatting or unknown inline element.
    Inline,
    /// Element whose content is dropped.
    Skip,
}

#[derive(Debug)]
struct Frame {
    tag: String,
    kind: Kind,
    format: u32,
    children: Vec<Value>,
}

struct Builder {
    stack: Vec<Frame>,
    skipping: usize,
}

impl Builder {
    fn new() -> Self {
        Self {
            stack: vec![Frame {
                tag: String::new(),
                kind: Kind::Root,
                format: 0,
                children: Vec::new(),
            }],
            skipping: 0,
        }
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push(&mut self, token: Token) -> Result<(), RichTextError> {
        match token {
            Token::Text(text) => {
                if self.skipping == 0 {
                    self.push_text(&text);
                }
            }
            Token::Open { name, attrs, self_closing } => self.open(name, attrs, self_closing),
            Token::Close(name) => self.close(&name)?,
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        let frame = self.top();
        let mut text = collapse_whitespace(text);

        let previous_ends_in_space = frame
            .children
            .last()
            .and_then(|n| n.get("text"))
            .and_then(Value::as_str)
            .is_some_and(|t| t.ends_with(' '));
        if previous_ends_in_space && text.starts_with(' ') {
            text.remove(0);
        }

        if !text.is_empty() {
            let format = frame.format;
            frame.children.push(text_node(&text, format));
        }
    }

    fn open(&mut self, name: String, attrs: Vec<(String, String)>, self_closing: bool) {
        if self.skipping > 0 && !VOID_TAGS.contains(&name.as_str()) && !self_closing {
            self.skipping += usize::from(is_skipped(&name));
            self.stack.push(Frame { tag: name, kind: Kind::Skip, format: 0, children: Vec::new() });
            return;
        }

        match name.as_str() {
            "br" => {
                self.top().children.push(json!({ "type": "linebreak", "version": 1 }));
                return;
            }
            "hr" => {
                self.top().children.push(json!({ "type": "horizontalrule", "version": 1 }));
                return;
            }
            _ if VOID_TAGS.contains(&name.as_str()) || self_closing => return,
            _ => {}
        }

        let attr = |key: &str| {
            attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        let parent_format = self.top().format;
        let (kind, bits) = match name.as_str() {
            "p" => (Kind::Paragraph, 0),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => (Kind::Heading(name.clone()), 0),
            "blockquote" => (Kind::Quote, 0),
            "ul" | "ol" => (
                Kind::List {
                    ordered: name == "ol",
                    start: attr("start").and_then(|s| s.trim().parse().ok()).unwrap_or(1),
                },
                0,
            ),
            "li" => (Kind::ListItem, 0),
            "a" => (
                Kind::Link {
                    url: attr("href").unwrap_or_default(),
                    new_tab: attr("target").as_deref() == Some("_blank"),
                },
                0,
            ),
            "pre" => (Kind::Section, CODE),
            "div" | "section" | "article" | "header" | "footer" | "main" | "aside" | "nav"
            | "figure" | "figcaption" | "body" | "html" | "table" | "thead" | "tbody" | "tr"
            | "td" | "th" => (Kind::Section, 0),
            "b" | "strong" => (Kind::Inline, BOLD),
            "i" | "em" => (Kind::Inline, ITALIC),
            "s" | "strike" | "del" => (Kind::Inline, STRIKETHROUGH),
            "u" | "ins" => (Kind::Inline, UNDERLINE),
            "code" | "kbd" | "samp" => (Kind::Inline, CODE),
            "sub" => (Kind::Inline, SUBSCRIPT),
            "sup" => (Kind::Inline, SUPERSCRIPT),
            "mark" => (Kind::Inline, HIGHLIGHT),
            other if is_skipped(other) => {
                self.skipping += 1;
                (Kind::Skip, 0)
            }
            _ => (Kind::Inline, 0),
        };

        self.stack.push(Frame {
            tag: name,
            kind,
            format: parent_format | bits,
            children: Vec::new(),
        });
    }

    fn close(&mut self, name: &str) -> Result<(), RichTextError> {
        if VOID_TAGS.contains(&name) {
            return Ok(());
        }
        if self.stack.len() < 2 || self.top().tag != name {
            return Err(RichTextError::UnexpectedClosingTag { found: name.to_string() });
        }

        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };
        if is_skipped(&frame.tag) && self.skipping > 0 {
            self.skipping -= 1;
        }

        let nodes = frame.into_nodes();
        self.top().children.extend(nodes);
        Ok(())
    }

    fn finish(mut self) -> Result<Value, RichTextError> {
        if self.stack.len() > 1 {
            return Err(RichTextError::UnclosedTag(self.top().tag.clone()));
        }

        let root = self.stack.pop().map(|f| f.children).unwrap_or_default();
        let mut children = wrap_runs(root);
        if children.is_empty() {
            children.push(Value::Object(element("paragraph", Vec::new())));
        }
        Ok(root_document(children))
    }
}

impl Frame {
    /// Nodes this element contributes to its parent.
    fn into_nodes(self) -> Vec<Value> {
        let node = match self.kind {
            Kind::Root | Kind::Section => return wrap_runs(self.children),
            Kind::Inline => return self.children,
            Kind::Skip => return Vec::new(),
            Kind::Paragraph => element("paragraph", trim_inline(self.children)),
            Kind::Heading(tag) => {
                let mut node = element("heading", trim_inline(self.children));
                node.insert("tag".into(), Value::String(tag));
                node
            }
            Kind::Quote => element("quote", trim_inline(self.children)),
            Kind::ListItem => {
                let mut node = element("listitem", trim_inline(self.children));
                node.insert("value".into(), json!(1));
                node
            }
            Kind::List { ordered, start } => list_node(self.children, ordered, start),
            Kind::Link { url, new_tab } => {
                let mut node = element("link", self.children);
                node.insert("version".into(), json!(3));
                node.insert(
                    "fields".into(),
                    json!({ "url": url, "newTab": new_tab, "linkType": "custom" }),
                );
                node
            }
        };
        vec![Value::Object(node)]
    }
}

fn is_skipped(tag: &str) -> bool {
    matches!(tag, "head" | "script" | "style" | "title" | "template")
}

fn is_inline(node: &Value) -> bool {
    matches!(
        node.get("type").and_then(Value::as_str),
        Some("text") | Some("linebreak") | Some("link")
    )
}

/// Wrap runs of inline nodes in paragraphs, dropping whitespace-only runs.
fn wrap_runs(children: Vec<Value>) -> Vec<Value> {
    let mut blocks = Vec::new();
    let mut run = Vec::new();

    for child in children {
        if is_inline(&child) {
            run.push(child);
            continue;
        }
        flush_run(&mut run, &mut blocks);
        blocks.push(child);
    }
    flush_run(&mut run, &mut blocks);
    blocks
}

fn flush_run(run: &mut Vec<Value>, blocks: &mut Vec<Value>) {
    let inline = trim_inline(std::mem::take(run));
    if !inline.is_empty() {
        blocks.push(Value::Object(element("paragraph", inline)));
    }
}

fn list_node(children: Vec<Value>, ordered: bool, start: i64) -> Map<String, Value> {
    let mut items = Vec::new();
    let mut run = Vec::new();

    for child in children {
        if is_inline(&child) {
            run.push(child);
            continue;
        }
        let inline = trim_inline(std::mem::take(&mut run));
        if !inline.is_empty() {
            items.push(Value::Object(element("listitem", inline)));
        }
        items.push(child);
    }
    let inline = trim_inline(run);
    if !inline.is_empty() {
        items.push(Value::Object(element("listitem", inline)));
    }

    let mut value = start;
    for item in items.iter_mut() {
        if let Some(object) = item.as_object_mut() {
            if object.get("type").and_then(Value::as_str) == Some("listitem") {
                object.insert("value".into(), json!(value));
                value += 1;
            }
        }
    }

    let mut node = element("list", items);
    node.insert("listType".into(), json!(if ordered { "number" } else { "bullet" }));
    node.insert("start".into(), json!(start));
    node.insert("tag".into(), json!(if ordered { "ol" } else { "ul" }));
    node
}

/// Merge same-format text, then trim whitespace at both ends of the run.
fn trim_inline(children: Vec<Value>) -> Vec<Value> {
    let mut merged: Vec<Value> = Vec::with_capacity(children.len());
    for child in children {
        if let (Some(last), Some(text)) = (merged.last_mut(), child.get("text").and_then(Value::as_str)) {
            let same_format = last.get("type") == Some(&json!("text")) && last.get("format") == child.get("format");
            if same_format {
                let joined = format!("{}{}", last["text"].as_str().unwrap_or(""), text);
                last["text"] = Value::String(joined);
                continue;
            }
        }
        merged.push(child);
    }

    while let Some(text) = merged.first().and_then(|n| n.get("text")).and_then(Value::as_str) {
        let trimmed = text.trim_start_matches(' ').to_string();
        if trimmed.is_empty() {
            merged.remove(0);
        } else {
            merged[0]["text"] = Value::String(trimmed);
            break;
        }
    }
    while let Some(text) = merged.last().and_then(|n| n.get("text")).and_then(Value::as_str) {
        let trimmed = text.trim_end_matches(' ').to_string();
        let last = merged.len() - 1;
        if trimmed.is_empty() {
            merged.remove(last);
        } else {
            merged[last]["text"] = Value::String(trimmed);
            break;
        }
    }
    merged
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn element(node_type: &str, children: Vec<Value>) -> Map<String, Value> {
    let mut node = Map::new();
    node.insert("type".into(), json!(node_type));
    node.insert("children".into(), Value::Array(children));
    node.insert("direction".into(), json!("ltr"));
    node.insert("format".into(), json!(""));
    node.insert("indent".into(), json!(0));
    node.insert("version".into(), json!(1));
    node
}

fn text_node(text: &str, format: u32) -> Value {
    json!({
        "type": "text",
        "detail": 0,
        "format": format,
        "mode": "normal",
        "style": "",
        "text": text,
        "version": 1
    })
}

fn root_document(children: Vec<Value>) -> Value {
    json!({ "root": element("root", children) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(markup: &str) -> Value {
        MarkupConverter::new().convert_markup(markup).unwrap()
    }

    fn children(doc: &Value) -> &Vec<Value> {
        doc["root"]["children"].as_array().unwrap()
    }

    fn texts(node: &Value) -> Vec<(String, u64)> {
        node["children"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|n| n["type"] == "text")
            .map(|n| (n["text"].as_str().unwrap().to_string(), n["format"].as_u64().unwrap()))
            .collect()
    }

    #[test]
    fn test_paragraph_with_formatting() {
        let doc = convert("<p>Hello <b>bold</b> and <em><u>both</u></em></p>");
        let blocks = children(&doc);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["type"], "paragraph");
        assert_eq!(
            texts(&blocks[0]),
            vec![
                ("Hello ".to_string(), 0),
                ("bold".to_string(), BOLD as u64),
                (" and ".to_string(), 0),
                ("both".to_string(), (ITALIC | UNDERLINE) as u64),
            ]
        );
        assert_eq!(doc["root"]["type"], "root");
        assert_eq!(doc["root"]["direction"], "ltr");
    }

    #[test]
    fn test_block_elements() {
        let doc = convert("<h2>Title</h2>\n<blockquote>Quoted</blockquote><hr><p>a<br/>b</p>");
        let blocks = children(&doc);

        assert_eq!(blocks[0]["type"], "heading");
        assert_eq!(blocks[0]["tag"], "h2");
        assert_eq!(blocks[1]["type"], "quote");
        assert_eq!(blocks[2]["type"], "horizontalrule");
        assert_eq!(blocks[3]["children"][1]["type"], "linebreak");
        assert_eq!(blocks.len(), 4);
    }

    #[test]
    fn test_lists() {
        let doc = convert("<ol start=\"3\"><li>one</li>\n<li>two</li></ol><ul><li>x</li></ul>");
        let blocks = children(&doc);

        assert_eq!(blocks[0]["listType"], "number");
        assert_eq!(blocks[0]["tag"], "ol");
        assert_eq!(blocks[0]["children"][0]["value"], 3);
        assert_eq!(blocks[0]["children"][1]["value"], 4);
        assert_eq!(blocks[0]["children"].as_array().unwrap().len(), 2);
        assert_eq!(blocks[1]["listType"], "bullet");
    }

    #[test]
    fn test_link() {
        let doc = convert(r#"<p>See <a href="https://example.com/?a=1&amp;b=2" target="_blank">docs</a></p>"#);
        let link = &children(&doc)[0]["children"][1];

        assert_eq!(link["type"], "link");
        assert_eq!(link["version"], 3);
        assert_eq!(link["fields"]["url"], "https://example.com/?a=1&b=2");
        assert_eq!(link["fields"]["newTab"], true);
        assert_eq!(link["children"][0]["text"], "docs");
    }

    #[test]
    fn test_loose_text_and_divs_become_paragraphs() {
        let doc = convert("Intro <div>first</div><div><span>second</span></div>");
        let blocks = children(&doc);

        assert_eq!(blocks.len(), 3);
        assert_eq!(texts(&blocks[0]), vec![("Intro".to_string(), 0)]);
        assert_eq!(texts(&blocks[2]), vec![("second".to_string(), 0)]);
    }

    #[test]
    fn test_entities_comments_and_scripts() {
        let doc = convert("<p>a &lt; b &#38; c&#x21; &unknown;</p><!-- note --><script>alert(1)</script>");
        let blocks = children(&doc);

        assert_eq!(blocks.len(), 1);
        assert_eq!(texts(&blocks[0]), vec![("a < b & c! &unknown;".to_string(), 0)]);
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let doc = convert("<p>1 < 2</p>");
        assert_eq!(texts(&children(&doc)[0]), vec![("1 < 2".to_string(), 0)]);
    }

    #[test]
    fn test_unbalanced_markup_is_an_error() {
        let converter = MarkupConverter::new();
        assert_eq!(
            converter.convert_markup("<p><b>text</p></b>"),
            Err(RichTextError::UnexpectedClosingTag { found: "p".into() })
        );
        assert_eq!(converter.convert_markup("<p>open"), Err(RichTextError::UnclosedTag("p".into())));
        assert_eq!(converter.convert_markup("<p class=\"x"), Err(RichTextError::UnterminatedTag(0)));
        assert!(converter.convert_markup("</div>").is_err());
    }

    #[test]
    fn test_empty_markup_has_one_paragraph() {
        let doc = convert("<p></p>");
        assert_eq!(children(&doc).len(), 1);
        assert_eq!(children(&doc)[0]["children"], json!([]));

        let doc = convert("<!-- nothing -->");
        assert_eq!(children(&doc)[0]["type"], "paragraph");
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("  <p>Hello <b>world</b></p> "), "Hello world");
        assert_eq!(strip_markup("<br/>"), "<br/>");
    }

    #[test]
    fn test_fallback_document() {
        let doc = fallback_document("<p>Broken <b>markup</p>");
        assert_eq!(
            doc,
            json!({
                "root": {
                    "type": "root",
                    "children": [{
                        "type": "paragraph",
                        "children": [{
                            "type": "text",
                            "detail": 0,
                            "format": 0,
                            "mode": "normal",
                            "style": "",
                            "text": "Broken markup",
                            "version": 1
                        }],
                        "direction": "ltr",
                        "format": "",
                        "indent": 0,
                        "version": 1
                    }],
                    "direction": "ltr",
                    "format": "",
                    "indent": 0,
                    "version": 1
                }
            })
        );
    }
}
