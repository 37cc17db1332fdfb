//! Input decoding: uploaded bytes to records.
//!
//! CSV is decoded with encoding and delimiter auto-detection, one flat object
//! per row keyed by header. JSON input must be a top-level array. Both paths
//! end in [`decode_records`], which also rebuilds nested CSV rows with
//! [`unflatten::unflatten`].

pub mod coerce;
pub mod unflatten;

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use std::str::FromStr;

use crate::error::{DecodeError, DecodeResult};

pub use unflatten::{coerce_cell, unflatten, KEY_DELIMITER};

/// Rows shown by [`preview`].
pub const PREVIEW_ROWS: usize = 10;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Format implied by a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> DecodeResult<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| DecodeError::UnknownFormat(path.display().to_string()))?
            .parse()
    }
}

impl FromStr for InputFormat {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(DecodeError::UnknownFormat(other.to_string())),
        }
    }
}

/// Result of decoding with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Decoded rows, flat for CSV
    pub records: Vec<Value>,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter (CSV only)
    pub delimiter: Option<char>,
    /// Column headers (CSV only)
    pub headers: Vec<String>,
    pub format: InputFormat,
}

/// First rows of an upload plus the total row count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub format: InputFormat,
    pub rows: Vec<Value>,
    pub total: usize,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding.
///
/// A leading byte order mark is dropped. Labels unknown to `encoding_rs`
/// fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> DecodeResult<String> {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "utf-8-sig" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(decoder) => {
                let (text, _, had_errors) = decoder.decode(bytes);
                if had_errors {
                    return Err(DecodeError::Encoding(format!("invalid {} input", label)));
                }
                text.into_owned()
            }
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}

/// Detect the delimiter by counting occurrences in the header line.
///
/// Defaults to `,` when no candidate occurs.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best = (',', 0);
    for sep in [',', ';', '\t', '|'] {
        let count = first_line.matches(sep).count();
        if count > best.1 {
            best = (sep, count);
        }
    }
    best.0
}

/// Parse CSV text into flat objects keyed by header.
///
/// Cells are trimmed, short rows are padded with empty strings, extra cells
/// are ignored and blank rows are skipped.
pub fn parse_csv(content: &str, delimiter: char) -> DecodeResult<(Vec<String>, Vec<Value>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(DecodeError::Empty);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        if row.iter().all(str::is_empty) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = row.get(i).unwrap_or("");
            obj.insert(header.clone(), Value::String(cell.to_string()));
        }
        records.push(Value::Object(obj));
    }

    Ok((headers, records))
}

fn csv_error(e: csv::Error) -> DecodeError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    DecodeError::Csv { line, message: e.to_string() }
}

/// Parse JSON text whose top level must be an array.
pub fn parse_json(content: &str) -> DecodeResult<Vec<Value>> {
    match serde_json::from_str::<Value>(content)? {
        Value::Array(items) => Ok(items),
        _ => Err(DecodeError::NotAnArray),
    }
}

/// Decode bytes in the given format, leaving CSV rows flat.
pub fn decode_bytes(bytes: &[u8], format: InputFormat) -> DecodeResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;

    match format {
        InputFormat::Csv => {
            let delimiter = detect_delimiter(&content);
            let (headers, records) = parse_csv(&content, delimiter)?;
            Ok(ParseResult {
                records,
                encoding,
                delimiter: Some(delimiter),
                headers,
                format,
            })
        }
        InputFormat::Json => Ok(ParseResult {
            records: parse_json(&content)?,
            encoding,
            delimiter: None,
            headers: Vec::new(),
            format,
        }),
    }
}

/// Read and decode a file. The format defaults to the file extension.
pub fn decode_file(path: impl AsRef<Path>, format: Option<InputFormat>) -> DecodeResult<ParseResult> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => InputFormat::from_path(path)?,
    };
    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes, format)
}

/// Decode bytes into import records.
///
/// CSV rows are unflattened one record at a time; JSON records are returned
/// as they are.
pub fn decode_records(bytes: &[u8], format: InputFormat) -> DecodeResult<Vec<Value>> {
    let parsed = decode_bytes(bytes, format)?;
    Ok(nest_records(parsed))
}

fn nest_records(parsed: ParseResult) -> Vec<Value> {
    match parsed.format {
        InputFormat::Csv => parsed
            .records
            .into_iter()
            .map(|row| match row {
                Value::Object(flat) => Value::Object(unflatten(flat)),
                other => other,
            })
            .collect(),
        InputFormat::Json => parsed.records,
    }
}

/// First [`PREVIEW_ROWS`] decoded records and the total count.
pub fn preview(bytes: &[u8], format: InputFormat) -> DecodeResult<Preview> {
    let records = decode_records(bytes, format)?;
    let total = records.len();
    Ok(Preview {
        format,
        rows: records.into_iter().take(PREVIEW_ROWS).collect(),
        total,
    })
}
