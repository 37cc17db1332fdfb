//! Scalar coercion of text cells.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").unwrap());

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Numeric value of a string under loose numeric coercion.
///
/// Surrounding whitespace is ignored and blank text is zero. Accepts decimal
/// and exponent notation, `0x`/`0o`/`0b` literals and signed `Infinity`.
/// Returns `None` for anything else.
pub fn js_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }

    match text {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    let radix = match text.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &text[2..];
        if digits.is_empty() {
            return None;
        }
        return digits.chars().try_fold(0f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
        });
    }

    if DECIMAL.is_match(text) {
        text.parse::<f64>().ok()
    } else {
        None
    }
}

/// JSON number for `n`, integral when `n` is a whole number in the exact range.
pub fn number_value(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::Number(Number::from(n as i64)));
    }
    Number::from_f64(n).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_forms() {
        assert_eq!(js_number("42"), Some(42.0));
        assert_eq!(js_number("  -3.5 "), Some(-3.5));
        assert_eq!(js_number(".5"), Some(0.5));
        assert_eq!(js_number("5."), Some(5.0));
        assert_eq!(js_number("1e3"), Some(1000.0));
        assert_eq!(js_number(""), Some(0.0));
    }

    #[test]
    fn test_radix_and_infinity() {
        assert_eq!(js_number("0x1F"), Some(31.0));
        assert_eq!(js_number("0b101"), Some(5.0));
        assert_eq!(js_number("0o17"), Some(15.0));
        assert_eq!(js_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(js_number("0x"), None);
        assert_eq!(js_number("0xZZ"), None);
    }

    #[test]
    fn test_not_numbers() {
        assert_eq!(js_number("abc"), None);
        assert_eq!(js_number("12abc"), None);
        assert_eq!(js_number("1,5"), None);
        assert_eq!(js_number("NaN"), None);
        assert_eq!(js_number("1 2"), None);
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(30.0), Some(json!(30)));
        assert_eq!(number_value(-2.25), Some(json!(-2.25)));
        assert_eq!(number_value(f64::INFINITY), None);
        assert_eq!(number_value(1e300), Some(json!(1e300)));
    }
}
