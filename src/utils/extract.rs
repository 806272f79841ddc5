//! Tolerant extraction of a JSON value embedded in model output.
//!
//! Models often wrap JSON in explanatory prose or a markdown fence, and
//! grounded (tool-using) requests cannot ask for schema-constrained output at
//! all. [`extract_json_text`] recovers the JSON span so the caller can parse it:
//!
//! 1. The content of a fenced block tagged exactly `json`, if there is one
//! 2. Otherwise the span from the first `{` to the last `}`, or from the first
//!    `[` to the last `]`. The object span wins unless the array span encloses
//!    it (an array of objects)
//! 3. Otherwise the input, unchanged, so the parse failure surfaces upstream
//!
//! This is a heuristic, not a parser. Braces or brackets inside string
//! literals in surrounding prose, or two unrelated JSON values in one reply,
//! can produce a span that does not parse; the caller reports that as
//! malformed output together with the raw text.

use regex::Regex;
use std::sync::OnceLock;

static JSON_FENCE: OnceLock<Option<Regex>> = OnceLock::new();

fn json_fence() -> Option<&'static Regex> {
    JSON_FENCE
        .get_or_init(|| Regex::new(r"(?is)```json\b[ \t]*\r?\n?(.*?)```").ok())
        .as_ref()
}

/// Locate the JSON value inside `text`
pub fn extract_json_text(text: &str) -> &str {
    if let Some(inner) = fenced_json(text) {
        return inner;
    }

    let object = delimited_span(text, '{', '}');
    let array = delimited_span(text, '[', ']');

    let span = match (object, array) {
        (Some(obj), Some(arr)) if arr.0 < obj.0 && arr.1 > obj.1 => Some(arr),
        (Some(obj), _) => Some(obj),
        (None, arr) => arr,
    };

    match span {
        Some((start, end)) => &text[start..=end],
        None => text,
    }
}

fn fenced_json(text: &str) -> Option<&str> {
    let captures = json_fence()?.captures(text)?;
    let inner = captures.get(1)?.as_str().trim();
    (!inner.is_empty()).then_some(inner)
}

/// Byte range from the first `open` to the last `close`, inclusive
fn delimited_span(text: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then_some((start, end))
}
