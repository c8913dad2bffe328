//! Recovery of search results from free-form completion text.
//!
//! Models are asked for a bare JSON array but regularly wrap it in prose or
//! code fences, or break the JSON in small ways. [`extract_results`] runs an
//! ordered list of parse strategies over a sanitized copy of the text and
//! keeps the first value that parses. It never fails: when nothing usable is
//! found the result is an empty vector.

use crate::types::SearchResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use tracing::{debug, error, instrument, trace};

/// The first `[ { ... } ]` span, shortest match.
static ARRAY_OF_OBJECTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[\s*\{.*?\}\s*\]").expect("Invalid array regex"));

/// Whitespace after `{`, `[` or `,` when followed by a quote or word character.
static STRUCTURAL_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([{\[,])\s*(["A-Za-z0-9_])"#).expect("Invalid compact regex"));

/// Spans tried by the pattern strategy, in order.
static SPAN_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(?s)\[\{.*?\}\]").expect("Invalid span regex"),
        Regex::new(r"(?s)\{.*?\}").expect("Invalid span regex"),
        Regex::new(r"(?s)\[.*?\]").expect("Invalid span regex"),
    ]
});

/// A parse attempt over sanitized text.
type Strategy = fn(&str) -> Option<Value>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("array match", parse_array_match),
    ("whole text", parse_whole_text),
    ("span patterns", parse_span_patterns),
];

/// Extracts the search results contained in `content`.
///
/// A parsed array is filtered down to the objects carrying a non-empty
/// `title`, `url` and `description`. A parsed single object is returned as a
/// one-element vector without that filter.
#[instrument(skip(content), fields(content_length = content.len()))]
pub fn extract_results(content: &str) -> Vec<SearchResult> {
    let sanitized = sanitize(content);
    trace!(sanitized = %sanitized, "Sanitized completion content");

    for (name, strategy) in STRATEGIES {
        let Some(value) = strategy(&sanitized) else {
            debug!(strategy = *name, "Strategy found no JSON");
            continue;
        };

        if let Some(results) = validate(&value) {
            debug!(strategy = *name, count = results.len(), "Parsed search results");
            return results;
        }
    }

    error!("No valid JSON found in response");
    Vec::new()
}

/// Strips code fences and everything outside the outermost JSON delimiters.
pub fn sanitize(content: &str) -> String {
    let text = content.replace("```json", "").replace("```", "");

    let text = match text.find(['[', '{']) {
        Some(start) => &text[start..],
        None => "",
    };
    let text = match text.rfind([']', '}']) {
        Some(end) => &text[..=end],
        None => "",
    };

    text.trim().to_string()
}

/// The text unchanged, with all whitespace removed, and with whitespace
/// removed after structural characters.
fn normalized_variants(text: &str) -> [Cow<'_, str>; 3] {
    [
        Cow::Borrowed(text),
        Cow::Owned(text.chars().filter(|c| !c.is_whitespace()).collect()),
        STRUCTURAL_WHITESPACE.replace_all(text, "${1}${2}"),
    ]
}

/// Parses the first array-of-objects span found in any normalized variant.
pub(crate) fn parse_array_match(text: &str) -> Option<Value> {
    normalized_variants(text).iter().find_map(|variant| {
        let span = ARRAY_OF_OBJECTS.find(variant)?;
        serde_json::from_str(span.as_str()).ok()
    })
}

/// Parses a normalized variant of the whole text.
pub(crate) fn parse_whole_text(text: &str) -> Option<Value> {
    normalized_variants(text)
        .iter()
        .find_map(|variant| serde_json::from_str(variant).ok())
}

/// Parses the first `[{...}]`, `{...}` or `[...]` span, in that order.
pub(crate) fn parse_span_patterns(text: &str) -> Option<Value> {
    SPAN_PATTERNS.iter().find_map(|pattern| {
        let span = pattern.find(text)?;
        serde_json::from_str(span.as_str()).ok()
    })
}

/// Turns a parsed value into results, or `None` when the value is neither
/// an array nor an object.
fn validate(value: &Value) -> Option<Vec<SearchResult>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter(|item| {
                    ["title", "url", "description"]
                        .iter()
                        .all(|field| is_truthy(item.get(field)))
                })
                .filter_map(SearchResult::from_value)
                .collect(),
        ),
        Value::Object(_) => SearchResult::from_value(value).map(|result| vec![result]),
        _ => None,
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
