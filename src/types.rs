use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One website suggested by the model.
///
/// Two results refer to the same favorite iff their `url` strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The website name.
    #[serde(default)]
    pub title: String,
    /// The full website URL. Not checked for reachability.
    #[serde(default)]
    pub url: String,
    /// A brief description of the website.
    #[serde(default)]
    pub description: String,
    /// The website category.
    #[serde(default)]
    pub category: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
            category: category.into(),
        }
    }

    /// Builds a result from an arbitrary JSON object.
    ///
    /// Missing fields become empty strings and non-string scalars are rendered
    /// with their JSON text, so sparse or loosely-typed model output still maps
    /// onto a record. Returns `None` when `value` is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |name: &str| object.get(name).map(text_of).unwrap_or_default();

        Some(Self {
            title: field("title"),
            url: field("url"),
            description: field("description"),
            category: field("category"),
        })
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
