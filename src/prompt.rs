use serde::{Deserialize, Serialize};

const SEARCH_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that finds websites based on user queries.";
const RECOMMEND_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that recommends websites based on user favorites.";

const RESPONSE_FORMAT: &str = r#"Respond ONLY with a VALID JSON array of objects, each containing:
- title: string (website name)
- url: string (full website URL)
- description: string (brief description)
- category: string (website category)
Example: [{
  "title":"Example Site",
  "url":"https://example.com",
  "description":"A site about things",
  "category":"Technology"
}]"#;

/// A single chat message as sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// What the prompt asks the model for.
#[derive(Debug, Clone)]
enum PromptKind {
    /// Websites related to a free-text query.
    Search(String),
    /// Websites similar to the given favorite titles.
    Recommend(Vec<String>),
}

/// The `PromptBuilder` struct is responsible for constructing the chat messages
/// that ask the model for a JSON list of websites.
pub struct PromptBuilder {
    /// The query or favorites the prompt is about.
    kind: PromptKind,
    /// The number of websites to ask for.
    count: usize,
}

impl PromptBuilder {
    /// Creates a `PromptBuilder` asking for websites related to `query`.
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            kind: PromptKind::Search(query.into()),
            count: crate::DEFAULT_RESULT_COUNT,
        }
    }

    /// Creates a `PromptBuilder` asking for websites similar to the given favorites.
    ///
    /// # Arguments
    ///
    /// * `favorites` - The titles of the user's favorite websites.
    pub fn recommend(favorites: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            kind: PromptKind::Recommend(favorites.into_iter().map(Into::into).collect()),
            count: crate::DEFAULT_RESULT_COUNT,
        }
    }

    /// Sets the number of websites to ask for.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Builds the system and user messages.
    ///
    /// # Returns
    ///
    /// A vector holding the system message followed by the user message.
    pub fn build(&self) -> Vec<ChatMessage> {
        let (system, request) = match &self.kind {
            PromptKind::Search(query) => (
                SEARCH_SYSTEM_PROMPT,
                format!("Find {} websites related to: {}.", self.count, query.trim()),
            ),
            PromptKind::Recommend(favorites) => (
                RECOMMEND_SYSTEM_PROMPT,
                format!(
                    "Based on these favorite websites: {}, recommend {} similar websites.",
                    favorites.join(", "),
                    self.count
                ),
            ),
        };

        vec![
            ChatMessage::system(system),
            ChatMessage::user(format!("{}\n{}", request, RESPONSE_FORMAT)),
        ]
    }
}
