use thiserror::Error;

pub mod config;
pub mod extract;
pub mod favorites;
pub mod llm;
pub mod prompt;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use config::AppConfig;
pub use extract::extract_results;
pub use favorites::{FavoritesStore, FileStorage, MemoryStorage, Storage};
pub use llm::CompletionClient;
pub use types::SearchResult;

/// The `SeekError` enum represents the errors that can occur while talking to the
/// completion endpoint or persisting favorites.
#[derive(Error, Debug)]
pub enum SeekError {
    /// Represents a missing or malformed configuration value, such as the API key.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Represents an error that occurs while sending an HTTP request.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Represents a non-success HTTP status returned by the completion endpoint.
    #[error("HTTP error! status: {status}, body: {body}")]
    Http { status: u16, body: String },
    /// Represents a completion response without usable choices or content.
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
    /// Represents an error reading or writing persisted state.
    #[error("Storage error: {0}")]
    Storage(String),
    /// Represents a JSON encoding or decoding error.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A type alias for `Result` with the `SeekError` error type.
pub type Result<T> = std::result::Result<T, SeekError>;

// Constants

/// The default chat-completion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
/// API keys shorter than this are rejected before any request is made.
pub const MIN_API_KEY_LEN: usize = 10;
/// The default number of websites requested per completion.
pub const DEFAULT_RESULT_COUNT: usize = 5;
/// The storage key holding the serialized favorites collection.
pub const FAVORITES_KEY: &str = "favorites";
