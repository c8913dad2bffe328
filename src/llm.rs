use crate::config::{ApiConfig, AppConfig, ModelConfig};
use crate::extract::extract_results;
use crate::prompt::{ChatMessage, PromptBuilder};
use crate::{Result, SearchResult, SeekError};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The body of a chat-completion request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage>,
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
}

/// The `CompletionClient` struct asks a chat-completion endpoint for websites and
/// turns the free-form answer into [`SearchResult`]s.
///
/// Construct it once at startup and share it by reference.
pub struct CompletionClient {
    /// The HTTP client used for making requests.
    client: Client,
    /// Endpoint and credentials.
    api: ApiConfig,
    /// Model settings for searches.
    search: ModelConfig,
    /// Model settings for recommendations.
    recommend: ModelConfig,
}

impl CompletionClient {
    /// Creates a new `CompletionClient` from the application configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the client, or an error if the HTTP client could not be created.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(SeekError::Request)?;

        Ok(Self {
            client,
            api: config.api.clone(),
            search: config.search.clone(),
            recommend: config.recommend.clone(),
        })
    }

    /// Finds websites related to `query`.
    ///
    /// Never fails: every error is logged and reported as an empty result list.
    pub async fn search_websites(&self, query: &str) -> Vec<SearchResult> {
        match self.try_search(query).await {
            Ok(results) => results,
            Err(e) => {
                error!("Search failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Recommends websites similar to the given favorite titles.
    ///
    /// Never fails: every error is logged and reported as an empty result list.
    pub async fn recommendations(&self, favorites: &[String]) -> Vec<SearchResult> {
        match self.try_recommend(favorites).await {
            Ok(results) => results,
            Err(e) => {
                error!("Recommendations failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Finds websites related to `query`, reporting failures to the caller.
    #[instrument(skip(self))]
    pub async fn try_search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.api.validate_api_key()?;
        info!("Searching for websites related to: {}", query);

        let messages = PromptBuilder::search(query)
            .with_count(self.search.result_count)
            .build();

        let request = self
            .client
            .post(&self.api.endpoint)
            .header("HTTP-Referer", &self.api.referer)
            .header("X-Title", &self.api.title);

        let content = self.complete(request, messages, &self.search).await?;
        Ok(content.map(|c| extract_results(&c)).unwrap_or_default())
    }

    /// Recommends websites similar to `favorites`, reporting failures to the caller.
    #[instrument(skip(self))]
    pub async fn try_recommend(&self, favorites: &[String]) -> Result<Vec<SearchResult>> {
        if favorites.is_empty() {
            debug!("No favorites to recommend from");
            return Ok(Vec::new());
        }
        self.api.validate_api_key()?;

        let messages = PromptBuilder::recommend(favorites.iter().cloned())
            .with_count(self.recommend.result_count)
            .build();

        let request = self.client.post(&self.api.endpoint);

        let content = self.complete(request, messages, &self.recommend).await?;
        Ok(content.map(|c| extract_results(&c)).unwrap_or_default())
    }

    /// Sends one completion request and returns the first choice's content.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the response holds no choices or no content.
    async fn complete(
        &self,
        request: RequestBuilder,
        messages: Vec<ChatMessage>,
        model: &ModelConfig,
    ) -> Result<Option<String>> {
        let body = ChatRequest {
            messages,
            model: &model.model,
            temperature: model.temperature,
            max_tokens: model.max_tokens,
        };

        let response = request
            .bearer_auth(&self.api.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SeekError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: Value = serde_json::from_str(&text)
            .map_err(|e| SeekError::MalformedResponse(format!("{}: {}", e, text)))?;

        match first_choice_content(&parsed) {
            None => {
                error!("Invalid API response structure: no choices");
                Ok(None)
            }
            Some(None) => {
                error!("No content in API response");
                Ok(None)
            }
            Some(Some(content)) => {
                debug!(content_length = content.len(), "Extracted content");
                Ok(Some(content.to_string()))
            }
        }
    }
}

/// Reads `choices[0].message.content` from a completion response.
///
/// # Returns
///
/// `None` when there is no first choice, `Some(None)` when that choice has no
/// non-empty string content.
fn first_choice_content(response: &Value) -> Option<Option<&str>> {
    let choice = response.pointer("/choices/0")?;
    Some(
        choice
            .pointer("/message/content")
            .and_then(Value::as_str)
            .filter(|content| !content.is_empty()),
    )
}
