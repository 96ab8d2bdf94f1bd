//! OpenAI-compatible LLM client
//!
//! A minimal client for chat completions, schema-constrained output and
//! embeddings against any endpoint that speaks the OpenAI REST dialect:
//! OpenAI itself, Azure-style proxies, or a local Ollama server (`/v1`).
//!
//! # Example
//!
//! ```rust,ignore
//! use llm_client::{LlmClient, ChatRequest, Message};
//!
//! let client = LlmClient::ollama();
//!
//! let response = client
//!     .chat_completion(ChatRequest::new("mistral:v0.2").message(Message::user("Hello!")))
//!     .await?;
//!
//! let embedding = client.create_embedding("text to embed", "text-embedding-3-small").await?;
//! ```
//!
//! # Structured Output
//!
//! ```rust,ignore
//! #[derive(Deserialize, JsonSchema)]
//! struct Annotation {
//!     step_annotation: String,
//! }
//!
//! let annotation: Annotation = client
//!     .extract::<Annotation>("command-r:latest", system_prompt, user_prompt)
//!     .await?;
//! ```

pub mod error;
pub mod history;
pub mod schema;
pub mod types;

pub use error::{LlmError, Result};
pub use history::{Exchange, History, DEFAULT_HISTORY_CAPACITY};
pub use schema::StructuredOutput;
pub use types::*;

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use types::{ChatChoice, ChatResponseRaw, EmbeddingRequest, EmbeddingResponse};

/// Default OpenAI endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default local Ollama endpoint (OpenAI-compatible surface).
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// OpenAI-compatible API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the history.
#[derive(Clone)]
pub struct LlmClient {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
    history: History,
}

impl LlmClient {
    /// Client for the OpenAI API with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: Some(api_key.into()),
            base_url: OPENAI_BASE_URL.to_string(),
            history: History::default(),
        }
    }

    /// Client for a local Ollama server. No key is sent.
    pub fn ollama() -> Self {
        Self {
            http_client: Client::new(),
            api_key: None,
            base_url: OLLAMA_BASE_URL.to_string(),
            history: History::default(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| LlmError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (Ollama on another host, proxies, Azure).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set or clear the bearer key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Apply a per-request timeout. Timeouts surface as [`LlmError::Network`].
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    /// Keep the last `capacity` exchanges instead of the default.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = History::with_capacity(capacity);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Recent exchanges made through this client (and its clones).
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Chat completion.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = Instant::now();
        let raw: ChatResponseRaw = self.post_json("chat/completions", &request).await?;
        let content = first_content(raw.choices)?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "Chat completion"
        );
        self.history.record(Exchange {
            model: request.model,
            messages: request.messages,
            response: content.clone(),
            duration_ms: start.elapsed().as_millis(),
        });

        Ok(ChatResponse {
            content,
            usage: raw.usage,
        })
    }

    /// System + user prompt, returning only the text.
    pub async fn complete(
        &self,
        model: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest::new(model)
            .message(Message::system(system_prompt))
            .message(Message::user(user_prompt))
            .temperature(0.0);
        Ok(self.chat_completion(request).await?.content)
    }

    /// Schema-constrained output, returned as raw JSON text.
    pub async fn structured_output(&self, request: StructuredRequest) -> Result<String> {
        let start = Instant::now();
        let raw: ChatResponseRaw = self.post_json("chat/completions", &request).await?;
        let content = first_content(raw.choices)?;

        self.history.record(Exchange {
            model: request.model,
            messages: request.messages,
            response: content.clone(),
            duration_ms: start.elapsed().as_millis(),
        });

        Ok(content)
    }

    /// Type-safe structured output.
    ///
    /// Builds a strict schema for `T`, sends it as the response format and
    /// deserializes the reply.
    pub async fn extract<T: StructuredOutput>(
        &self,
        model: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let schema = T::strict_schema();
        let request =
            StructuredRequest::new(model, T::output_name(), system_prompt, user_prompt, schema);
        let json_str = self.structured_output(request).await?;

        serde_json::from_str(strip_code_blocks(&json_str))
            .map_err(|e| LlmError::Parse(format!("Failed to deserialize response: {}", e)))
    }

    /// Create embedding for text.
    pub async fn create_embedding(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest { model, input: text };
        let response: EmbeddingResponse = self.post_json("embeddings", &request).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::Api("No embedding in response".into()))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self
            .http_client
            .post(format!("{}/{}", self.base_url, path))
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, path, "LLM request failed");
            LlmError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, path, "LLM API error");
            return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                LlmError::RateLimited(error_text)
            } else {
                LlmError::Api(format!("{}: {}", status, error_text))
            });
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))
    }
}

fn first_content(choices: Vec<ChatChoice>) -> Result<String> {
    choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::Api("No content in completion".into()))
}
