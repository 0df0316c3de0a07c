/// Gemini HTTP client implementation.
///
/// This module provides `GeminiClient` for making synchronous requests to the
/// Gemini `generateContent` endpoint, along with error types, request/response
/// types, and a builder for configuration.
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;

use crate::Source;

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Errors that can occur when interacting with the Gemini API.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Gemini API-specific errors (blocked prompts, empty candidates, ...)
    #[error("Gemini API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No API key was configured
    #[error("No Gemini API key configured")]
    MissingApiKey,
}

impl GeminiError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Model name, e.g. "gemini-2.5-flash".
    pub model: String,
    /// The prompt text.
    pub prompt: String,
    /// Let the model ground its answer with Google Search.
    pub grounded_search: bool,
    /// Token budget for the model's internal reasoning, if any.
    pub thinking_budget: Option<u32>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            grounded_search: false,
            thinking_budget: None,
        }
    }

    pub fn grounded_search(mut self, enabled: bool) -> Self {
        self.grounded_search = enabled;
        self
    }

    pub fn thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    /// Builds the JSON body for `models/{model}:generateContent`.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": self.prompt }]
            }]
        });

        if self.grounded_search {
            body["tools"] = json!([{ "google_search": {} }]);
        }
        if let Some(budget) = self.thinking_budget {
            body["generationConfig"] = json!({
                "thinkingConfig": { "thinkingBudget": budget }
            });
        }

        body
    }
}

/// Text produced by the model plus any grounding sources it cited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResponse {
    pub text: String,
    pub sources: Vec<Source>,
}

impl GenerateResponse {
    /// Extracts the first candidate from a `generateContent` response body.
    ///
    /// Text parts are concatenated in order. Grounding chunks without both a
    /// URI and a title are dropped.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::Api` if the response carries an error object or
    /// no candidate text.
    pub fn from_json(json: &Value) -> Result<Self, GeminiError> {
        if let Some(message) = json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
        {
            return Err(GeminiError::Api {
                message: message.to_string(),
            });
        }

        let candidate = json
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .ok_or_else(|| GeminiError::Api {
                message: block_reason(json)
                    .unwrap_or_else(|| "Missing 'candidates' in API response".to_string()),
            })?;

        let text: String = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GeminiError::Api {
                message: "Candidate contained no text".to_string(),
            });
        }

        let sources = candidate
            .get("groundingMetadata")
            .and_then(|m| m.get("groundingChunks"))
            .and_then(Value::as_array)
            .map(|chunks| {
                chunks
                    .iter()
                    .filter_map(|chunk| {
                        let web = chunk.get("web")?;
                        let uri = web.get("uri").and_then(Value::as_str)?;
                        let title = web.get("title").and_then(Value::as_str)?;
                        if uri.is_empty() || title.is_empty() {
                            return None;
                        }
                        Some(Source::new(uri, title))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { text, sources })
    }
}

fn block_reason(json: &Value) -> Option<String> {
    json.get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(Value::as_str)
        .map(|reason| format!("Prompt blocked: {reason}"))
}

/// Builder for constructing `GeminiClient` instances.
///
/// # Examples
///
/// ```
/// use shelf::gemini::GeminiClientBuilder;
///
/// let client = GeminiClientBuilder::new()
///     .api_key("test-key")
///     .base_url("http://localhost:8080")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.base_url(), "http://localhost:8080");
/// ```
#[derive(Debug, Default)]
pub struct GeminiClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    /// Creates a new `GeminiClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Gemini API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API key sent with every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the per-request timeout. Deep analysis can take minutes.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `GeminiClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, `GEMINI_BASE_URL` is used, falling back
    /// to the public endpoint. If `api_key()` was not called, `GEMINI_API_KEY`
    /// (or `API_KEY`) is used.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::MissingApiKey` if no non-empty key is available and
    /// `GeminiError::InvalidUrl` if the base URL does not parse.
    pub fn build(self) -> Result<GeminiClient, GeminiError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        let api_key = self
            .api_key
            .or_else(crate::config::api_key_from_env)
            .filter(|key| !key.trim().is_empty())
            .ok_or(GeminiError::MissingApiKey)?;

        reqwest::Url::parse(&base_url)
            .map_err(|e| GeminiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(120)))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(GeminiError::Network)?;

        Ok(GeminiClient {
            client,
            base_url,
            api_key,
        })
    }
}

/// Synchronous HTTP client for the Gemini API.
///
/// It should be constructed using `GeminiClientBuilder`.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

/// Trait for Gemini API client operations.
///
/// This is the seam the metadata fetcher depends on, so tests can substitute
/// a canned response.
pub trait GeminiClientTrait: Send + Sync {
    /// Runs a single generation request.
    fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GeminiError>;
}

impl GeminiClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn generate_internal(&self, request: &GenerateRequest) -> Result<GenerateResponse, GeminiError> {
        let url = self.endpoint(&request.model);
        let body = request.to_body();

        tracing::debug!(model = %request.model, grounded = request.grounded_search, "calling Gemini");

        retry_with_backoff(|| {
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .map_err(GeminiError::from_reqwest)?;

            let status = response.status();
            if !status.is_success() {
                // 4xx is returned as-is; 5xx is retried by the caller.
                return Err(GeminiError::Http {
                    status: status.as_u16(),
                });
            }

            let text = response.text().map_err(GeminiError::from_reqwest)?;
            let json: Value = serde_json::from_str(&text).map_err(GeminiError::Serialization)?;

            GenerateResponse::from_json(&json)
        })
    }
}

impl GeminiClientTrait for GeminiClient {
    fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, GeminiError> {
        self.generate_internal(request)
    }
}

/// Retries an operation with exponential backoff.
///
/// Retries up to 3 times with delays of 1s, 2s, and 4s, and only on transient
/// errors (HTTP 5xx, 429, network errors, timeouts).
pub fn retry_with_backoff<F, T>(f: F) -> Result<T, GeminiError>
where
    F: FnMut() -> Result<T, GeminiError>,
{
    retry_with_delays(f, &[1, 2, 4])
}

fn retry_with_delays<F, T>(mut f: F, delays_secs: &[u64]) -> Result<T, GeminiError>
where
    F: FnMut() -> Result<T, GeminiError>,
{
    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) if !should_retry(&e) => return Err(e),
        Err(e) => e,
    };

    for &delay_secs in delays_secs {
        tracing::warn!(error = %last_error, delay_secs, "retrying Gemini request");
        thread::sleep(Duration::from_secs(delay_secs));

        match f() {
            Ok(result) => return Ok(result),
            Err(e) if !should_retry(&e) => return Err(e),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}

/// Returns `true` for transient errors worth retrying.
fn should_retry(error: &GeminiError) -> bool {
    match error {
        GeminiError::Network(_) | GeminiError::Timeout(_) => true,
        GeminiError::Http { status } => *status == 429 || (500..600).contains(status),
        GeminiError::Serialization(_)
        | GeminiError::Api { .. }
        | GeminiError::InvalidUrl(_)
        | GeminiError::MissingApiKey => false,
    }
}
