//! AI-generated link metadata and deep analysis.
//!
//! `MetadataFetcher` wraps an optional Gemini client. Neither operation ever
//! fails: without an API key a "feature unavailable" placeholder is returned,
//! and any transport or parse failure is logged and replaced by fixed
//! fallback text, so saving a link never depends on the AI being reachable.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use serde::Deserialize;

use crate::config::{Config, DEFAULT_ANALYSIS_MODEL, DEFAULT_METADATA_MODEL};
use crate::gemini::{GeminiClientBuilder, GeminiClientTrait, GeminiError, GenerateRequest};
use crate::service::LinkService;
use crate::{ERROR_CATEGORY, Link, LinkId, LinkMetadata, LinkUpdate};

/// Reasoning budget for deep analysis requests.
pub const ANALYSIS_THINKING_BUDGET: u32 = 32768;

/// Title used when no API key is configured.
pub const UNAVAILABLE_TITLE: &str = "Feature Unavailable in Live Demo";

/// Category used when no API key is configured.
pub const UNAVAILABLE_CATEGORY: &str = "Demo";

const UNAVAILABLE_SUMMARY: &str = "This feature, which uses AI to automatically summarize and categorize links, is disabled because no Gemini API key is configured. Set GEMINI_API_KEY to enable it.";

const UNAVAILABLE_ANALYSIS: &str = r#"
### Feature Unavailable

**Deep analysis is an AI-powered feature that is disabled without an API key.**

This feature requires a secret API key to connect to the generative AI service. Set `GEMINI_API_KEY` in your environment (or in a `.env` file) to use it.
"#;

/// Title used when metadata could not be fetched.
pub const FALLBACK_TITLE: &str = "Unable to Access Document Content";

const METADATA_PROMPT: &str = r#"Based on the content of the URL provided, generate a concise title, a one-sentence summary, and a single, relevant category (e.g., Technology, News, Productivity, Lifestyle, Programming).
URL: {url}
Respond with ONLY a valid JSON object in the following format: {"title": "...", "summary": "...", "category": "..."}. Do not include any other text, just the JSON."#;

const ANALYSIS_PROMPT: &str = "Provide a detailed, in-depth analysis of the content at this URL: {url}. Break down the key arguments, identify the main takeaways, and explain any complex concepts simply. Format your response using markdown for readability.";

/// A fenced ```json block, or else everything from the first `{` to the last `}`.
static JSON_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\n(.*?)\n```|(\{.*\})").expect("valid JSON extraction pattern")
});

/// Metadata substituted when the AI call or its parsing fails.
pub fn fallback_metadata(url: &str) -> LinkMetadata {
    LinkMetadata::new(
        FALLBACK_TITLE,
        format!(
            "Could not fetch a summary for {url}. The content might be inaccessible or require a login."
        ),
        ERROR_CATEGORY,
    )
}

/// Metadata returned when AI features are disabled.
pub fn unavailable_metadata() -> LinkMetadata {
    LinkMetadata::new(UNAVAILABLE_TITLE, UNAVAILABLE_SUMMARY, UNAVAILABLE_CATEGORY)
}

/// Returns `true` for the category assigned to links whose metadata fetch failed.
pub fn is_error_category(category: &str) -> bool {
    category == ERROR_CATEGORY
}

/// Builder for constructing `MetadataFetcher` instances.
///
/// # Examples
///
/// ```
/// use shelf::metadata::MetadataFetcherBuilder;
///
/// // No client configured: every call returns the placeholder.
/// let fetcher = MetadataFetcherBuilder::new().build();
/// let metadata = fetcher.fetch_link_metadata("https://example.com");
/// assert_eq!(metadata.category, "Demo");
/// ```
#[derive(Default)]
pub struct MetadataFetcherBuilder {
    client: Option<Arc<dyn GeminiClientTrait>>,
    metadata_model: Option<String>,
    analysis_model: Option<String>,
}

impl MetadataFetcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Gemini client. Without one, AI features are disabled.
    pub fn client(mut self, client: Arc<dyn GeminiClientTrait>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn metadata_model(mut self, model: impl Into<String>) -> Self {
        self.metadata_model = Some(model.into());
        self
    }

    pub fn analysis_model(mut self, model: impl Into<String>) -> Self {
        self.analysis_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn build(self) -> MetadataFetcher {
        MetadataFetcher {
            client: self.client,
            metadata_model: self
                .metadata_model
                .unwrap_or_else(|| DEFAULT_METADATA_MODEL.to_string()),
            analysis_model: self
                .analysis_model
                .unwrap_or_else(|| DEFAULT_ANALYSIS_MODEL.to_string()),
        }
    }
}

/// Fetches AI-generated metadata and analysis for URLs.
pub struct MetadataFetcher {
    client: Option<Arc<dyn GeminiClientTrait>>,
    metadata_model: String,
    analysis_model: String,
}

impl MetadataFetcher {
    /// Builds a fetcher from configuration.
    ///
    /// Without an API key the fetcher runs in placeholder mode.
    ///
    /// # Errors
    ///
    /// Fails if a key is configured but the client cannot be built (for
    /// example because `GEMINI_BASE_URL` is not a valid URL).
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = MetadataFetcherBuilder::new()
            .metadata_model(&config.metadata_model)
            .analysis_model(&config.analysis_model);

        if let Some(key) = &config.api_key {
            let mut client_builder = GeminiClientBuilder::new()
                .api_key(key)
                .timeout(Duration::from_secs(300));
            if let Some(url) = &config.base_url {
                client_builder = client_builder.base_url(url);
            }
            builder = builder.client(Arc::new(client_builder.build()?));
        } else {
            tracing::info!("no Gemini API key configured, AI features disabled");
        }

        Ok(builder.build())
    }

    /// Returns `true` when a client is configured.
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Returns title, summary, category and sources for `url`.
    ///
    /// Never fails: see the module documentation for the fallback rules.
    pub fn fetch_link_metadata(&self, url: &str) -> LinkMetadata {
        let url = url.trim();
        let Some(client) = &self.client else {
            return unavailable_metadata();
        };

        match self.request_metadata(client.as_ref(), url) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(url, error = %e, "failed to fetch link metadata, using fallback");
                fallback_metadata(url)
            }
        }
    }

    /// Returns a markdown analysis of the content at `url`.
    ///
    /// Never fails: errors are reported inside the returned text.
    pub fn fetch_deep_analysis(&self, url: &str) -> String {
        let url = url.trim();
        let Some(client) = &self.client else {
            return UNAVAILABLE_ANALYSIS.to_string();
        };

        let request = GenerateRequest::new(&self.analysis_model, ANALYSIS_PROMPT.replace("{url}", url))
            .thinking_budget(ANALYSIS_THINKING_BUDGET);

        match client.generate(&request) {
            Ok(response) => response.text,
            Err(e) => {
                tracing::warn!(url, error = %e, "deep analysis failed");
                format!("An error occurred during deep analysis: {e}")
            }
        }
    }

    fn request_metadata(
        &self,
        client: &dyn GeminiClientTrait,
        url: &str,
    ) -> Result<LinkMetadata, GeminiError> {
        let request = GenerateRequest::new(&self.metadata_model, METADATA_PROMPT.replace("{url}", url))
            .grounded_search(true);

        let response = client.generate(&request)?;
        let metadata = parse_metadata(&response.text)?;
        Ok(metadata.with_sources(response.sources))
    }
}

/// Runs a deep analysis of a saved link and stores it as the link's summary.
///
/// Returns the updated link, or `None` if the ID does not exist.
///
/// # Errors
///
/// Returns an error if reading or updating the link fails.
pub fn analyze_link(
    service: &LinkService,
    fetcher: &MetadataFetcher,
    id: LinkId,
) -> Result<Option<Link>> {
    let Some(link) = service.get_link(id)? else {
        return Ok(None);
    };

    let analysis = fetcher.fetch_deep_analysis(link.url());
    service.update_link(
        id,
        LinkUpdate {
            summary: Some(analysis),
            ..Default::default()
        },
    )
}

/// Extracts the JSON object from a model reply.
///
/// Prefers a fenced ```json block; otherwise takes the span from the first
/// `{` to the last `}`.
pub fn extract_json(response: &str) -> Option<&str> {
    let captures = JSON_PATTERN.captures(response)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str())
}

#[derive(Deserialize)]
struct RawMetadata {
    title: Option<String>,
    summary: Option<String>,
    category: Option<String>,
}

/// Parses a model reply into metadata without sources.
///
/// # Errors
///
/// Returns `GeminiError::Api` if no JSON object is found, the JSON is
/// malformed, or any of `title`, `summary`, `category` is missing or blank.
pub fn parse_metadata(response: &str) -> Result<LinkMetadata, GeminiError> {
    let json = extract_json(response).ok_or_else(|| GeminiError::Api {
        message: "Could not parse JSON from Gemini response".to_string(),
    })?;

    let raw: RawMetadata = serde_json::from_str(json).map_err(|e| GeminiError::Api {
        message: format!("Failed to parse JSON: {e}"),
    })?;

    let field = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    match (field(raw.title), field(raw.summary), field(raw.category)) {
        (Some(title), Some(summary), Some(category)) => {
            Ok(LinkMetadata::new(title, summary, category))
        }
        _ => Err(GeminiError::Api {
            message: "Invalid metadata format received from API".to_string(),
        }),
    }
}
