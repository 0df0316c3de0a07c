/// Gemini HTTP client module.
///
/// This module provides a blocking HTTP client for the Gemini
/// `generateContent` API, including error handling, retry logic, and timeout
/// configuration.
mod client;

pub use client::{
    DEFAULT_BASE_URL, GeminiClient, GeminiClientBuilder, GeminiClientTrait, GeminiError,
    GenerateRequest, GenerateResponse, retry_with_backoff,
};
