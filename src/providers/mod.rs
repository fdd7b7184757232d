//! Clients for the external LLM and search services

pub mod cached;
pub mod gemini;
pub mod perplexity;
pub mod registry;
pub mod serp;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::{ErrorCode, TripMazerError};
use crate::Result;

pub use cached::CachedLlm;
pub use gemini::GeminiClient;
pub use perplexity::PerplexityClient;
pub use registry::ProviderSet;
pub use serp::{FlightQuery, HotelQuery, SerpApiClient, TravelDataProvider};

/// A single prompt sent to a text-generation service
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub query: String,
    pub temperature: f32,
    /// Overrides the provider's configured model
    pub model: Option<String>,
}

impl ChatRequest {
    pub fn new(system_prompt: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            query: query.into(),
            temperature: 0.0,
            model: None,
        }
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Text-generation backend used by the tools and the planner
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier, also part of cache keys
    fn name(&self) -> &str;

    /// Model used when a request does not override it
    fn default_model(&self) -> &str;

    async fn complete(&self, request: ChatRequest) -> Result<String>;
}

/// Reqwest client with transient-failure retries and a request timeout
pub(crate) fn build_http_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    // errs when a provider is already installed, which is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    let client = Client::builder()
        .timeout(Duration::from_secs(u64::from(timeout_seconds)))
        .user_agent(concat!("TripMazer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TripMazerError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(Duration::from_millis(500), Duration::from_secs(8))
        .build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

pub(crate) fn require_key(key: Option<&String>, provider: &str, var: &str) -> Result<String> {
    key.filter(|k| !k.trim().is_empty())
        .cloned()
        .ok_or_else(|| TripMazerError::config(format!("{provider} API key is missing. Set {var}.")))
}

pub(crate) fn transport_error(provider: &str, err: reqwest_middleware::Error) -> TripMazerError {
    TripMazerError::api(ErrorCode::ApiNetworkError, format!("{provider} request failed: {err}"))
}

/// Maps a non-success status to a classified API error
pub(crate) async fn check_status(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCode::ApiUnauthorized,
        StatusCode::NOT_FOUND => ErrorCode::ApiNotFound,
        StatusCode::TOO_MANY_REQUESTS => ErrorCode::ApiRateLimit,
        s if s.is_server_error() => ErrorCode::ApiServerError,
        _ => ErrorCode::ApiNetworkError,
    };
    Err(TripMazerError::api(code, format!("{provider} returned {status}: {body}")))
}

pub(crate) async fn decode_json<T: DeserializeOwned>(provider: &str, response: Response) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        TripMazerError::api(
            ErrorCode::ApiInvalidResponse,
            format!("Failed to parse {provider} response: {e}"),
        )
    })
}

pub(crate) fn log_timing(provider: &str, started: Instant) {
    let elapsed = started.elapsed();
    info!("{provider} responded in {:.3}s", elapsed.as_secs_f64());
    if elapsed > Duration::from_secs(15) {
        warn!("Slow {provider} response: {:.3}s", elapsed.as_secs_f64());
    }
}
