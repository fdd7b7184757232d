//! Perplexity chat completions client
//!
//! Sonar models do not accept a separate system message, so the system
//! prompt and the user query are folded into a single user turn.

use std::time::Instant;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{ChatRequest, LlmProvider, build_http_client, check_status, decode_json, log_timing, require_key, transport_error};
use crate::config::PerplexityConfig;
use crate::error::{ErrorCode, TripMazerError};
use crate::Result;

const PROVIDER: &str = "Perplexity";

pub struct PerplexityClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    model: String,
    check_model: String,
    search_context_size: String,
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_context_size: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

impl PerplexityClient {
    pub fn new(config: &PerplexityConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout_seconds, config.max_retries)?,
            api_key: require_key(config.api_key.as_ref(), PROVIDER, "PERPLEXITY_API_KEY")?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            check_model: config.check_model.clone(),
            search_context_size: config.search_context_size.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Runs a search-grounded completion and returns the first choice's text
    #[instrument(skip_all, fields(provider = "perplexity"))]
    pub async fn search(&self, request: ChatRequest) -> Result<String> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let body = CompletionBody {
            model,
            messages: vec![Message {
                role: "user".to_string(),
                content: format!("{}\n\nUser Query: {}", request.system_prompt, request.query),
            }],
            temperature: Some(request.temperature),
            search_context_size: Some(&self.search_context_size),
            max_tokens: None,
        };

        debug!("Sending Perplexity completion ({} chars)", body.messages[0].content.len());
        let started = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        log_timing(PROVIDER, started);

        let response = check_status(PROVIDER, response).await?;
        let completion: CompletionResponse = decode_json(PROVIDER, response).await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TripMazerError::api(ErrorCode::ApiInvalidResponse, "Perplexity returned no choices"))
    }

    /// Sends a tiny prompt to verify the key and endpoint
    pub async fn check_connection(&self) -> Result<()> {
        let body = CompletionBody {
            model: &self.check_model,
            messages: vec![Message {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            temperature: None,
            search_context_size: None,
            max_tokens: Some(10),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        check_status(PROVIDER, response).await?;

        info!("Perplexity API connection successful");
        Ok(())
    }
}

#[async_trait]
impl LlmProvider for PerplexityClient {
    fn name(&self) -> &str {
        "perplexity"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ChatRequest) -> Result<String> {
        self.search(request).await
    }
}
