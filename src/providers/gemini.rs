//! Gemini `generateContent` client

use std::time::Instant;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ChatRequest, LlmProvider, build_http_client, check_status, decode_json, log_timing, require_key, transport_error};
use crate::config::GeminiConfig;
use crate::error::{ErrorCode, TripMazerError};
use crate::Result;

const PROVIDER: &str = "Gemini";

pub struct GeminiClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

fn text_content(text: &str) -> Content {
    Content {
        parts: vec![Part { text: text.to_string() }],
    }
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout_seconds, config.max_retries)?,
            api_key: require_key(config.api_key.as_ref(), PROVIDER, "GEMINI_API_KEY")?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    #[instrument(skip_all, fields(provider = "gemini"))]
    pub async fn generate(&self, request: ChatRequest) -> Result<String> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let body = GenerateBody {
            contents: vec![text_content(&request.query)],
            system_instruction: (!request.system_prompt.is_empty())
                .then(|| text_content(&request.system_prompt)),
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        };

        let started = Instant::now();
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        log_timing(PROVIDER, started);

        let response = check_status(PROVIDER, response).await?;
        let generated: GenerateResponse = decode_json(PROVIDER, response).await?;

        let candidate = generated
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| TripMazerError::api(ErrorCode::ApiInvalidResponse, "Gemini returned no candidates"))?;

        Ok(candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ChatRequest) -> Result<String> {
        self.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            api_key: Some("gemini-test-key".to_string()),
            base_url: server.uri(),
            max_retries: 0,
            timeout_seconds: 5,
            ..GeminiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_includes_model() {
        let config = GeminiConfig {
            api_key: Some("gemini-test-key".to_string()),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_body_uses_camel_case() {
        let body = GenerateBody {
            contents: vec![text_content("Mumbai")],
            system_instruction: Some(text_content("Return a code")),
            generation_config: GenerationConfig { temperature: 0.0 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Mumbai");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Return a code");
        assert!(json.get("generationConfig").is_some());
    }

    #[tokio::test]
    async fn test_generate_joins_candidate_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "gemini-test-key"))
            .and(query_param_is_missing("key"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [{"text": "Mumbai"}]}],
                "systemInstruction": {"parts": [{"text": "Return the IATA code"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "BO"}, {"text": "M"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .complete(ChatRequest::new("Return the IATA code", "Mumbai"))
            .await
            .unwrap();
        assert_eq!(reply, "BOM");
    }

    #[tokio::test]
    async fn test_request_model_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "GOI"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .complete(ChatRequest::new("", "Goa").model("gemini-1.5-pro"))
            .await
            .unwrap();
        assert_eq!(reply, "GOI");
    }

    #[tokio::test]
    async fn test_forbidden_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(ChatRequest::new("system", "Pune"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ApiUnauthorized));
    }

    #[tokio::test]
    async fn test_no_candidates_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(ChatRequest::new("system", "Pune"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ApiInvalidResponse));
    }
}
