//! Direct transport to a Gemini-style `generateContent` endpoint.
//!
//! - Auth via the `x-goog-api-key` header, never the URL, so transport errors
//!   cannot echo the credential
//! - Structured output via `generationConfig.responseSchema`, only when no
//!   tools are requested
//! - Web grounding via the `googleSearch` tool
//! - Safety blocks arrive in `promptFeedback`, termination in the first
//!   candidate's `finishReason`

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{ConfigError, ProviderConfig};
use crate::provider::{
    GenerateRequest, Provider, ProviderError, ProviderResponse, ProviderTool, SafetyBlock,
};
use crate::utils::HttpClient;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Candidate finish reasons that mean the output was withheld by a filter
const SAFETY_FINISH_REASONS: [&str; 5] =
    ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII", "IMAGE_SAFETY"];

/// Categories of the ratings flagged `blocked: true`
fn blocked_categories(ratings: &Value) -> Vec<String> {
    ratings
        .as_array()
        .map(|ratings| {
            ratings
                .iter()
                .filter(|r| r["blocked"].as_bool() == Some(true))
                .filter_map(|r| r["category"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Provider that calls the generative-language REST API directly.
#[derive(Clone)]
pub struct GeminiProvider {
    http: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiProvider {
    /// Create a provider from configuration.
    ///
    /// Fails with [`ConfigError::MissingApiKey`] when no credential is configured.
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let api_key = config.resolve_api_key()?;
        Self::with_api_key(config, api_key)
    }

    /// Create a provider with an explicitly provided API key
    pub fn with_api_key(config: &ProviderConfig, api_key: String) -> Result<Self, ConfigError> {
        let http = HttpClient::new(config.timeout())
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the JSON request body
    fn build_request_body(request: &GenerateRequest) -> Value {
        let mut generation_config = json!({ "temperature": request.temperature });

        if request.wants_structured_output() {
            generation_config["responseMimeType"] = json!("application/json");
            if let Some(schema) = &request.response_schema {
                generation_config["responseSchema"] = schema.clone();
            }
        }

        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": generation_config,
        });

        if request.tools.contains(&ProviderTool::WebSearch) {
            body["tools"] = json!([{ "googleSearch": {} }]);
        }

        body
    }

    /// Parse a `generateContent` response body.
    ///
    /// A block is reported either on the prompt (`promptFeedback.blockReason`)
    /// or on the candidate, through a safety finish reason.
    fn parse_response(body: &Value) -> ProviderResponse {
        let feedback = &body["promptFeedback"];
        let candidate = body["candidates"].get(0);

        let finish_reason = candidate
            .and_then(|c| c["finishReason"].as_str())
            .map(str::to_string);

        let prompt_block = feedback["blockReason"].as_str().map(|reason| SafetyBlock {
            reason: reason.to_string(),
            categories: blocked_categories(&feedback["safetyRatings"]),
        });

        let candidate_block = || {
            let reason = finish_reason
                .as_deref()
                .filter(|r| SAFETY_FINISH_REASONS.contains(r))?;
            Some(SafetyBlock {
                reason: reason.to_string(),
                categories: candidate
                    .map(|c| blocked_categories(&c["safetyRatings"]))
                    .unwrap_or_default(),
            })
        };
        let block = prompt_block.or_else(candidate_block);

        let text = candidate
            .and_then(|c| c["content"]["parts"].as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<String>()
            })
            .filter(|t| !t.trim().is_empty());

        ProviderResponse {
            text,
            finish_reason,
            block,
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ProviderResponse, ProviderError> {
        let body = Self::build_request_body(request);

        tracing::debug!(
            model = self.model(),
            structured = request.wants_structured_output(),
            tools = request.tools.len(),
            "Sending generateContent request"
        );

        let response = self
            .http
            .client()
            .post(self.endpoint_url())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: Value = serde_json::from_str(&body_text)?;
        Ok(Self::parse_response(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::is_transient;

    fn test_config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            base_url: base_url.to_string(),
            model: "gemini-test".to_string(),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_without_key_fails() {
        let mut config = test_config("http://localhost");
        config.api_key_env = "SCHOLAR_LENS_TEST_UNSET_GEMINI_KEY".into();

        let err = GeminiProvider::new(&config).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider =
            GeminiProvider::with_api_key(&test_config("http://localhost/"), "secret".into())
                .unwrap();
        let debug = format!("{:?}", provider);

        assert!(!debug.contains("secret"));
        assert_eq!(provider.model(), "gemini-test");
        assert_eq!(
            provider.endpoint_url(),
            "http://localhost/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_build_request_body_structured() {
        let request = GenerateRequest::new("Compare these papers")
            .schema(json!({"type": "OBJECT"}))
            .temperature(0.3);
        let body = GeminiProvider::build_request_body(&request);

        assert_eq!(body["contents"][0]["parts"][0]["text"], "Compare these papers");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_build_request_body_grounded_omits_schema() {
        let request = GenerateRequest::new("Find papers")
            .schema(json!({"type": "ARRAY"}))
            .tool(ProviderTool::WebSearch);
        let body = GeminiProvider::build_request_body(&request);

        assert!(body["generationConfig"].get("responseSchema").is_none());
        assert!(body["tools"][0].get("googleSearch").is_some());
    }

    #[test]
    fn test_parse_text_response() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "[{\"title\":"}, {"text": " \"A\"}]"}]},
                "finishReason": "STOP"
            }]
        });
        let response = GeminiProvider::parse_response(&body);

        assert_eq!(response.text.as_deref(), Some("[{\"title\": \"A\"}]"));
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        assert!(response.block.is_none());
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let body = json!({
            "promptFeedback": {
                "blockReason": "SAFETY",
                "safetyRatings": [
                    {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "probability": "HIGH", "blocked": true},
                    {"category": "HARM_CATEGORY_HARASSMENT", "probability": "NEGLIGIBLE"}
                ]
            }
        });
        let response = GeminiProvider::parse_response(&body);
        let block = response.block.unwrap();

        assert_eq!(block.reason, "SAFETY");
        assert_eq!(block.categories, vec!["HARM_CATEGORY_DANGEROUS_CONTENT"]);
        assert!(response.text.is_none());
    }

    #[test]
    fn test_parse_blocked_candidate() {
        let body = json!({
            "candidates": [{
                "finishReason": "SAFETY",
                "safetyRatings": [
                    {"category": "HARM_CATEGORY_HARASSMENT", "probability": "HIGH", "blocked": true},
                    {"category": "HARM_CATEGORY_HATE_SPEECH", "probability": "LOW"}
                ]
            }]
        });
        let response = GeminiProvider::parse_response(&body);
        let block = response.block.clone().unwrap();

        assert_eq!(block.reason, "SAFETY");
        assert_eq!(block.categories, vec!["HARM_CATEGORY_HARASSMENT"]);

        let err = crate::research::normalize_text(response).unwrap_err();
        assert_eq!(err.kind(), crate::research::ErrorKind::BlockedContent);
    }

    #[test]
    fn test_parse_other_finish_reason_is_not_a_block() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "[{\"title\""}]},
                "finishReason": "MAX_TOKENS"
            }]
        });
        let response = GeminiProvider::parse_response(&body);

        assert!(response.block.is_none());
        assert!(!response.finished_normally());
    }

    #[test]
    fn test_parse_empty_candidates() {
        let response = GeminiProvider::parse_response(&json!({"candidates": []}));
        assert_eq!(response, ProviderResponse::default());
    }

    #[tokio::test]
    async fn test_generate_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_header(API_KEY_HEADER, "test-key")
            .match_query(mockito::Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{
                        "content": {"parts": [{"text": "{\"topics\": []}"}]},
                        "finishReason": "STOP"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider =
            GeminiProvider::with_api_key(&test_config(&server.url()), "test-key".into()).unwrap();
        let response = provider
            .generate(&GenerateRequest::new("Suggest topics"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.text.as_deref(), Some("{\"topics\": []}"));
    }

    #[tokio::test]
    async fn test_overload_status_is_transient() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body(
                r#"{"error": {"code": 503, "message": "The model is overloaded. Please try again later.", "status": "UNAVAILABLE"}}"#,
            )
            .create_async()
            .await;

        let provider =
            GeminiProvider::with_api_key(&test_config(&server.url()), "test-key".into()).unwrap();
        let err = provider
            .generate(&GenerateRequest::new("Find papers"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Http { status: 503, .. }));
        assert!(is_transient(&err));
    }

    #[tokio::test]
    async fn test_network_error_does_not_leak_key() {
        let provider =
            GeminiProvider::with_api_key(&test_config("http://127.0.0.1:1"), "SUPERSECRETKEY123".into())
                .unwrap();
        let err = provider
            .generate(&GenerateRequest::new("Find papers"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Network(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY123"));
        assert!(!format!("{:?}", err).contains("SUPERSECRETKEY123"));
    }
}
