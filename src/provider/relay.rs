//! Transport to an internal endpoint that forwards requests to the provider.
//!
//! This is the serverless deployment: the browser-facing function holds the
//! credential and answers with the provider-neutral envelope, so the relay
//! client needs only a URL. The request body is the serialized
//! [`GenerateRequest`]; the response body is a [`ProviderResponse`].

use async_trait::async_trait;

use crate::config::{ConfigError, ProviderConfig};
use crate::provider::{GenerateRequest, Provider, ProviderError, ProviderResponse};
use crate::utils::HttpClient;

/// Provider that posts requests to a same-shaped relay endpoint.
#[derive(Debug, Clone)]
pub struct RelayProvider {
    http: HttpClient,
    url: String,
}

impl RelayProvider {
    /// Create a relay provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let url = config
            .relay_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingRelayUrl)?;

        let http = HttpClient::new(config.timeout())
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { http, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Provider for RelayProvider {
    fn name(&self) -> &str {
        "relay"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ProviderResponse, ProviderError> {
        tracing::debug!(url = self.url(), "Sending relay request");

        let response = self.http.client().post(&self.url).json(request).send().await?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: body_text,
            });
        }

        Ok(serde_json::from_str(&body_text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderTool;

    fn relay_config(url: Option<String>) -> ProviderConfig {
        ProviderConfig {
            relay_url: url,
            timeout_secs: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_relay_url() {
        let err = RelayProvider::new(&relay_config(None)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRelayUrl));

        let relay = RelayProvider::new(&relay_config(Some("http://relay.local/generate".into())))
            .unwrap();
        assert_eq!(relay.url(), "http://relay.local/generate");
    }

    #[tokio::test]
    async fn test_relay_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/generate")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "prompt": "Find papers",
                "tools": ["webSearch"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": "[]", "finishReason": "STOP"}"#)
            .create_async()
            .await;

        let provider =
            RelayProvider::new(&relay_config(Some(format!("{}/generate", server.url())))).unwrap();
        let response = provider
            .generate(&GenerateRequest::new("Find papers").tool(ProviderTool::WebSearch))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response, ProviderResponse::text("[]"));
    }

    #[tokio::test]
    async fn test_relay_block_and_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _blocked = server
            .mock("POST", "/blocked")
            .with_status(200)
            .with_body(r#"{"block": {"reason": "SAFETY", "categories": ["HARM_CATEGORY_HARASSMENT"]}}"#)
            .create_async()
            .await;
        let _failing = server
            .mock("POST", "/failing")
            .with_status(502)
            .with_body("upstream UNAVAILABLE")
            .create_async()
            .await;

        let blocked = RelayProvider::new(&relay_config(Some(format!("{}/blocked", server.url()))))
            .unwrap()
            .generate(&GenerateRequest::new("x"))
            .await
            .unwrap();
        assert_eq!(blocked.block.unwrap().reason, "SAFETY");

        let err = RelayProvider::new(&relay_config(Some(format!("{}/failing", server.url()))))
            .unwrap()
            .generate(&GenerateRequest::new("x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502: upstream UNAVAILABLE");
    }
}
