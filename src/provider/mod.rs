//! Generative-AI provider abstraction.
//!
//! The research assistant depends only on the [`Provider`] trait: one call
//! takes a prompt plus an optional declared response shape and returns the raw
//! text along with termination and safety information. Transports are
//! injected, so the same orchestrator runs against:
//!
//! - [`GeminiProvider`]: direct calls to a `generateContent` endpoint
//! - [`RelayProvider`]: an internal HTTP endpoint that forwards to the provider
//!   and replies with the same shape (the serverless deployment)
//! - [`MockProvider`]: scripted responses for tests

mod gemini;
mod mock;
mod relay;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use relay::RelayProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigError, ProviderConfig, ProviderKind};

/// Build the transport selected by `config.kind`
pub fn from_config(config: &ProviderConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let provider: Arc<dyn Provider> = match config.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(config)?),
        ProviderKind::Relay => Arc::new(RelayProvider::new(config)?),
    };
    Ok(provider)
}

/// Finish reason reported for a normally completed generation
pub const FINISH_STOP: &str = "STOP";

/// Tools the provider may use while generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderTool {
    /// Ground the answer with live web search results
    WebSearch,
}

/// One generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    /// Declared output shape, in the provider's schema dialect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ProviderTool>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
            temperature: 0.2,
            tools: Vec::new(),
        }
    }

    pub fn schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn tool(mut self, tool: ProviderTool) -> Self {
        if !self.tools.contains(&tool) {
            self.tools.push(tool);
        }
        self
    }

    /// Whether the provider can enforce `response_schema` for this request.
    ///
    /// Grounding tools and schema-constrained output are mutually exclusive, so
    /// a tool-using request only describes its shape in the prompt.
    pub fn wants_structured_output(&self) -> bool {
        self.response_schema.is_some() && self.tools.is_empty()
    }
}

/// Content-safety block attached to a response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyBlock {
    pub reason: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Raw provider output before normalization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub block: Option<SafetyBlock>,
}

impl ProviderResponse {
    /// A normally completed response carrying `text`
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: Some(FINISH_STOP.to_string()),
            block: None,
        }
    }

    /// A response rejected by the provider's safety filter
    pub fn blocked(reason: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            text: None,
            finish_reason: None,
            block: Some(SafetyBlock {
                reason: reason.into(),
                categories,
            }),
        }
    }

    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }

    /// True when no finish reason was reported or it is the normal stop
    pub fn finished_normally(&self) -> bool {
        self.finish_reason
            .as_deref()
            .map_or(true, |r| r.eq_ignore_ascii_case(FINISH_STOP))
    }
}

/// A generative-AI backend.
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Short backend name for logs (e.g. "gemini", "relay", "mock")
    fn name(&self) -> &str;

    /// Run one generation
    async fn generate(&self, request: &GenerateRequest) -> Result<ProviderResponse, ProviderError>;
}

/// Transport-level failures of a provider call.
///
/// The retry wrapper classifies these by their rendered message, so HTTP
/// failures keep the numeric status and the provider's body text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// The per-attempt timeout elapsed
    #[error("Provider request timed out after {0:?}")]
    Timeout(Duration),

    /// The transport returned something that is not a provider envelope
    #[error("Invalid provider envelope: {0}")]
    Parse(String),

    /// Error reported by the provider API or SDK
    #[error("API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for ProviderError {
    /// The request URL is stripped; it may carry endpoint secrets
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_normally() {
        assert!(ProviderResponse::text("{}").finished_normally());
        assert!(ProviderResponse::default().finished_normally());
        assert!(ProviderResponse::text("x")
            .with_finish_reason("stop")
            .finished_normally());
        assert!(!ProviderResponse::text("x")
            .with_finish_reason("MAX_TOKENS")
            .finished_normally());
    }

    #[test]
    fn test_structured_output_disabled_by_tools() {
        let req = GenerateRequest::new("p").schema(serde_json::json!({"type": "ARRAY"}));
        assert!(req.wants_structured_output());

        let grounded = req.tool(ProviderTool::WebSearch).tool(ProviderTool::WebSearch);
        assert_eq!(grounded.tools.len(), 1);
        assert!(!grounded.wants_structured_output());
    }

    #[test]
    fn test_from_config_selects_transport() {
        let relay = ProviderConfig {
            kind: ProviderKind::Relay,
            relay_url: Some("http://localhost:9999/generate".into()),
            ..Default::default()
        };
        assert_eq!(from_config(&relay).unwrap().name(), "relay");

        let gemini = ProviderConfig {
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert_eq!(from_config(&gemini).unwrap().name(), "gemini");
    }

    #[test]
    fn test_http_error_message_keeps_status() {
        let err = ProviderError::Http {
            status: 503,
            body: "The model is overloaded".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: The model is overloaded");
    }
}
