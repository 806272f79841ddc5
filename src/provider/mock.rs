//! Mock provider for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::provider::{GenerateRequest, Provider, ProviderError, ProviderResponse};

type Scripted = Result<ProviderResponse, ProviderError>;

/// A provider that replays scripted responses and records every request.
///
/// Routes match when the prompt contains a marker and answer every matching
/// call with the same result. Calls that match no route consume the queue in
/// order; an exhausted queue yields an error.
#[derive(Debug, Default)]
pub struct MockProvider {
    routes: Mutex<Vec<(String, Scripted)>>,
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProvider {
    /// Create a new mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn push_response(&self, response: ProviderResponse) -> &Self {
        lock(&self.queue).push_back(Ok(response));
        self
    }

    /// Queue a normally finished response carrying `text`.
    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        self.push_response(ProviderResponse::text(text))
    }

    /// Queue an error.
    pub fn push_error(&self, error: ProviderError) -> &Self {
        lock(&self.queue).push_back(Err(error));
        self
    }

    /// Answer every prompt containing `marker` with `result`.
    pub fn route(&self, marker: impl Into<String>, result: Scripted) -> &Self {
        lock(&self.routes).push((marker.into(), result));
        self
    }

    /// Number of generate calls received.
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Copies of every request received, in arrival order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ProviderResponse, ProviderError> {
        lock(&self.requests).push(request.clone());

        let routed = lock(&self.routes)
            .iter()
            .find(|(marker, _)| request.prompt.contains(marker.as_str()))
            .map(|(_, result)| result.clone());
        if let Some(result) = routed {
            return result;
        }

        lock(&self.queue).pop_front().unwrap_or_else(|| {
            Err(ProviderError::Api(
                "mock provider has no scripted response".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_order_and_exhaustion() {
        let mock = MockProvider::new();
        mock.push_text("first")
            .push_error(ProviderError::Network("reset".into()));

        let req = GenerateRequest::new("anything");
        assert_eq!(mock.generate(&req).await.unwrap().text.as_deref(), Some("first"));
        assert!(matches!(mock.generate(&req).await, Err(ProviderError::Network(_))));
        assert!(matches!(mock.generate(&req).await, Err(ProviderError::Api(_))));
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_routes_take_precedence_and_repeat() {
        let mock = MockProvider::new();
        mock.route("knowledge graph", Ok(ProviderResponse::text("{}")))
            .push_text("queued");

        let graph = GenerateRequest::new("Build a knowledge graph");
        assert_eq!(mock.generate(&graph).await.unwrap().text.as_deref(), Some("{}"));
        assert_eq!(mock.generate(&graph).await.unwrap().text.as_deref(), Some("{}"));

        let other = GenerateRequest::new("Something else");
        assert_eq!(mock.generate(&other).await.unwrap().text.as_deref(), Some("queued"));
        assert_eq!(mock.requests()[2].prompt, "Something else");
    }
}
