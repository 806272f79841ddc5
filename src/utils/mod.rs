//! Utility modules supporting provider calls.
//!
//! - [`extract_json_text`]: Locate a JSON value inside free-form model output
//! - [`HttpClient`]: Shared reqwest client with timeouts and user agent
//! - [`RetryConfig`]: Configuration for retry logic with exponential backoff
//! - [`with_retry`]: Execute a provider call with retry on transient overload
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use scholar_lens::provider::{GenerateRequest, MockProvider, Provider, ProviderResponse};
//! use scholar_lens::utils::{with_retry, RetryConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MockProvider::new();
//! provider.push_response(ProviderResponse::text("[]"));
//! let request = GenerateRequest::new("List papers about attention");
//!
//! let config = RetryConfig::default().max_attempts(3);
//! let _response = with_retry(config, || provider.generate(&request)).await?;
//! # Ok(())
//! # }
//! ```

mod extract;
mod http;
mod retry;

pub use extract::extract_json_text;
pub use http::HttpClient;
pub use retry::{
    is_transient, is_transient_message, with_retry, with_retry_detailed, RetryAttempt,
    RetryConfig, RetryError, RetryOutcome, TRANSIENT_MARKERS,
};
