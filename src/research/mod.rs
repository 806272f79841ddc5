//! Request orchestration for the research assistant.
//!
//! Every operation follows the same path: build a prompt and a declared
//! response shape, run the provider call through the retry wrapper, normalize
//! the raw response, then reshape the JSON into the UI model.
//!
//! - [`ResearchAssistant`]: search, compare, knowledge graph, topics and the
//!   richer report/insight/gap analyses, plus the concurrent [`Analysis`]
//! - [`normalize_text`] / [`normalize_json`]: classify raw provider responses
//! - [`ResearchError`]: the error taxonomy surfaced to callers

mod analysis;
mod assistant;
mod normalize;
pub mod prompts;
pub mod schema;

pub use analysis::{Analysis, JoinPolicy, Section, SectionError};
pub use assistant::{ResearchAssistant, MIN_PAPERS_FOR_ANALYSIS};
pub use normalize::{normalize_json, normalize_text, parse_json};

use serde::{Deserialize, Serialize};

use crate::models::DanglingLink;
use crate::provider::ProviderError;
use crate::utils::RetryError;

/// Stable classification of a [`ResearchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Validation,
    BlockedContent,
    AbnormalTermination,
    EmptyResponse,
    MalformedJson,
    ProviderUnavailable,
    InvalidGraph,
    Provider,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::BlockedContent => "blocked-content",
            ErrorKind::AbnormalTermination => "abnormal-termination",
            ErrorKind::EmptyResponse => "empty-response",
            ErrorKind::MalformedJson => "malformed-json",
            ErrorKind::ProviderUnavailable => "provider-unavailable",
            ErrorKind::InvalidGraph => "invalid-graph",
            ErrorKind::Provider => "provider",
        };
        f.write_str(name)
    }
}

/// Errors surfaced to the UI layer. Every message is fit for direct display.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    /// A local precondition failed; no provider call was made
    #[error("{0}")]
    Validation(String),

    /// The provider's safety filter rejected the request
    #[error("The request was blocked by the provider's safety filter (reason: {reason}{})", format_categories(.categories))]
    BlockedContent {
        reason: String,
        categories: Vec<String>,
    },

    /// Generation stopped before completing
    #[error("The provider stopped generating early (reason: {reason})")]
    AbnormalTermination { reason: String },

    /// The provider returned no text at all
    #[error("The provider returned an empty response")]
    EmptyResponse,

    /// The returned text did not contain the expected JSON
    #[error("The provider returned a malformed response: {message}")]
    MalformedJson { message: String, raw: String },

    /// Transient overload persisted past the retry budget
    #[error("The provider is overloaded and did not recover after {attempts} attempts")]
    ProviderUnavailable { attempts: u32 },

    /// The knowledge graph references nodes it does not declare
    #[error("The provider returned an inconsistent knowledge graph: {0}")]
    InvalidGraph(#[from] DanglingLink),

    /// A non-transient transport or API failure
    #[error("The provider request failed: {0}")]
    Provider(#[source] ProviderError),
}

fn format_categories(categories: &[String]) -> String {
    if categories.is_empty() {
        String::new()
    } else {
        format!("; categories: {}", categories.join(", "))
    }
}

impl ResearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResearchError::Validation(_) => ErrorKind::Validation,
            ResearchError::BlockedContent { .. } => ErrorKind::BlockedContent,
            ResearchError::AbnormalTermination { .. } => ErrorKind::AbnormalTermination,
            ResearchError::EmptyResponse => ErrorKind::EmptyResponse,
            ResearchError::MalformedJson { .. } => ErrorKind::MalformedJson,
            ResearchError::ProviderUnavailable { .. } => ErrorKind::ProviderUnavailable,
            ResearchError::InvalidGraph(_) => ErrorKind::InvalidGraph,
            ResearchError::Provider(_) => ErrorKind::Provider,
        }
    }

    /// What the user can do about this error
    pub fn remediation(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "Adjust the input and try again.",
            ErrorKind::BlockedContent => "Rephrase the query.",
            ErrorKind::AbnormalTermination | ErrorKind::EmptyResponse => {
                "Try again, or narrow the request."
            }
            ErrorKind::ProviderUnavailable => "Wait a moment and try again.",
            ErrorKind::MalformedJson | ErrorKind::InvalidGraph => {
                "Try again; report a bug if this keeps happening."
            }
            ErrorKind::Provider => "Check the provider configuration and network.",
        }
    }

    /// Raw provider text captured for diagnostics, if any
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ResearchError::MalformedJson { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<RetryError> for ResearchError {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Exhausted { attempts, .. } => ResearchError::ProviderUnavailable { attempts },
            RetryError::Permanent(error) => ResearchError::Provider(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_message_lists_categories() {
        let err = ResearchError::BlockedContent {
            reason: "SAFETY".into(),
            categories: vec!["HARM_CATEGORY_HARASSMENT".into()],
        };
        assert_eq!(
            err.to_string(),
            "The request was blocked by the provider's safety filter (reason: SAFETY; categories: HARM_CATEGORY_HARASSMENT)"
        );

        let bare = ResearchError::BlockedContent {
            reason: "OTHER".into(),
            categories: vec![],
        };
        assert!(bare.to_string().ends_with("(reason: OTHER)"));
    }

    #[test]
    fn test_retry_error_mapping() {
        let exhausted: ResearchError = RetryError::Exhausted {
            attempts: 3,
            last: ProviderError::Api("overloaded".into()),
        }
        .into();
        assert_eq!(exhausted.kind(), ErrorKind::ProviderUnavailable);
        assert!(!exhausted.to_string().contains("overloaded"));

        let permanent: ResearchError =
            RetryError::Permanent(ProviderError::Network("refused".into())).into();
        assert_eq!(permanent.kind(), ErrorKind::Provider);
    }

    #[test]
    fn test_every_kind_has_distinct_name() {
        let kinds = [
            ErrorKind::Validation,
            ErrorKind::BlockedContent,
            ErrorKind::AbnormalTermination,
            ErrorKind::EmptyResponse,
            ErrorKind::MalformedJson,
            ErrorKind::ProviderUnavailable,
            ErrorKind::InvalidGraph,
            ErrorKind::Provider,
        ];
        let names: std::collections::HashSet<String> =
            kinds.iter().map(|k| k.to_string()).collect();
        assert_eq!(names.len(), kinds.len());
        assert_eq!(
            serde_json::to_value(ErrorKind::MalformedJson).unwrap(),
            "malformed-json"
        );
    }
}
