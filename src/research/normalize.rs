//! Classification of raw provider responses.
//!
//! The checks run in a fixed order: safety block, abnormal termination, empty
//! text, then JSON extraction. A blocked request must never be reported as an
//! empty or malformed response, because the user's remedy differs.

use serde::de::DeserializeOwned;

use super::ResearchError;
use crate::provider::ProviderResponse;
use crate::utils::extract_json_text;

/// Return the text payload of a response, or the classified failure
pub fn normalize_text(response: ProviderResponse) -> Result<String, ResearchError> {
    if let Some(block) = response.block {
        return Err(ResearchError::BlockedContent {
            reason: block.reason,
            categories: block.categories,
        });
    }

    if !response.finished_normally() {
        return Err(ResearchError::AbnormalTermination {
            reason: response.finish_reason.unwrap_or_default(),
        });
    }

    match response.text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ResearchError::EmptyResponse),
    }
}

/// Return the response's embedded JSON, deserialized into `T`
pub fn normalize_json<T: DeserializeOwned>(response: ProviderResponse) -> Result<T, ResearchError> {
    let text = normalize_text(response)?;
    parse_json(&text)
}

/// Extract and deserialize the JSON value embedded in `text`.
///
/// Both syntax errors and shape mismatches are `MalformedJson`, carrying the
/// full original text.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ResearchError> {
    let span = extract_json_text(text);

    serde_json::from_str(span).map_err(|e| {
        tracing::debug!(error = %e, raw_len = text.len(), "Provider output did not parse");
        ResearchError::MalformedJson {
            message: e.to_string(),
            raw: text.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::ErrorKind;

    #[test]
    fn test_block_wins_over_text() {
        let mut response = ProviderResponse::blocked("SAFETY", vec!["HARM_CATEGORY_HATE_SPEECH".into()]);
        response.text = Some("{\"ok\": true}".into());
        response.finish_reason = Some("MAX_TOKENS".into());

        let err = normalize_json::<serde_json::Value>(response).unwrap_err();
        match err {
            ResearchError::BlockedContent { reason, categories } => {
                assert_eq!(reason, "SAFETY");
                assert_eq!(categories, vec!["HARM_CATEGORY_HATE_SPEECH"]);
            }
            other => panic!("expected BlockedContent, got {:?}", other),
        }
    }

    #[test]
    fn test_abnormal_termination_before_empty() {
        let response = ProviderResponse {
            text: None,
            finish_reason: Some("RECITATION".into()),
            block: None,
        };
        let err = normalize_text(response).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AbnormalTermination);
        assert!(err.to_string().contains("RECITATION"));
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(
            normalize_text(ProviderResponse::default()).unwrap_err().kind(),
            ErrorKind::EmptyResponse
        );
        assert_eq!(
            normalize_text(ProviderResponse::text("  \n")).unwrap_err().kind(),
            ErrorKind::EmptyResponse
        );
    }

    #[test]
    fn test_malformed_json_keeps_raw_text() {
        let err =
            normalize_json::<serde_json::Value>(ProviderResponse::text("Sorry, I cannot help."))
                .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedJson);
        assert_eq!(err.raw_response(), Some("Sorry, I cannot help."));
    }

    #[test]
    fn test_shape_mismatch_is_malformed() {
        #[derive(Debug, serde::Deserialize)]
        struct Topics {
            #[allow(dead_code)]
            topics: Vec<String>,
        }

        let err = normalize_json::<Topics>(ProviderResponse::text("{\"topics\": 5}")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedJson);
    }

    #[test]
    fn test_fenced_success() {
        let value: Vec<u32> =
            normalize_json(ProviderResponse::text("Here:\n```json\n[1, 2]\n```")).unwrap();
        assert_eq!(value, vec![1, 2]);
    }
}
