//! Search request model.

use serde::{Deserialize, Serialize};

/// Default number of papers asked for in a regular search
pub const DEFAULT_MAX_RESULTS: usize = 6;

/// Number of papers asked for in systematic-review mode
pub const SYSTEMATIC_MAX_RESULTS: usize = 12;

/// Topic search parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Free-text topic query
    pub query: String,

    /// Ask for review-grade inclusion (peer-reviewed, explicit methodology)
    #[serde(default)]
    pub systematic_review: bool,

    /// Upper bound on papers requested from the provider
    pub max_results: usize,
}

impl SearchRequest {
    /// Create a regular search
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            systematic_review: false,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Switch to systematic-review mode, raising the default result count
    pub fn systematic(mut self, enabled: bool) -> Self {
        self.systematic_review = enabled;
        if enabled && self.max_results == DEFAULT_MAX_RESULTS {
            self.max_results = SYSTEMATIC_MAX_RESULTS;
        }
        self
    }

    /// Set max results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}
