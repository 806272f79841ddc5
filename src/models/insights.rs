//! Synthesis outputs that accompany a comparison.

use serde::{Deserialize, Serialize};

/// An open research question identified across the selected papers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchGap {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Concrete direction a follow-up study could take
    #[serde(default)]
    pub suggested_direction: String,
}

/// Short cross-paper takeaways, most important first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInsights {
    #[serde(default)]
    pub insights: Vec<String>,
}

impl KeyInsights {
    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }
}
