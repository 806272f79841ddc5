//! Result of the concurrent multi-request analysis.

use serde::{Deserialize, Serialize};

use super::{ErrorKind, ResearchError};
use crate::models::{ComparisonResult, KeyInsights, KnowledgeGraphData, ResearchGap};

/// How failures of the independent analysis requests combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinPolicy {
    /// Only the structured comparison is required; other sections report
    /// their own failure
    #[default]
    Partial,
    /// Any failed request fails the whole analysis
    AllOrNothing,
}

/// Why a section could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionError {
    pub kind: ErrorKind,
    pub message: String,
}

/// One optional part of an [`Analysis`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "camelCase")]
pub enum Section<T> {
    Ready(T),
    Failed(SectionError),
}

impl<T> Section<T> {
    pub(crate) fn from_result(name: &str, result: Result<T, ResearchError>) -> Self {
        match result {
            Ok(value) => Section::Ready(value),
            Err(err) => {
                tracing::warn!(section = name, kind = %err.kind(), "Analysis section failed: {}", err);
                Section::Failed(SectionError {
                    kind: err.kind(),
                    message: err.to_string(),
                })
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SectionError> {
        match self {
            Section::Ready(_) => None,
            Section::Failed(err) => Some(err),
        }
    }
}

/// Everything produced for one compare action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub comparison: ComparisonResult,
    pub knowledge_graph: Section<KnowledgeGraphData>,
    pub report: Section<String>,
    pub insights: Section<KeyInsights>,
    pub gaps: Section<Vec<ResearchGap>>,
}

impl Analysis {
    /// Sections that failed, by name
    pub fn failures(&self) -> Vec<(&'static str, &SectionError)> {
        [
            ("knowledge graph", self.knowledge_graph.error()),
            ("report", self.report.error()),
            ("insights", self.insights.error()),
            ("research gaps", self.gaps.error()),
        ]
        .into_iter()
        .filter_map(|(name, err)| err.map(|e| (name, e)))
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }
}
