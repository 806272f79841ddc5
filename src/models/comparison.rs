//! Comparison models: the list-based wire shape and the keyed UI shape.
//!
//! The declared response schema carries per-paper points as a list, because
//! schema-constrained generation does not support maps with dynamic keys. The
//! UI needs lookup by paper id, so [`WireComparison::into_result`] reshapes
//! every aspect's list into a map.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Text shown for a paper that has no point in an aspect.
pub const NOT_APPLICABLE: &str = "N/A";

/// One paper's position on one aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPoint {
    /// Short finding for this paper
    pub value: String,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Supporting sentence taken from the paper
    pub source: String,
}

/// A named dimension of comparison applied across all selected papers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonAspect {
    pub name: String,
    /// Points keyed by paper id; a missing key means "not applicable"
    pub points: HashMap<String, ComparisonPoint>,
}

/// Structured comparison of a set of papers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub summary: String,
    pub aspects: Vec<ComparisonAspect>,
    pub synthesis: String,
    pub research_gaps: Vec<String>,
    pub hypothesis: Option<String>,
}

impl ComparisonResult {
    /// Look up the point for `paper_id` in the aspect named `aspect`
    pub fn point(&self, aspect: &str, paper_id: &str) -> Option<&ComparisonPoint> {
        self.aspects
            .iter()
            .find(|a| a.name == aspect)
            .and_then(|a| a.points.get(paper_id))
    }

    /// Value to render in a comparison table cell
    pub fn display_value(&self, aspect: &str, paper_id: &str) -> &str {
        self.point(aspect, paper_id)
            .map(|p| p.value.as_str())
            .unwrap_or(NOT_APPLICABLE)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePoint {
    #[serde(default)]
    pub paper_id: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAspect {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub points: Vec<WirePoint>,
}

/// Comparison payload as declared in the request schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireComparison {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub aspects: Vec<WireAspect>,
    #[serde(default)]
    pub synthesis: String,
    #[serde(default)]
    pub research_gaps: Vec<String>,
    #[serde(default)]
    pub hypothesis: Option<String>,
}

impl WireComparison {
    /// Reshape into the keyed UI model.
    ///
    /// Only points for ids in `paper_ids` are kept, and the first point wins
    /// when a paper appears twice in one aspect. Aspect order is preserved.
    pub fn into_result(self, paper_ids: &HashSet<&str>) -> ComparisonResult {
        let aspects = self
            .aspects
            .into_iter()
            .map(|aspect| {
                let mut points = HashMap::with_capacity(aspect.points.len());
                for point in aspect.points {
                    if !paper_ids.contains(point.paper_id.as_str()) {
                        tracing::warn!(
                            aspect = aspect.name.as_str(),
                            paper_id = point.paper_id.as_str(),
                            "Dropping comparison point for unknown paper"
                        );
                        continue;
                    }
                    points.entry(point.paper_id).or_insert(ComparisonPoint {
                        value: point.value,
                        confidence: clamp_confidence(point.confidence),
                        source: point.source,
                    });
                }
                ComparisonAspect {
                    name: aspect.name,
                    points,
                }
            })
            .collect();

        ComparisonResult {
            summary: self.summary,
            aspects,
            synthesis: self.synthesis,
            research_gaps: self.research_gaps,
            hypothesis: self.hypothesis.filter(|h| !h.trim().is_empty()),
        }
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
