//! Core data models for papers and the analyses built on them.

mod comparison;
mod graph;
mod insights;
mod paper;
mod search;

pub use comparison::{
    ComparisonAspect, ComparisonPoint, ComparisonResult, WireAspect, WireComparison, WirePoint,
    NOT_APPLICABLE,
};
pub use graph::{DanglingLink, GraphLink, GraphNode, KnowledgeGraphData};
pub use insights::{KeyInsights, ResearchGap};
pub use paper::{Paper, PaperBuilder, WirePaper};
pub use search::{SearchRequest, DEFAULT_MAX_RESULTS, SYSTEMATIC_MAX_RESULTS};
