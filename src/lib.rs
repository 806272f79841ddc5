//! # Scholar Lens
//!
//! An LLM-backed research assistant: find papers on a topic, compare a
//! selection of them side by side, map their concepts into a knowledge graph
//! and suggest where to look next.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Paper, ComparisonResult, KnowledgeGraphData, etc.)
//! - [`provider`]: Generative-AI backends behind the [`Provider`] trait
//! - [`research`]: Prompting, response normalization and request orchestration
//! - [`utils`]: JSON extraction, retry with backoff and the shared HTTP client
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal rendering for the CLI

pub mod config;
pub mod models;
pub mod provider;
pub mod research;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{ComparisonResult, KnowledgeGraphData, Paper, SearchRequest};
pub use provider::{Provider, ProviderError};
pub use research::{ResearchAssistant, ResearchError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
