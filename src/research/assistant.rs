//! The research assistant: one method per user action.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::analysis::{Analysis, JoinPolicy, Section};
use super::normalize::{normalize_json, normalize_text};
use super::{prompts, schema, ResearchError};
use crate::models::{
    ComparisonResult, KeyInsights, KnowledgeGraphData, Paper, ResearchGap, SearchRequest,
    WireComparison, WirePaper,
};
use crate::provider::{GenerateRequest, Provider, ProviderResponse, ProviderTool};
use crate::utils::{with_retry, RetryConfig};

/// Papers required by compare, graph and the other multi-paper analyses
pub const MIN_PAPERS_FOR_ANALYSIS: usize = 2;

/// Search results, either as declared or wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum PapersPayload {
    List(Vec<WirePaper>),
    Wrapped { papers: Vec<WirePaper> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TopicsPayload {
    List(Vec<String>),
    Wrapped { topics: Vec<String> },
}

#[derive(Deserialize)]
struct GapsPayload {
    #[serde(default)]
    gaps: Vec<ResearchGap>,
}

/// Orchestrates provider requests for each user action.
///
/// The provider is injected; the assistant holds no other state, so one
/// instance can serve any number of concurrent calls.
#[derive(Debug)]
pub struct ResearchAssistant<P: Provider + ?Sized = dyn Provider> {
    provider: Arc<P>,
    retry: RetryConfig,
    join_policy: JoinPolicy,
    temperature: f32,
}

impl<P: Provider + ?Sized> Clone for ResearchAssistant<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            retry: self.retry,
            join_policy: self.join_policy,
            temperature: self.temperature,
        }
    }
}

impl<P: Provider + ?Sized> ResearchAssistant<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            retry: RetryConfig::default(),
            join_policy: JoinPolicy::default(),
            temperature: 0.2,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_join_policy(mut self, policy: JoinPolicy) -> Self {
        self.join_policy = policy;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn join_policy(&self) -> JoinPolicy {
        self.join_policy
    }

    fn request(&self, prompt: String) -> GenerateRequest {
        GenerateRequest::new(prompt).temperature(self.temperature)
    }

    async fn call(&self, request: GenerateRequest) -> Result<ProviderResponse, ResearchError> {
        let provider: &P = &self.provider;
        let request = &request;

        tracing::debug!(provider = provider.name(), "Calling provider");
        Ok(with_retry(self.retry, move || provider.generate(request)).await?)
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        request: GenerateRequest,
    ) -> Result<T, ResearchError> {
        normalize_json(self.call(request).await?)
    }

    /// Find papers for a topic.
    ///
    /// Papers without a usable or unique id get `paper-<unix millis>-<index>`.
    /// An empty provider response means nothing was found and yields an empty
    /// list.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<Paper>, ResearchError> {
        if request.query.trim().is_empty() {
            return Err(ResearchError::Validation(
                "Enter a topic to search for.".to_string(),
            ));
        }

        let generate = self
            .request(prompts::search(request))
            .schema(schema::papers())
            .tool(ProviderTool::WebSearch);

        let wire = match self.call_json::<PapersPayload>(generate).await {
            Ok(PapersPayload::List(papers)) | Ok(PapersPayload::Wrapped { papers }) => papers,
            Err(ResearchError::EmptyResponse) => {
                tracing::warn!(query = request.query.as_str(), "Provider returned no papers");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let stamp = chrono::Utc::now().timestamp_millis();
        let mut seen = HashSet::new();
        let papers: Vec<Paper> = wire
            .into_iter()
            .take(request.max_results)
            .enumerate()
            .map(|(index, wire)| {
                let mut paper = wire.into_paper(|| synthesized_id(stamp, index));
                if !seen.insert(paper.id.clone()) {
                    paper.id = synthesized_id(stamp, index);
                    seen.insert(paper.id.clone());
                }
                paper
            })
            .collect();

        tracing::info!(
            query = request.query.as_str(),
            systematic = request.systematic_review,
            count = papers.len(),
            "Search completed"
        );
        Ok(papers)
    }

    /// Structured comparison of two or more papers
    pub async fn compare(&self, papers: &[Paper]) -> Result<ComparisonResult, ResearchError> {
        ensure_comparable(papers)?;

        let generate = self
            .request(prompts::comparison(papers))
            .schema(schema::comparison());
        let wire: WireComparison = self.call_json(generate).await?;

        let ids: HashSet<&str> = papers.iter().map(|p| p.id.as_str()).collect();
        Ok(wire.into_result(&ids))
    }

    /// Knowledge graph over two or more papers; dangling links are rejected
    pub async fn build_knowledge_graph(
        &self,
        papers: &[Paper],
    ) -> Result<KnowledgeGraphData, ResearchError> {
        ensure_comparable(papers)?;

        let generate = self
            .request(prompts::knowledge_graph(papers))
            .schema(schema::knowledge_graph());
        let graph: KnowledgeGraphData = self.call_json(generate).await?;

        graph.validate()?;
        Ok(graph)
    }

    /// Broader topics to explore next; no provider call when `papers` is empty
    pub async fn suggest_topics(
        &self,
        query: &str,
        papers: &[Paper],
    ) -> Result<Vec<String>, ResearchError> {
        if papers.is_empty() {
            return Ok(Vec::new());
        }

        let titles: Vec<&str> = papers.iter().map(|p| p.title.as_str()).collect();
        let generate = self
            .request(prompts::topics(query, &titles))
            .schema(schema::topics());

        let topics = match self.call_json::<TopicsPayload>(generate).await? {
            TopicsPayload::List(topics) | TopicsPayload::Wrapped { topics } => topics,
        };

        Ok(topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect())
    }

    /// Long-form Markdown report
    pub async fn detailed_report(&self, papers: &[Paper]) -> Result<String, ResearchError> {
        ensure_comparable(papers)?;

        let generate = self.request(prompts::detailed_report(papers));
        normalize_text(self.call(generate).await?)
    }

    pub async fn key_insights(&self, papers: &[Paper]) -> Result<KeyInsights, ResearchError> {
        ensure_comparable(papers)?;

        let generate = self
            .request(prompts::key_insights(papers))
            .schema(schema::key_insights());
        self.call_json(generate).await
    }

    pub async fn research_gaps(&self, papers: &[Paper]) -> Result<Vec<ResearchGap>, ResearchError> {
        ensure_comparable(papers)?;

        let generate = self
            .request(prompts::research_gaps(papers))
            .schema(schema::research_gaps());
        let payload: GapsPayload = self.call_json(generate).await?;
        Ok(payload.gaps)
    }

    /// Run every analysis for `papers` concurrently.
    ///
    /// Validation happens once, before any request is sent. All requests run
    /// to completion; the join policy then decides whether a failed section
    /// fails the whole analysis. The structured comparison is always required.
    pub async fn analyze(&self, papers: &[Paper]) -> Result<Analysis, ResearchError> {
        ensure_comparable(papers)?;

        let (comparison, graph, report, insights, gaps) = futures_util::join!(
            self.compare(papers),
            self.build_knowledge_graph(papers),
            self.detailed_report(papers),
            self.key_insights(papers),
            self.research_gaps(papers),
        );

        let analysis = match self.join_policy {
            JoinPolicy::AllOrNothing => Analysis {
                comparison: comparison?,
                knowledge_graph: Section::Ready(graph?),
                report: Section::Ready(report?),
                insights: Section::Ready(insights?),
                gaps: Section::Ready(gaps?),
            },
            JoinPolicy::Partial => Analysis {
                comparison: comparison?,
                knowledge_graph: Section::from_result("knowledge graph", graph),
                report: Section::from_result("report", report),
                insights: Section::from_result("insights", insights),
                gaps: Section::from_result("research gaps", gaps),
            },
        };

        tracing::info!(
            papers = papers.len(),
            failed_sections = analysis.failures().len(),
            "Analysis completed"
        );
        Ok(analysis)
    }
}

fn synthesized_id(stamp: i64, index: usize) -> String {
    format!("paper-{}-{}", stamp, index)
}

fn ensure_comparable(papers: &[Paper]) -> Result<(), ResearchError> {
    if papers.len() < MIN_PAPERS_FOR_ANALYSIS {
        return Err(ResearchError::Validation(format!(
            "Select at least {} papers to compare ({} selected).",
            MIN_PAPERS_FOR_ANALYSIS,
            papers.len()
        )));
    }
    Ok(())
}
