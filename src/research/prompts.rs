//! Prompt construction for each provider request.

use crate::models::{Paper, SearchRequest};

/// Render the papers as a numbered context block, one record per paper
pub fn paper_context(papers: &[Paper]) -> String {
    papers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "[{}] Paper ID: {}\nTitle: {}\nAuthors: {}\nYear: {}\nAbstract: {}",
                i + 1,
                p.id,
                p.title,
                if p.authors.is_empty() {
                    "Unknown".to_string()
                } else {
                    p.author_line()
                },
                p.year,
                p.r#abstract
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Search prompt. Grounded requests cannot use schema-constrained output, so
/// the expected shape is spelled out in the text.
pub fn search(request: &SearchRequest) -> String {
    let mode = if request.systematic_review {
        "You are assisting with a systematic literature review. Include only \
         peer-reviewed studies with an explicit methodology, prefer primary \
         research over commentary, and cover the topic's major lines of work."
    } else {
        "Find the most relevant and influential research papers on the topic."
    };

    format!(
        "{mode}\n\n\
         Topic: \"{query}\"\n\n\
         Return up to {max} real, verifiable papers. Respond with ONLY a JSON array, no prose. \
         Each element must be an object with these fields:\n\
         - \"id\": a stable identifier such as a DOI or arXiv id, if known\n\
         - \"title\": string\n\
         - \"authors\": array of author names in publication order\n\
         - \"year\": publication year as an integer\n\
         - \"abstract\": the paper's abstract\n\
         - \"citationCount\": integer, 0 if unknown\n\
         - \"tldr\": a one-sentence summary",
        mode = mode,
        query = request.query.trim(),
        max = request.max_results,
    )
}

pub fn comparison(papers: &[Paper]) -> String {
    format!(
        "Compare the following research papers.\n\n{context}\n\n\
         Produce:\n\
         - \"summary\": an executive summary of how the papers relate\n\
         - \"aspects\": comparison dimensions (for example Methodology, Dataset, Key Findings, \
         Limitations). For every aspect, list one point per paper that addresses it, using the \
         exact Paper ID as \"paperId\", a concise \"value\", a \"confidence\" between 0 and 1, \
         and a supporting \"source\" sentence from the abstract. Omit a paper from an aspect \
         when the aspect does not apply to it.\n\
         - \"synthesis\": an overall synthesis across papers\n\
         - \"researchGaps\": open questions none of the papers answer\n\
         - \"hypothesis\": optionally, one testable hypothesis suggested by the comparison",
        context = paper_context(papers)
    )
}

pub fn knowledge_graph(papers: &[Paper]) -> String {
    format!(
        "Extract a knowledge graph from the following research papers.\n\n{context}\n\n\
         Nodes are papers, methods, datasets and concepts; use \"group\" values \"paper\", \
         \"method\", \"dataset\" or \"concept\". Give each node a short unique \"id\" and a \
         human-readable \"label\". Links connect node ids with a relationship \"label\" \
         (such as \"introduces\", \"evaluates on\", \"extends\") and a \"strength\" between \
         0 and 1. Every link source and target MUST be the id of a node you declared.",
        context = paper_context(papers)
    )
}

pub fn detailed_report(papers: &[Paper]) -> String {
    format!(
        "Write a detailed comparative research report in Markdown on the following papers.\n\n\
         {context}\n\n\
         Use sections for Background, Methods Compared, Results, Strengths and Weaknesses, \
         and Conclusion. Cite papers by their title.",
        context = paper_context(papers)
    )
}

pub fn key_insights(papers: &[Paper]) -> String {
    format!(
        "List the most important cross-paper insights from the following research papers, \
         most important first, each as one sentence.\n\n{context}",
        context = paper_context(papers)
    )
}

pub fn research_gaps(papers: &[Paper]) -> String {
    format!(
        "Identify research gaps left open by the following papers. For each gap give a short \
         \"title\", a \"description\" of what is missing, and a \"suggestedDirection\" for a \
         follow-up study.\n\n{context}",
        context = paper_context(papers)
    )
}

pub fn topics(query: &str, titles: &[&str]) -> String {
    let listing = titles
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "A user searched for \"{query}\" and found these papers:\n{listing}\n\n\
         Suggest 5 broader or adjacent research topics worth exploring next, as a JSON array \
         of short strings.",
        query = query.trim(),
        listing = listing
    )
}
