//! Paper model representing a research paper returned by a search.

use serde::{Deserialize, Serialize};

/// A research paper as presented to the user.
///
/// Papers are created from a search response and never mutated afterwards.
/// Identifiers are either supplied by the provider or synthesized locally
/// when the provider leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Unique identifier within one search session
    pub id: String,

    /// Paper title
    pub title: String,

    /// Ordered author names
    #[serde(default)]
    pub authors: Vec<String>,

    /// Publication year
    #[serde(default)]
    pub year: i32,

    /// Abstract text
    #[serde(default)]
    pub r#abstract: String,

    /// Citation count
    #[serde(default)]
    pub citation_count: u32,

    /// One-sentence synopsis
    #[serde(default)]
    pub tldr: String,
}

impl Paper {
    /// Create a new paper with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            r#abstract: String::new(),
            year: 0,
            citation_count: 0,
            tldr: String::new(),
        }
    }

    /// Authors joined for display
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }

    /// Compact label such as `"Vaswani et al. (2017)"`, used as a column header
    pub fn short_label(&self) -> String {
        let lead = match self.authors.as_slice() {
            [] => "Unknown".to_string(),
            [only] => surname(only).to_string(),
            [first, second] => format!("{} & {}", surname(first), surname(second)),
            [first, ..] => format!("{} et al.", surname(first)),
        };

        if self.year > 0 {
            format!("{} ({})", lead, self.year)
        } else {
            lead
        }
    }
}

fn surname(name: &str) -> &str {
    name.split_whitespace().last().unwrap_or(name)
}

/// Paper record as declared in the search response schema.
///
/// Every field is optional on the wire; the orchestrator fills in the
/// identifier and the serde defaults cover the rest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePaper {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub r#abstract: String,
    #[serde(default)]
    pub citation_count: Option<u32>,
    #[serde(default)]
    pub tldr: String,
}

impl WirePaper {
    /// Convert into a [`Paper`], using `fallback_id` when the provider sent no usable id
    pub fn into_paper(self, fallback_id: impl FnOnce() -> String) -> Paper {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => fallback_id(),
        };

        Paper {
            id,
            title: self.title,
            authors: self.authors,
            year: self.year,
            r#abstract: self.r#abstract,
            citation_count: self.citation_count.unwrap_or(0),
            tldr: self.tldr,
        }
    }
}

/// Builder for constructing Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a new builder with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            paper: Paper::new(id, title),
        }
    }

    /// Set authors
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paper.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Set publication year
    pub fn year(mut self, year: i32) -> Self {
        self.paper.year = year;
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.paper.r#abstract = abstract_text.into();
        self
    }

    /// Set citation count
    pub fn citations(mut self, count: u32) -> Self {
        self.paper.citation_count = count;
        self
    }

    /// Set the one-sentence synopsis
    pub fn tldr(mut self, tldr: impl Into<String>) -> Self {
        self.paper.tldr = tldr.into();
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_builder() {
        let paper = PaperBuilder::new("p1", "Attention Is All You Need")
            .authors(["Ashish Vaswani", "Noam Shazeer"])
            .year(2017)
            .abstract_text("The dominant sequence transduction models...")
            .citations(90000)
            .tldr("Transformers replace recurrence with attention.")
            .build();

        assert_eq!(paper.id, "p1");
        assert_eq!(paper.authors.len(), 2);
        assert_eq!(paper.year, 2017);
        assert_eq!(paper.citation_count, 90000);
    }

    #[test]
    fn test_short_label() {
        let solo = PaperBuilder::new("a", "A").authors(["Yoshua Bengio"]).year(2003).build();
        assert_eq!(solo.short_label(), "Bengio (2003)");

        let pair = PaperBuilder::new("b", "B")
            .authors(["Diederik Kingma", "Jimmy Ba"])
            .year(2014)
            .build();
        assert_eq!(pair.short_label(), "Kingma & Ba (2014)");

        let many = PaperBuilder::new("c", "C")
            .authors(["Ashish Vaswani", "Noam Shazeer", "Niki Parmar"])
            .year(2017)
            .build();
        assert_eq!(many.short_label(), "Vaswani et al. (2017)");

        assert_eq!(Paper::new("d", "D").short_label(), "Unknown");
    }

    #[test]
    fn test_wire_paper_defaults() {
        let wire: WirePaper = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        let paper = wire.into_paper(|| "local-0".to_string());

        assert_eq!(paper.id, "local-0");
        assert_eq!(paper.citation_count, 0);
        assert!(paper.authors.is_empty());
    }

    #[test]
    fn test_wire_paper_keeps_provider_id() {
        let wire: WirePaper =
            serde_json::from_str(r#"{"id": "arxiv:1706.03762", "title": "T", "citationCount": 7}"#)
                .unwrap();
        let paper = wire.into_paper(|| unreachable!());

        assert_eq!(paper.id, "arxiv:1706.03762");
        assert_eq!(paper.citation_count, 7);
    }

    #[test]
    fn test_blank_provider_id_is_replaced() {
        let wire: WirePaper = serde_json::from_str(r#"{"id": "  ", "title": "T"}"#).unwrap();
        assert_eq!(wire.into_paper(|| "local-3".into()).id, "local-3");
    }
}
