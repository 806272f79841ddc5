//! Knowledge-graph data extracted from a set of papers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A concept, method, dataset or paper in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    /// Category tag such as `"paper"`, `"method"` or `"concept"`
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub label: String,
}

/// A directed, labelled relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub strength: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGraphData {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub links: Vec<GraphLink>,
}

/// A link whose endpoint does not name any node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("knowledge graph link {from} -> {to} references unknown node '{missing}'")]
pub struct DanglingLink {
    pub from: String,
    pub to: String,
    pub missing: String,
}

impl KnowledgeGraphData {
    /// Check that every link endpoint resolves to a declared node.
    ///
    /// Reports the first offending link in declaration order.
    pub fn validate(&self) -> Result<(), DanglingLink> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();

        for link in &self.links {
            let missing = if !ids.contains(link.source.as_str()) {
                &link.source
            } else if !ids.contains(link.target.as_str()) {
                &link.target
            } else {
                continue;
            };

            return Err(DanglingLink {
                from: link.source.clone(),
                to: link.target.clone(),
                missing: missing.clone(),
            });
        }

        Ok(())
    }

    /// Node count per category, sorted by category name
    pub fn group_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.group.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Display label for a node id, falling back to the id itself
    pub fn label_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .map(|n| if n.label.is_empty() { n.id.as_str() } else { n.label.as_str() })
            .unwrap_or(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(links: serde_json::Value) -> KnowledgeGraphData {
        serde_json::from_value(serde_json::json!({
            "nodes": [
                {"id": "p1", "group": "paper", "label": "Transformer"},
                {"id": "m1", "group": "method", "label": "Self-attention"},
                {"id": "c1", "group": "concept", "label": "Sequence modeling"}
            ],
            "links": links
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_accepts_resolved_links() {
        let g = graph(serde_json::json!([
            {"source": "p1", "target": "m1", "label": "introduces", "strength": 0.9},
            {"source": "m1", "target": "c1", "label": "applies to"}
        ]));

        assert!(g.validate().is_ok());
        assert_eq!(g.links[1].strength, None);
    }

    #[test]
    fn test_validate_rejects_dangling_target() {
        let g = graph(serde_json::json!([
            {"source": "p1", "target": "m1", "label": "introduces"},
            {"source": "m1", "target": "ghost", "label": "extends"}
        ]));

        let err = g.validate().unwrap_err();
        assert_eq!(err.missing, "ghost");
        assert_eq!(err.from, "m1");
    }

    #[test]
    fn test_validate_rejects_dangling_source() {
        let g = graph(serde_json::json!([{"source": "nope", "target": "m1"}]));
        assert_eq!(g.validate().unwrap_err().missing, "nope");
    }

    #[test]
    fn test_group_counts_and_labels() {
        let g = graph(serde_json::json!([]));
        let counts = g.group_counts();

        assert_eq!(counts.get("paper"), Some(&1));
        assert_eq!(counts.len(), 3);
        assert_eq!(g.label_of("m1"), "Self-attention");
        assert_eq!(g.label_of("unknown"), "unknown");
    }
}
