//! Declared response shapes, in the provider's OpenAPI-subset schema dialect.
//!
//! Maps with dynamic keys are not expressible here, so per-paper data is
//! always declared as a list of records carrying a `paperId`.

use serde_json::{json, Value};

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn string_list() -> Value {
    json!({ "type": "ARRAY", "items": string() })
}

/// One search result
pub fn paper() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "id": string(),
            "title": string(),
            "authors": string_list(),
            "year": { "type": "INTEGER" },
            "abstract": string(),
            "citationCount": { "type": "INTEGER" },
            "tldr": string(),
        },
        "required": ["title", "authors", "year", "abstract", "tldr"],
    })
}

/// Search response: a list of papers
pub fn papers() -> Value {
    json!({ "type": "ARRAY", "items": paper() })
}

/// Structured comparison with list-based per-paper points
pub fn comparison() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": string(),
            "aspects": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": string(),
                        "points": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "paperId": string(),
                                    "value": string(),
                                    "confidence": { "type": "NUMBER" },
                                    "source": string(),
                                },
                                "required": ["paperId", "value", "confidence", "source"],
                            },
                        },
                    },
                    "required": ["name", "points"],
                },
            },
            "synthesis": string(),
            "researchGaps": string_list(),
            "hypothesis": { "type": "STRING", "nullable": true },
        },
        "required": ["summary", "aspects", "synthesis", "researchGaps"],
    })
}

/// Knowledge graph nodes and links
pub fn knowledge_graph() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "nodes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": string(),
                        "group": string(),
                        "label": string(),
                    },
                    "required": ["id", "group", "label"],
                },
            },
            "links": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "source": string(),
                        "target": string(),
                        "label": string(),
                        "strength": { "type": "NUMBER" },
                    },
                    "required": ["source", "target", "label"],
                },
            },
        },
        "required": ["nodes", "links"],
    })
}

/// Suggested broader topics
pub fn topics() -> Value {
    string_list()
}

pub fn key_insights() -> Value {
    json!({
        "type": "OBJECT",
        "properties": { "insights": string_list() },
        "required": ["insights"],
    })
}

pub fn research_gaps() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "gaps": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": string(),
                        "description": string(),
                        "suggestedDirection": string(),
                    },
                    "required": ["title", "description", "suggestedDirection"],
                },
            },
        },
        "required": ["gaps"],
    })
}
