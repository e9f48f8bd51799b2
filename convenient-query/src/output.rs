//! Query output formatting
//!
//! Renders a result set as human-readable text, JSON, a bare label list,
//! or GraphViz dot. Formatting is a layer over the returned `TargetSet`;
//! the evaluator itself never prints.

use crate::error::QueryResult;
use crate::target::{QueryTarget, TargetSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default)
    Text,
    /// JSON output
    Json,
    /// GraphViz dot format
    Graph,
    /// List of labels only
    Label,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "graph" | "dot" => Ok(OutputFormat::Graph),
            "label" => Ok(OutputFormat::Label),
            _ => Err(format!("unknown output format: {s}")),
        }
    }
}

/// A result set with optional metadata, as serialized by the JSON format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResultSet {
    pub targets: Vec<QueryTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<QueryMetadata>,
}

/// Metadata attached to formatted query results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub query: String,
    pub target_count: usize,
    pub execution_time_ms: Option<u64>,
}

/// Format a result set
pub fn format_results(
    targets: &TargetSet,
    format: OutputFormat,
    metadata: Option<QueryMetadata>,
) -> QueryResult<String> {
    match format {
        OutputFormat::Text => Ok(format_text(targets, metadata)),
        OutputFormat::Json => format_json(targets, metadata),
        OutputFormat::Graph => Ok(format_graph(targets, &BTreeMap::new())),
        OutputFormat::Label => Ok(format_label(targets)),
    }
}

fn format_text(targets: &TargetSet, metadata: Option<QueryMetadata>) -> String {
    let mut output = String::new();

    if let Some(meta) = metadata {
        output.push_str(&format!("# Query: {}\n", meta.query));
        output.push_str(&format!("# Targets: {}\n", meta.target_count));
        if let Some(time) = meta.execution_time_ms {
            output.push_str(&format!("# Execution time: {time}ms\n"));
        }
        output.push('\n');
    }

    for target in targets {
        output.push_str(&format!("{target}\n"));
    }

    output
}

fn format_json(targets: &TargetSet, metadata: Option<QueryMetadata>) -> QueryResult<String> {
    let result = QueryResultSet {
        targets: targets.iter().cloned().collect(),
        metadata,
    };

    Ok(serde_json::to_string_pretty(&result)?)
}

fn format_label(targets: &TargetSet) -> String {
    let mut output = String::new();
    for target in targets {
        output.push_str(&format!("{target}\n"));
    }
    output
}

/// Render targets as a dot digraph. Edges between result targets can be
/// supplied by the caller (e.g. from the environment's forward deps);
/// without them the graph is nodes only.
pub fn format_graph(
    targets: &TargetSet,
    edges: &BTreeMap<QueryTarget, Vec<QueryTarget>>,
) -> String {
    let mut output = String::new();

    output.push_str("digraph dependencies {\n");
    output.push_str("  rankdir=LR;\n");
    output.push_str("  node [shape=box];\n\n");

    for target in targets {
        output.push_str(&format!("  \"{target}\";\n"));
    }

    if !edges.is_empty() {
        output.push('\n');
        for (from, to_list) in edges {
            for to in to_list {
                output.push_str(&format!("  \"{from}\" -> \"{to}\";\n"));
            }
        }
    }

    output.push_str("}\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> TargetSet {
        ["//lib:codec", "//lib:zstd"]
            .into_iter()
            .map(QueryTarget::from)
            .collect()
    }

    #[test]
    fn test_format_text() {
        let result = format_text(&targets(), None);
        assert_eq!(result, "//lib:codec\n//lib:zstd\n");
    }

    #[test]
    fn test_format_text_with_metadata() {
        let meta = QueryMetadata {
            query: "deps(//lib:codec)".to_string(),
            target_count: 2,
            execution_time_ms: Some(3),
        };
        let result = format_text(&targets(), Some(meta));
        assert!(result.starts_with("# Query: deps(//lib:codec)\n"));
        assert!(result.contains("# Targets: 2\n"));
    }

    #[test]
    fn test_format_json() {
        let result = format_json(&targets(), None).unwrap();
        assert!(result.contains("//lib:codec"));
        assert!(result.contains("//lib:zstd"));
        assert!(!result.contains("metadata"));
    }

    #[test]
    fn test_format_graph_with_edges() {
        let mut edges = BTreeMap::new();
        edges.insert(
            QueryTarget::from("//lib:codec"),
            vec![QueryTarget::from("//lib:zstd")],
        );
        let result = format_graph(&targets(), &edges);
        assert!(result.contains("digraph"));
        assert!(result.contains("\"//lib:codec\" -> \"//lib:zstd\";"));
    }

    #[test]
    fn test_output_format_parsing() {
        use std::str::FromStr;

        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("dot").unwrap(), OutputFormat::Graph);
        assert_eq!(OutputFormat::from_str("label").unwrap(), OutputFormat::Label);
        assert!(OutputFormat::from_str("yaml").is_err());
    }
}
