// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph data deduplication
//!
//! Graph statements return one row per matched path, so the same node or
//! relationship usually shows up in many rows. [`dedupe_graph`] merges them
//! into unique sequences keyed by `id`, keeping the first occurrence.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::Row;
use crate::error::{EngineError, Result};

/// Node or relationship identifier
///
/// Endpoints send ids either as strings or as integers; both compare by their
/// canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "WireId", into = "String")]
pub struct GraphId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl From<WireId> for GraphId {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => GraphId(s),
            WireId::Number(n) => GraphId(n.to_string()),
        }
    }
}

impl From<GraphId> for String {
    fn from(id: GraphId) -> Self {
        id.0
    }
}

impl From<&str> for GraphId {
    fn from(s: &str) -> Self {
        GraphId(s.to_string())
    }
}

impl GraphId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node embedded in a graph row; everything except `id` is opaque
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: GraphId,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Relationship embedded in a graph row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: GraphId,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Unique nodes and edges of one cycle, in first-insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Merge the nodes and relationships of graph rows, first-seen wins
///
/// Each row may carry `graph: {nodes: [...], relationships: [...]}`; rows
/// without a graph object contribute nothing. Later entries with an id that
/// was already seen are dropped even when their properties differ.
pub fn dedupe_graph(rows: &[Row]) -> Result<GraphData> {
    let mut data = GraphData::default();
    let mut seen_nodes = HashSet::new();
    let mut seen_edges = HashSet::new();

    for (row_number, row) in rows.iter().enumerate() {
        let graph = match row.get("graph") {
            Some(Value::Object(graph)) => graph,
            Some(Value::Null) | None => continue,
            Some(other) => {
                return Err(EngineError::Parse(format!(
                    "graph row {} has a non-object graph: {}",
                    row_number, other
                )))
            }
        };

        for value in entries(graph, "nodes", row_number)? {
            let node: GraphNode = decode(value, "node", row_number)?;
            if seen_nodes.insert(node.id.clone()) {
                data.nodes.push(node);
            }
        }

        for value in entries(graph, "relationships", row_number)? {
            let edge: GraphEdge = decode(value, "relationship", row_number)?;
            if seen_edges.insert(edge.id.clone()) {
                data.edges.push(edge);
            }
        }
    }

    log::debug!(
        "Deduplicated graph rows into {} nodes and {} edges",
        data.nodes.len(),
        data.edges.len()
    );

    Ok(data)
}

fn entries<'a>(graph: &'a Map<String, Value>, key: &str, row_number: usize) -> Result<&'a [Value]> {
    match graph.get(key) {
        Some(Value::Array(values)) => Ok(values),
        None => Ok(&[]),
        Some(_) => Err(EngineError::Parse(format!(
            "graph row {} has a non-array '{}'",
            row_number, key
        ))),
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: &Value, kind: &str, row_number: usize) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| EngineError::Parse(format!("invalid {} in graph row {}: {}", kind, row_number, e)))
}
