// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution endpoint boundary
//!
//! The engine only talks to the endpoint through [`ExecutionClient`]: submit
//! a batch, then project the opaque response into one row list per statement
//! position. The default projection understands the transactional endpoint
//! response shape:
//!
//! ```text
//! {"results": [{"columns": [..], "data": [{"row": [..], "graph": {..}}]}],
//!  "errors":  [{"code": "..", "message": ".."}]}
//! ```

use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::batch::QueryBatch;
use crate::error::{EngineError, Result};

/// One returned row projected to column -> value
pub type Row = Map<String, Value>;

/// Opaque endpoint response, only consumed through [`ExecutionClient::to_object`]
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse(Value);

impl RawResponse {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    pub fn from_json_str(body: &str) -> Result<Self> {
        Ok(Self(serde_json::from_str(body)?))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RawResponse {
    fn from(body: Value) -> Self {
        Self(body)
    }
}

/// Client for the batch execution endpoint
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Submit the batch; an `Err` means the endpoint rejected it
    async fn run(&self, batch: &QueryBatch) -> Result<RawResponse>;

    /// One row list per statement, in submission order
    fn to_object(&self, raw: &RawResponse) -> Result<Vec<Vec<Row>>> {
        parse_tabular_response(raw)
    }
}

/// Project a transactional endpoint response into per-statement rows
///
/// Each `data[i].row` is zipped with the statement's `columns`. A `graph`
/// object on the data entry is carried under the `graph` key unless a column
/// already uses that name. A non-empty `errors` array is an execution failure.
pub fn parse_tabular_response(raw: &RawResponse) -> Result<Vec<Vec<Row>>> {
    let body = raw.as_value();

    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    let code = e.get("code").and_then(Value::as_str).unwrap_or("unknown");
                    let message = e.get("message").and_then(Value::as_str).unwrap_or("");
                    format!("{}: {}", code, message)
                })
                .collect();
            return Err(EngineError::Execution(messages.join("; ")));
        }
    }

    let results = body
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::Parse("response has no 'results' array".to_string()))?;

    results
        .iter()
        .enumerate()
        .map(|(position, result)| parse_statement_result(position, result))
        .collect()
}

fn parse_statement_result(position: usize, result: &Value) -> Result<Vec<Row>> {
    let columns: Vec<&str> = result
        .get("columns")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            EngineError::Parse(format!("statement {} has no 'columns' array", position))
        })?
        .iter()
        .map(|c| {
            c.as_str().ok_or_else(|| {
                EngineError::Parse(format!("statement {} has a non-string column", position))
            })
        })
        .collect::<Result<_>>()?;

    let data = result
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::Parse(format!("statement {} has no 'data' array", position)))?;

    let mut rows = Vec::with_capacity(data.len());
    for entry in data {
        let mut row = Row::new();

        if let Some(values) = entry.get("row") {
            let values = values.as_array().ok_or_else(|| {
                EngineError::Parse(format!("statement {} has a non-array 'row'", position))
            })?;
            if values.len() != columns.len() {
                return Err(EngineError::Parse(format!(
                    "statement {} returned {} values for {} columns",
                    position,
                    values.len(),
                    columns.len()
                )));
            }
            for (column, value) in columns.iter().zip(values) {
                row.insert((*column).to_string(), value.clone());
            }
        }

        if let Some(graph) = entry.get("graph") {
            if !row.contains_key("graph") {
                row.insert("graph".to_string(), graph.clone());
            }
        }

        rows.push(row);
    }

    Ok(rows)
}

/// Client answering from pre-recorded responses
///
/// Responses (or failures) are handed out in the order they were queued.
/// Every submitted batch is kept so callers can inspect what was sent.
#[derive(Debug, Default)]
pub struct ReplayClient {
    responses: Mutex<VecDeque<std::result::Result<RawResponse, String>>>,
    submitted: Mutex<Vec<QueryBatch>>,
}

impl ReplayClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client with a single recorded response read from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let body = std::fs::read_to_string(path.as_ref())?;
        let client = Self::new();
        client.push_response(RawResponse::from_json_str(&body)?);
        Ok(client)
    }

    pub fn push_response(&self, response: impl Into<RawResponse>) {
        self.responses.lock().push_back(Ok(response.into()));
    }

    /// Queue a rejected submission
    pub fn push_failure(&self, message: impl Into<String>) {
        self.responses.lock().push_back(Err(message.into()));
    }

    /// Batches submitted so far, oldest first
    pub fn submitted(&self) -> Vec<QueryBatch> {
        self.submitted.lock().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submitted.lock().len()
    }
}

#[async_trait]
impl ExecutionClient for ReplayClient {
    async fn run(&self, batch: &QueryBatch) -> Result<RawResponse> {
        self.submitted.lock().push(batch.clone());

        match self.responses.lock().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(EngineError::Execution(message)),
            None => Err(EngineError::Execution(
                "no recorded response left to replay".to_string(),
            )),
        }
    }
}
