// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result records, count extraction and the pre-filter fragment

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Row;
use crate::error::{EngineError, Result};

/// One main-result row of a cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Position in the cycle's row order; reassigned every cycle
    pub result_index: usize,
    /// Label of the root entity selected when the cycle ran
    pub label: String,
    pub attributes: Row,
}

impl ResultRecord {
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Wrap main-result rows as records numbered `0..n-1` in arrival order
pub fn assemble_results(rows: Vec<Row>, label: &str) -> Vec<ResultRecord> {
    rows.into_iter()
        .enumerate()
        .map(|(result_index, attributes)| ResultRecord {
            result_index,
            label: label.to_string(),
            attributes,
        })
        .collect()
}

/// Read the integer `count` column of the first row of a count statement
pub fn extract_count(rows: &[Row]) -> Result<u64> {
    let row = rows
        .first()
        .ok_or_else(|| EngineError::Parse("count statement returned no rows".to_string()))?;

    let value = row
        .get("count")
        .ok_or_else(|| EngineError::Parse("count row has no 'count' column".to_string()))?;

    value
        .as_u64()
        .ok_or_else(|| EngineError::Parse(format!("count value {} is not a non-negative integer", value)))
}

/// Statement prefix restricting a follow-up query to the displayed entities
pub const PRE_QUERY: &str = "MATCH (d) WHERE d.id IN $ids WITH d";

/// Reusable fragment matching the entities of the last results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreQuery {
    pub query: String,
    pub param: PreQueryParams,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreQueryParams {
    pub ids: Vec<Value>,
}

/// Build the pre-filter fragment from the `id` attribute of each record
///
/// Records without an `id` attribute contribute `null`.
pub fn generate_pre_query(records: &[ResultRecord]) -> PreQuery {
    let ids = records
        .iter()
        .map(|r| r.attribute("id").cloned().unwrap_or(Value::Null))
        .collect();

    PreQuery {
        query: PRE_QUERY.to_string(),
        param: PreQueryParams { ids },
    }
}
