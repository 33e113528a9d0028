// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Parameterized statements and the query-builder boundary

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::RootEntity;

/// Statement parameters, keyed by parameter name
pub type Parameters = Map<String, Value>;

/// A single parameterized statement
///
/// Built once by a [`QueryBuilder`] and never modified afterwards; the fields
/// are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultQuery {
    statement: String,
    parameters: Parameters,
}

impl ResultQuery {
    pub fn new(statement: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            statement: statement.into(),
            parameters,
        }
    }

    /// Statement without parameters
    pub fn bare(statement: impl Into<String>) -> Self {
        Self::new(statement, Parameters::new())
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

/// Generates the statements a result cycle submits
///
/// Query text generation lives outside the engine; implementations typically
/// derive statements from whatever the user has currently selected.
pub trait QueryBuilder: Send + Sync {
    /// Main result statement. With `want_graph` the statement must return
    /// graph-shaped rows (nodes and relationships) instead of tabular rows.
    fn generate_result_query(&self, want_graph: bool) -> ResultQuery;

    /// Statement returning a single row with an integer `count` column
    fn generate_count_query(&self, root: &RootEntity) -> ResultQuery;
}
