// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query batch construction
//!
//! A cycle submits one batch: the main result statement first, then an
//! optional graph statement and an optional count statement. The
//! [`ResultIndex`] built alongside records which response position belongs
//! to which statement, relying on the endpoint answering in submission order.

use serde::Serialize;

use crate::listeners::ListenerCounts;
use crate::model::RootEntity;
use crate::query::{QueryBuilder, ResultQuery};

/// Logical role of a statement inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultSlot {
    /// Main tabular results, always position 0
    Results,
    /// Graph-shaped rows for the graph channel
    Graph,
    /// Single row carrying the total `count`
    Total,
}

/// Maps each included [`ResultSlot`] to its position in the batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultIndex {
    graph: Option<usize>,
    total: Option<usize>,
}

impl ResultIndex {
    /// Position of a slot, or `None` when the slot was not part of the batch
    pub fn position(&self, slot: ResultSlot) -> Option<usize> {
        match slot {
            ResultSlot::Results => Some(0),
            ResultSlot::Graph => self.graph,
            ResultSlot::Total => self.total,
        }
    }

    pub fn contains(&self, slot: ResultSlot) -> bool {
        self.position(slot).is_some()
    }
}

/// Ordered statements submitted together
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryBatch {
    statements: Vec<ResultQuery>,
}

impl QueryBatch {
    pub fn statements(&self) -> &[ResultQuery] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Statement strings in submission order
    pub fn statement_texts(&self) -> Vec<String> {
        self.statements
            .iter()
            .map(|q| q.statement().to_string())
            .collect()
    }

    /// Append a statement and return its position
    fn push(&mut self, query: ResultQuery) -> usize {
        self.statements.push(query);
        self.statements.len() - 1
    }
}

/// Output of [`build_batch`]
#[derive(Debug, Clone)]
pub struct BuiltBatch {
    pub batch: QueryBatch,
    pub index: ResultIndex,
    /// The statement constructed last; a count statement wins over the
    /// result statements when it is included
    pub last_generated: ResultQuery,
}

/// Assemble the batch for one cycle
///
/// The graph statement is included iff the graph channel has a subscriber;
/// the count statement iff `total_count_enabled` is set and the count channel
/// has a subscriber.
pub fn build_batch(
    builder: &dyn QueryBuilder,
    root: &RootEntity,
    counts: ListenerCounts,
    total_count_enabled: bool,
) -> BuiltBatch {
    let mut batch = QueryBatch {
        statements: Vec::with_capacity(3),
    };
    let mut index = ResultIndex::default();

    let result_query = builder.generate_result_query(false);
    let mut last_generated = result_query.clone();
    batch.push(result_query);

    if counts.graph > 0 {
        let graph_query = builder.generate_result_query(true);
        last_generated = graph_query.clone();
        index.graph = Some(batch.push(graph_query));
    }

    if total_count_enabled && counts.count > 0 {
        let count_query = builder.generate_count_query(root);
        last_generated = count_query.clone();
        index.total = Some(batch.push(count_query));
    }

    log::debug!(
        "Built batch with {} statements (graph: {:?}, total: {:?})",
        batch.len(),
        index.graph,
        index.total
    );

    BuiltBatch {
        batch,
        index,
        last_generated,
    }
}
