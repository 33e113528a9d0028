// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result engine
//!
//! One cycle: build the batch, announce it, submit it, unpack every response
//! position through the [`ResultIndex`], then notify Count -> Result -> Graph
//! subscribers and refresh the display. Execution and parse failures end the
//! cycle with a single failed Result notification and leave the engine dirty.

use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::batch::{build_batch, ResultIndex, ResultSlot};
use crate::client::{ExecutionClient, RawResponse, Row};
use crate::config::EngineConfig;
use crate::display::{self, DisplayReconciler};
use crate::error::{EngineError, Result};
use crate::gate::{ChangeGate, Completion, CyclePhase, GateDecision};
use crate::graph::{dedupe_graph, GraphData};
use crate::listeners::{DispatchReport, ListenerRegistry, ResultNotification};
use crate::model::{DomainModel, RootEntity};
use crate::progress::{LoadingStarted, LogProgress, ProgressSink};
use crate::query::{QueryBuilder, ResultQuery};
use crate::results::{assemble_results, extract_count, generate_pre_query, PreQuery, ResultRecord};

/// Mutable engine state shared by every cycle
#[derive(Debug, Clone)]
pub struct EngineState {
    pub last_results: Vec<ResultRecord>,
    pub last_generated_query: Option<ResultQuery>,
    pub is_active: bool,
    pub page_size: NonZeroUsize,
    pub total_count_enabled: bool,
}

/// What a call to [`ResultEngine::update_results`] did
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Nothing changed since the last successful cycle
    Unchanged,
    /// Another call is running a cycle and will run once more
    Queued,
    /// `cycles` cycles ran (more than one when re-runs were queued), the last succeeded
    Completed { cycles: usize },
    /// The last cycle failed
    Failed { cycles: usize, cause: Arc<EngineError> },
}

impl CycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CycleOutcome::Completed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CycleOutcome::Failed { .. })
    }
}

/// Everything a successful response unpacks into
struct CycleData {
    records: Vec<ResultRecord>,
    count: Option<u64>,
    graph: Option<GraphData>,
}

pub struct ResultEngine {
    query_builder: Arc<dyn QueryBuilder>,
    model: Arc<dyn DomainModel>,
    client: Arc<dyn ExecutionClient>,
    display: Option<Arc<dyn DisplayReconciler>>,
    progress: Arc<dyn ProgressSink>,
    listeners: ListenerRegistry,
    gate: ChangeGate,
    state: RwLock<EngineState>,
}

impl ResultEngine {
    pub fn builder(
        query_builder: Arc<dyn QueryBuilder>,
        model: Arc<dyn DomainModel>,
        client: Arc<dyn ExecutionClient>,
    ) -> ResultEngineBuilder {
        ResultEngineBuilder::new(query_builder, model, client)
    }

    /// Subscriber registry; subscribe and unsubscribe through it
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Record that the selection changed and results need refreshing
    pub fn mark_changed(&self) {
        self.gate.mark_changed();
    }

    pub fn has_changed(&self) -> bool {
        self.gate.has_changed()
    }

    pub fn phase(&self) -> CyclePhase {
        self.gate.phase()
    }

    pub fn last_results(&self) -> Vec<ResultRecord> {
        self.state.read().last_results.clone()
    }

    pub fn last_generated_query(&self) -> Option<ResultQuery> {
        self.state.read().last_generated_query.clone()
    }

    pub fn state(&self) -> EngineState {
        self.state.read().clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.read().is_active
    }

    pub fn set_active(&self, active: bool) {
        self.state.write().is_active = active;
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.state.read().page_size
    }

    /// Takes effect from the next cycle on
    pub fn set_page_size(&self, page_size: NonZeroUsize) {
        self.state.write().page_size = page_size;
    }

    pub fn total_count_enabled(&self) -> bool {
        self.state.read().total_count_enabled
    }

    pub fn set_total_count_enabled(&self, enabled: bool) {
        self.state.write().total_count_enabled = enabled;
    }

    /// Run a result cycle if anything changed
    ///
    /// At most one cycle is in flight per engine. A call made while a cycle
    /// runs returns [`CycleOutcome::Queued`] and the running call performs one
    /// more cycle once the current one is done.
    ///
    /// The root entity and the page size are read once, when a cycle starts,
    /// and label every record of that cycle. Call [`mark_changed`] whenever
    /// the selection changes: a change made while a batch is in flight is
    /// only picked up by the queued re-run, never by the running cycle.
    ///
    /// [`mark_changed`]: ResultEngine::mark_changed
    pub async fn update_results(&self) -> CycleOutcome {
        match self.gate.try_begin() {
            GateDecision::Unchanged => {
                log::debug!("Results unchanged, skipping cycle");
                return CycleOutcome::Unchanged;
            }
            GateDecision::Queued => {
                log::debug!("Cycle in flight, queued one re-run");
                return CycleOutcome::Queued;
            }
            GateDecision::Start => {}
        }

        let mut guard = CycleGuard {
            gate: &self.gate,
            armed: true,
        };
        let mut cycles = 0;
        loop {
            cycles += 1;
            let result = self.run_cycle().await;

            if self.gate.complete() == Completion::Idle {
                guard.armed = false;
                return match result {
                    Ok(()) => CycleOutcome::Completed { cycles },
                    Err(cause) => CycleOutcome::Failed { cycles, cause },
                };
            }
            log::debug!("Running queued result cycle");
        }
    }

    /// Notify Count subscribers with the root entity's known count
    pub fn update_results_count(&self) -> DispatchReport {
        if self.listeners.counts().count == 0 {
            return DispatchReport::default();
        }
        let count = self.model.root_entity().count;
        self.listeners.notify_count(count)
    }

    /// Fragment restricting a follow-up query to the last results
    pub fn generate_pre_query(&self) -> PreQuery {
        generate_pre_query(&self.state.read().last_results)
    }

    async fn run_cycle(&self) -> std::result::Result<(), Arc<EngineError>> {
        let cycle_id = Uuid::new_v4();
        let root = self.model.root_entity();
        let (total_count_enabled, page_size) = {
            let state = self.state.read();
            (state.total_count_enabled, state.page_size)
        };

        let built = build_batch(
            self.query_builder.as_ref(),
            &root,
            self.listeners.counts(),
            total_count_enabled,
        );
        self.state.write().last_generated_query = Some(built.last_generated.clone());

        self.progress.loading_started(&LoadingStarted {
            cycle_id,
            statements: built.batch.statement_texts(),
            started_at: Utc::now(),
        });

        let unpacked = match self.client.run(&built.batch).await {
            Ok(raw) => self.unpack(&raw, &built.index, &root),
            Err(e) => Err(e),
        };

        match unpacked {
            Ok(data) => {
                log::info!("<== Results cycle {} ({} records)", cycle_id, data.records.len());
                self.publish(data, page_size);
                Ok(())
            }
            Err(e) => {
                log::error!("Result cycle {} failed: {}", cycle_id, e);
                let cause = Arc::new(e);
                self.listeners.notify_results(&ResultNotification::Failed {
                    cause: cause.clone(),
                });
                Err(cause)
            }
        }
    }

    /// Parse every position of the response before anything is published
    fn unpack(&self, raw: &RawResponse, index: &ResultIndex, root: &RootEntity) -> Result<CycleData> {
        let mut parsed = self.client.to_object(raw)?;

        let records = assemble_results(take_rows(&mut parsed, index, ResultSlot::Results)?, &root.label);

        let count = if index.contains(ResultSlot::Total) {
            Some(extract_count(&take_rows(&mut parsed, index, ResultSlot::Total)?)?)
        } else {
            None
        };

        let graph = if index.contains(ResultSlot::Graph) {
            Some(dedupe_graph(&take_rows(&mut parsed, index, ResultSlot::Graph)?)?)
        } else {
            None
        };

        Ok(CycleData {
            records,
            count,
            graph,
        })
    }

    fn publish(&self, data: CycleData, page_size: NonZeroUsize) {
        self.state.write().last_results = data.records.clone();

        if let Some(count) = data.count {
            self.listeners.notify_count(count);
        }

        let notification = ResultNotification::Records(data.records);
        self.listeners.notify_results(&notification);

        if let Some(graph) = &data.graph {
            self.listeners.notify_graph(graph);
        }

        self.gate.mark_clean();

        if self.is_active() {
            if let Some(display) = &self.display {
                display.reconcile(display::page(notification.records(), page_size));
            }
        }
    }
}

fn take_rows(parsed: &mut [Vec<Row>], index: &ResultIndex, slot: ResultSlot) -> Result<Vec<Row>> {
    let position = index
        .position(slot)
        .ok_or_else(|| EngineError::Parse(format!("{:?} statement was not submitted", slot)))?;

    let available = parsed.len();
    parsed
        .get_mut(position)
        .map(std::mem::take)
        .ok_or_else(|| {
            EngineError::Parse(format!(
                "response has {} statement result(s), {:?} expected at position {}",
                available, slot, position
            ))
        })
}

/// Resets the gate if a cycle future is dropped before it completes
struct CycleGuard<'a> {
    gate: &'a ChangeGate,
    armed: bool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::warn!("Result cycle dropped before completion");
            self.gate.abandon();
        }
    }
}

/// Assembles a [`ResultEngine`] from its collaborators
pub struct ResultEngineBuilder {
    query_builder: Arc<dyn QueryBuilder>,
    model: Arc<dyn DomainModel>,
    client: Arc<dyn ExecutionClient>,
    display: Option<Arc<dyn DisplayReconciler>>,
    progress: Arc<dyn ProgressSink>,
    config: EngineConfig,
}

impl ResultEngineBuilder {
    pub fn new(
        query_builder: Arc<dyn QueryBuilder>,
        model: Arc<dyn DomainModel>,
        client: Arc<dyn ExecutionClient>,
    ) -> Self {
        Self {
            query_builder,
            model,
            client,
            display: None,
            progress: Arc::new(LogProgress),
            config: EngineConfig::default(),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn display(mut self, display: Arc<dyn DisplayReconciler>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn build(self) -> Result<ResultEngine> {
        self.config.validate()?;
        let page_size = self.config.page_size()?;

        Ok(ResultEngine {
            query_builder: self.query_builder,
            model: self.model,
            client: self.client,
            display: self.display,
            progress: self.progress,
            listeners: ListenerRegistry::new(),
            gate: ChangeGate::new(),
            state: RwLock::new(EngineState {
                last_results: Vec::new(),
                last_generated_query: None,
                is_active: self.config.active,
                page_size,
                total_count_enabled: self.config.total_count_enabled,
            }),
        })
    }
}
