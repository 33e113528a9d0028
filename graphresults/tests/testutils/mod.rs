// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use graphresults::{
    EngineConfig, ExecutionClient, GraphData, LabelProvider, LoadingStarted, ProgressSink, QueryBatch,
    QueryBuilder, RawResponse, ReplayClient, ResultContainer, ResultEngine, ResultNotification,
    ResultQuery, RootEntity, StaticModel,
};

/// Query builder producing fixed statements for one label
pub struct TemplateBuilder {
    pub label: String,
}

impl QueryBuilder for TemplateBuilder {
    fn generate_result_query(&self, want_graph: bool) -> ResultQuery {
        if want_graph {
            ResultQuery::bare(format!("MATCH p=(n:{})--() RETURN p", self.label))
        } else {
            ResultQuery::bare(format!("MATCH (n:{}) RETURN n.name AS name", self.label))
        }
    }

    fn generate_count_query(&self, root: &RootEntity) -> ResultQuery {
        ResultQuery::bare(format!("MATCH (n:{}) RETURN count(n) AS count", root.label))
    }
}

/// Progress sink remembering every event
#[derive(Default)]
pub struct RecordingProgress {
    pub events: Mutex<Vec<LoadingStarted>>,
}

impl ProgressSink for RecordingProgress {
    fn loading_started(&self, event: &LoadingStarted) {
        self.events.lock().push(event.clone());
    }
}

/// Client that waits for a permit before answering
pub struct GatedClient {
    pub inner: ReplayClient,
    permits: Semaphore,
}

impl GatedClient {
    pub fn new() -> Self {
        Self {
            inner: ReplayClient::new(),
            permits: Semaphore::new(0),
        }
    }

    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }
}

#[async_trait]
impl ExecutionClient for GatedClient {
    async fn run(&self, batch: &QueryBatch) -> graphresults::Result<RawResponse> {
        self.permits
            .acquire()
            .await
            .expect("semaphore closed")
            .forget();
        self.inner.run(batch).await
    }
}

pub struct Harness {
    pub engine: Arc<ResultEngine>,
    pub client: Arc<ReplayClient>,
    pub model: Arc<StaticModel>,
    pub progress: Arc<RecordingProgress>,
    pub display: Arc<ResultContainer>,
}

pub fn harness(config: EngineConfig) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();

    let client = Arc::new(ReplayClient::new());
    let model = Arc::new(StaticModel::new(RootEntity::new("Person", 0)));
    let progress = Arc::new(RecordingProgress::default());
    let display = Arc::new(ResultContainer::new(
        config.container_id.clone(),
        Arc::new(LabelProvider::default()),
    ));

    let engine = ResultEngine::builder(
        Arc::new(TemplateBuilder {
            label: "Person".to_string(),
        }),
        model.clone(),
        client.clone(),
    )
    .config(config)
    .progress(progress.clone())
    .display(display.clone())
    .build()
    .expect("valid engine config");

    Harness {
        engine: Arc::new(engine),
        client,
        model,
        progress,
        display,
    }
}

/// One statement result in the transactional response shape
pub fn tabular(columns: &[&str], rows: Vec<Value>) -> Value {
    let data: Vec<Value> = rows.into_iter().map(|row| json!({ "row": row })).collect();
    json!({ "columns": columns, "data": data })
}

/// Graph statement result, one entry per `(nodes, relationships)` pair
pub fn graph_result(entries: Vec<(Value, Value)>) -> Value {
    let data: Vec<Value> = entries
        .into_iter()
        .map(|(nodes, relationships)| {
            json!({
                "row": [null],
                "graph": { "nodes": nodes, "relationships": relationships }
            })
        })
        .collect();
    json!({ "columns": ["p"], "data": data })
}

pub fn response(results: Vec<Value>) -> Value {
    json!({ "results": results, "errors": [] })
}

/// Rows `{name: A}, {name: B}, {name: C}`
pub fn abc_results() -> Value {
    tabular(&["name"], vec![json!(["A"]), json!(["B"]), json!(["C"])])
}

pub fn record_results(engine: &ResultEngine) -> Arc<Mutex<Vec<ResultNotification>>> {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    engine
        .listeners()
        .on_result_received(move |n: &ResultNotification| {
            sink.lock().push(n.clone());
            Ok(())
        });
    calls
}

pub fn record_counts(engine: &ResultEngine) -> Arc<Mutex<Vec<u64>>> {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    engine.listeners().on_total_result_count(move |count: &u64| {
        sink.lock().push(*count);
        Ok(())
    });
    calls
}

pub fn record_graphs(engine: &ResultEngine) -> Arc<Mutex<Vec<GraphData>>> {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    engine
        .listeners()
        .on_graph_result_received(move |graph: &GraphData| {
            sink.lock().push(graph.clone());
            Ok(())
        });
    calls
}
