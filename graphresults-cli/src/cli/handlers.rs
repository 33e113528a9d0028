// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for GraphResults

use colored::Colorize;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use graphresults::{
    CycleOutcome, EngineConfig, EngineError, GraphData, LabelProvider, LoadingStarted, ProgressSink,
    QueryBuilder, ReplayClient, ResultContainer, ResultElement, ResultEngine, ResultNotification,
    ResultQuery, ResultRecord, RootEntity, StaticModel,
};

use super::commands::{OutputFormat, SourceArgs};
use super::output::ResultFormatter;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Result cycle failed: {0}")]
    CycleFailed(String),

    #[error("Response file not found: {0:?}")]
    MissingResponse(PathBuf),
}

/// Statements for every entity carrying one label
pub struct LabelQueryBuilder {
    label: String,
}

impl LabelQueryBuilder {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl QueryBuilder for LabelQueryBuilder {
    fn generate_result_query(&self, want_graph: bool) -> ResultQuery {
        if want_graph {
            ResultQuery::bare(format!("MATCH p=(n:`{}`)--() RETURN p", self.label))
        } else {
            ResultQuery::bare(format!("MATCH (n:`{}`) RETURN n.id AS id, n", self.label))
        }
    }

    fn generate_count_query(&self, root: &RootEntity) -> ResultQuery {
        ResultQuery::bare(format!("MATCH (n:`{}`) RETURN count(n) AS count", root.label))
    }
}

/// Options of the `run` command
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: SourceArgs,
    pub count: u64,
    pub graph: bool,
    pub total_count: bool,
    pub active: bool,
    pub page_size: Option<usize>,
    pub config: Option<PathBuf>,
}

impl RunOptions {
    pub fn from_source(source: SourceArgs) -> Self {
        Self {
            source,
            count: 0,
            graph: false,
            total_count: false,
            active: false,
            page_size: None,
            config: None,
        }
    }
}

/// Everything the subscribers saw during one cycle
#[derive(Debug, Default, Clone, Serialize)]
pub struct CycleReport {
    pub statements: Vec<String>,
    pub total_count: Option<u64>,
    pub records: Vec<ResultRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphData>,
    /// Elements of the display container, present when the engine is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplaySnapshot>,
    #[serde(skip)]
    pub page_size: Option<NonZeroUsize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplaySnapshot {
    pub container_id: String,
    pub elements: Vec<ResultElement>,
}

#[derive(Default)]
struct StatementCapture {
    statements: Mutex<Vec<String>>,
}

impl ProgressSink for StatementCapture {
    fn loading_started(&self, event: &LoadingStarted) {
        log::info!("Loading {} statement(s)", event.statements.len());
        *self.statements.lock() = event.statements.clone();
    }
}

/// Build an engine over the recorded response and run one cycle
pub async fn execute(options: &RunOptions) -> Result<(ResultEngine, CycleReport), CliError> {
    if !options.source.response.exists() {
        return Err(CliError::MissingResponse(options.source.response.clone()));
    }

    let config = load_config(options.config.as_deref(), options)?;
    let client = Arc::new(ReplayClient::from_json_file(&options.source.response)?);
    let capture = Arc::new(StatementCapture::default());
    let container = Arc::new(ResultContainer::new(
        config.container_id.clone(),
        Arc::new(LabelProvider::default()),
    ));

    let engine = ResultEngine::builder(
        Arc::new(LabelQueryBuilder::new(options.source.label.clone())),
        Arc::new(StaticModel::new(RootEntity::new(
            options.source.label.clone(),
            options.count,
        ))),
        client,
    )
    .config(config)
    .progress(capture.clone())
    .display(container.clone())
    .build()?;

    let report = Arc::new(Mutex::new(CycleReport {
        page_size: Some(engine.page_size()),
        ..CycleReport::default()
    }));

    let sink = report.clone();
    engine.listeners().on_total_result_count(move |count: &u64| {
        sink.lock().total_count = Some(*count);
        Ok(())
    });

    let sink = report.clone();
    engine
        .listeners()
        .on_result_received(move |notification: &ResultNotification| {
            sink.lock().records = notification.records().to_vec();
            Ok(())
        });

    if options.graph {
        let sink = report.clone();
        engine
            .listeners()
            .on_graph_result_received(move |graph: &GraphData| {
                sink.lock().graph = Some(graph.clone());
                Ok(())
            });
    }

    match engine.update_results().await {
        CycleOutcome::Failed { cause, .. } => return Err(CliError::CycleFailed(cause.to_string())),
        outcome => log::debug!("Cycle outcome: {:?}", outcome),
    }

    // Without the count statement the known root count is reported instead
    if !engine.total_count_enabled() {
        engine.update_results_count();
    }

    let mut report = report.lock().clone();
    report.statements = capture.statements.lock().clone();
    if engine.is_active() {
        report.display = Some(DisplaySnapshot {
            container_id: container.container_id().to_string(),
            elements: container.elements(),
        });
    }
    Ok((engine, report))
}

fn load_config(path: Option<&Path>, options: &RunOptions) -> Result<EngineConfig, EngineError> {
    let mut config = EngineConfig::from_sources(path)?;
    if options.total_count {
        config = config.with_total_count(true);
    }
    if options.active {
        config = config.with_active(true);
    }
    if let Some(page_size) = options.page_size {
        config = config.with_page_size(page_size);
    }
    Ok(config)
}

/// Handle the run command
pub async fn handle_run(options: RunOptions, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let (_, report) = execute(&options).await?;

    match format {
        OutputFormat::Json => println!("{}", ResultFormatter::format_json(&report)?),
        OutputFormat::Table => {
            println!("{}", "Statements".bold().green());
            for (position, statement) in report.statements.iter().enumerate() {
                println!("  {} {}", format!("[{}]", position).cyan(), statement);
            }
            println!();
            println!("{}", ResultFormatter::format_table(&report));
            if let Some(display) = &report.display {
                println!(
                    "{}",
                    format!(
                        "Display '{}': {} element(s)",
                        display.container_id,
                        display.elements.len()
                    )
                    .yellow()
                );
            }
            if let Some(total) = report.total_count {
                println!("{}", format!("Total count: {}", total).yellow());
            }
            if let Some(graph) = &report.graph {
                println!(
                    "{}",
                    format!("Graph: {} node(s), {} relationship(s)", graph.nodes.len(), graph.edges.len())
                        .yellow()
                );
            }
        }
    }

    Ok(())
}

/// Handle the pre-query command
pub async fn handle_pre_query(source: SourceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, _) = execute(&RunOptions::from_source(source)).await?;
    let pre_query = engine.generate_pre_query();
    println!("{}", serde_json::to_string_pretty(&pre_query)?);
    Ok(())
}

/// Handle the version command
pub fn handle_version() {
    println!("{}", "GraphResults".bold().green());
    println!("  graphresults-cli {}", env!("CARGO_PKG_VERSION"));
    println!("  Rust edition 2021");
}
