// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! GraphResults - batched graph query results with typed subscriber channels
//!
//! The [`ResultEngine`] turns "the selection changed" into one batch of
//! parameterized statements, submits it to an execution endpoint and fans the
//! parsed response out to five fixed subscriber channels.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use graphresults::{ReplayClient, ResultEngine, RootEntity, StaticModel};
//! # use graphresults::{QueryBuilder, ResultQuery};
//! # struct Builder;
//! # impl QueryBuilder for Builder {
//! #     fn generate_result_query(&self, _: bool) -> ResultQuery { ResultQuery::bare("MATCH (n) RETURN n") }
//! #     fn generate_count_query(&self, _: &RootEntity) -> ResultQuery { ResultQuery::bare("") }
//! # }
//!
//! # async fn demo() -> graphresults::Result<()> {
//! let engine = ResultEngine::builder(
//!     Arc::new(Builder),
//!     Arc::new(StaticModel::new(RootEntity::new("Person", 0))),
//!     Arc::new(ReplayClient::from_json_file("response.json")?),
//! )
//! .build()?;
//!
//! engine.listeners().on_result_received(|n: &graphresults::ResultNotification| {
//!     println!("{} records", n.records().len());
//!     Ok(())
//! });
//!
//! engine.update_results().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐
//! │ ChangeGate   │──▶│ build_batch   │──▶│ ExecutionClient  │
//! └──────────────┘   └───────────────┘   └──────────────────┘
//!                                                 │
//!                     ┌───────────────────────────┼──────────────────┐
//!                     ▼                           ▼                  ▼
//!              extract_count             assemble_results       dedupe_graph
//!                     │                           │                  │
//!                     ▼                           ▼                  ▼
//!              Count channel  ──────▶   Result channel  ──────▶ Graph channel
//!                                                 │
//!                                                 ▼
//!                                        DisplayReconciler
//! ```
//!
//! # Module Organization
//!
//! - [`batch`] - Batch construction and result positions
//! - [`client`] - Execution endpoint boundary and response parsing
//! - [`config`] - Engine configuration
//! - [`display`] - Pagination and display reconciliation
//! - [`engine`] - The result cycle
//! - [`gate`] - Dirty flag and cycle state machine
//! - [`graph`] - Graph data deduplication
//! - [`listeners`] - Subscriber channels
//! - [`model`] - Root entity boundary
//! - [`progress`] - Loading events
//! - [`query`] - Statements and the query-builder boundary
//! - [`results`] - Result records, count extraction, pre-filter fragment
//! - [`error`] - Error types and handling

pub mod batch;
pub mod client;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod gate;
pub mod graph;
pub mod listeners;
pub mod model;
pub mod progress;
pub mod query;
pub mod results;

// Re-export main types for convenience
pub use batch::{build_batch, BuiltBatch, QueryBatch, ResultIndex, ResultSlot};
pub use client::{parse_tabular_response, ExecutionClient, RawResponse, ReplayClient, Row};
pub use config::EngineConfig;
pub use display::{
    DisplayProvider, DisplayReconciler, LabelProvider, ResultContainer, ResultElement, ResultRenderer,
};
pub use engine::{CycleOutcome, EngineState, ResultEngine, ResultEngineBuilder};
pub use error::{EngineError, ListenerError, Result};
pub use gate::CyclePhase;
pub use graph::{dedupe_graph, GraphData, GraphEdge, GraphId, GraphNode};
pub use listeners::{
    Channel, DispatchReport, ListenerCounts, ListenerRegistry, Observer, ResultNotification, Subscription,
};
pub use model::{DomainModel, RootEntity, StaticModel};
pub use progress::{LoadingStarted, LogProgress, ProgressSink};
pub use query::{Parameters, QueryBuilder, ResultQuery};
pub use results::{PreQuery, ResultRecord};
