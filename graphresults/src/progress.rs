// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Progress events emitted around batch submission

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Emitted right before a batch is submitted
#[derive(Debug, Clone, Serialize)]
pub struct LoadingStarted {
    /// Identifies the cycle in logs and events
    pub cycle_id: Uuid,
    /// Every statement of the batch, in submission order
    pub statements: Vec<String>,
    pub started_at: DateTime<Utc>,
}

pub trait ProgressSink: Send + Sync {
    fn loading_started(&self, event: &LoadingStarted);
}

/// Default sink: writes the event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn loading_started(&self, event: &LoadingStarted) {
        log::info!(
            "Results ==> cycle {} submitting {} statement(s)",
            event.cycle_id,
            event.statements.len()
        );
        for statement in &event.statements {
            log::debug!("  {}", statement);
        }
    }
}
