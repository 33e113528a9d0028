// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pagination and display reconciliation
//!
//! The engine only decides *what* is shown: the first `page_size` records of
//! the last cycle. A [`DisplayReconciler`] turns that page into visual
//! elements keyed by `result_index`, asking a [`DisplayProvider`] for the
//! renderer registered under each record's label.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::results::ResultRecord;

/// The leading `page_size` records
pub fn page(records: &[ResultRecord], page_size: NonZeroUsize) -> &[ResultRecord] {
    &records[..records.len().min(page_size.get())]
}

/// Render target for one result record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultElement {
    pub id: String,
    pub result_index: usize,
    pub label: String,
    pub lines: Vec<String>,
}

impl ResultElement {
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

/// Draws one record into its element
pub trait ResultRenderer: Send + Sync {
    fn render(&self, record: &ResultRecord, target: &mut ResultElement);
}

impl<F> ResultRenderer for F
where
    F: Fn(&ResultRecord, &mut ResultElement) + Send + Sync,
{
    fn render(&self, record: &ResultRecord, target: &mut ResultElement) {
        self(record, target)
    }
}

/// Looks up the renderer for a label
pub trait DisplayProvider: Send + Sync {
    fn display_renderer(&self, label: &str) -> Arc<dyn ResultRenderer>;
}

/// Renders every attribute as a `key: value` line
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeRenderer;

impl ResultRenderer for AttributeRenderer {
    fn render(&self, record: &ResultRecord, target: &mut ResultElement) {
        for (key, value) in &record.attributes {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            target.push_line(format!("{}: {}", key, text));
        }
    }
}

/// Provider with per-label renderers and a fallback
pub struct LabelProvider {
    renderers: HashMap<String, Arc<dyn ResultRenderer>>,
    fallback: Arc<dyn ResultRenderer>,
}

impl Default for LabelProvider {
    fn default() -> Self {
        Self::new(Arc::new(AttributeRenderer))
    }
}

impl LabelProvider {
    pub fn new(fallback: Arc<dyn ResultRenderer>) -> Self {
        Self {
            renderers: HashMap::new(),
            fallback,
        }
    }

    pub fn with_renderer(mut self, label: impl Into<String>, renderer: Arc<dyn ResultRenderer>) -> Self {
        self.renderers.insert(label.into(), renderer);
        self
    }
}

impl DisplayProvider for LabelProvider {
    fn display_renderer(&self, label: &str) -> Arc<dyn ResultRenderer> {
        self.renderers
            .get(label)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Receives the page to show after a successful cycle
pub trait DisplayReconciler: Send + Sync {
    fn reconcile(&self, page: &[ResultRecord]);
}

/// Keeps one element per displayed record
///
/// Every reconcile removes all current elements and creates fresh ones for
/// the new page; element ids are `"{container_id}-{result_index}"`.
pub struct ResultContainer {
    container_id: String,
    provider: Arc<dyn DisplayProvider>,
    elements: RwLock<Vec<ResultElement>>,
}

impl ResultContainer {
    pub fn new(container_id: impl Into<String>, provider: Arc<dyn DisplayProvider>) -> Self {
        Self {
            container_id: container_id.into(),
            provider,
            elements: RwLock::new(Vec::new()),
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Snapshot of the elements currently displayed
    pub fn elements(&self) -> Vec<ResultElement> {
        self.elements.read().clone()
    }
}

impl DisplayReconciler for ResultContainer {
    fn reconcile(&self, page: &[ResultRecord]) {
        let mut fresh = Vec::with_capacity(page.len());
        for record in page {
            let mut element = ResultElement {
                id: format!("{}-{}", self.container_id, record.result_index),
                result_index: record.result_index,
                label: record.label.clone(),
                lines: Vec::new(),
            };
            self.provider
                .display_renderer(&record.label)
                .render(record, &mut element);
            fresh.push(element);
        }

        let removed = std::mem::replace(&mut *self.elements.write(), fresh).len();
        log::debug!(
            "Display '{}': removed {} element(s), added {}",
            self.container_id,
            removed,
            page.len()
        );
    }
}
