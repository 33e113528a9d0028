// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Listener registry and dispatcher
//!
//! Five fixed channels, each with its own ordered subscriber list:
//! - Count: total result count of a cycle
//! - Result: main result records (or the failure of a cycle)
//! - Relation, Value: reserved registration points, never dispatched here
//! - Graph: deduplicated graph data
//!
//! Every invocation runs inside its own failure boundary. A subscriber that
//! returns an error or panics is logged and skipped; the remaining
//! subscribers of the channel are still called.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{EngineError, ListenerError};
use crate::graph::GraphData;
use crate::results::ResultRecord;

/// Subscriber channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Count,
    Result,
    Relation,
    Value,
    Graph,
}

/// Typed subscriber for one channel
pub trait Observer<T: ?Sized>: Send + Sync {
    fn notify(&self, payload: &T) -> Result<(), ListenerError>;
}

impl<T: ?Sized, F> Observer<T> for F
where
    F: Fn(&T) -> Result<(), ListenerError> + Send + Sync,
{
    fn notify(&self, payload: &T) -> Result<(), ListenerError> {
        self(payload)
    }
}

/// What Result-channel subscribers receive at the end of a cycle
#[derive(Debug, Clone)]
pub enum ResultNotification {
    /// The cycle succeeded; zero records means "no matches"
    Records(Vec<ResultRecord>),
    /// The cycle failed; carries no records
    Failed { cause: Arc<EngineError> },
}

impl ResultNotification {
    /// Records of a successful cycle, empty for a failed one
    pub fn records(&self) -> &[ResultRecord] {
        match self {
            ResultNotification::Records(records) => records,
            ResultNotification::Failed { .. } => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ResultNotification::Failed { .. })
    }

    pub fn cause(&self) -> Option<&EngineError> {
        match self {
            ResultNotification::Records(_) => None,
            ResultNotification::Failed { cause } => Some(cause),
        }
    }
}

pub type SubscriptionId = u64;

/// Handle returned by every registration, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub channel: Channel,
    pub id: SubscriptionId,
}

/// Subscriber counts the batch builder needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerCounts {
    pub count: usize,
    pub graph: usize,
}

/// Outcome of dispatching one payload on one channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

type ObserverList<T> = RwLock<Vec<(SubscriptionId, Arc<dyn Observer<T>>)>>;

/// Ordered subscriber lists for the five channels
pub struct ListenerRegistry {
    next_id: AtomicU64,
    count: ObserverList<u64>,
    result: ObserverList<ResultNotification>,
    relation: ObserverList<Value>,
    value: ObserverList<Value>,
    graph: ObserverList<GraphData>,
    failures: AtomicU64,
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            count: RwLock::new(Vec::new()),
            result: RwLock::new(Vec::new()),
            relation: RwLock::new(Vec::new()),
            value: RwLock::new(Vec::new()),
            graph: RwLock::new(Vec::new()),
            failures: AtomicU64::new(0),
        }
    }

    /// Subscribe to the total result count
    pub fn on_total_result_count(&self, observer: impl Observer<u64> + 'static) -> Subscription {
        self.register(Channel::Count, &self.count, Arc::new(observer))
    }

    pub fn on_result_received(
        &self,
        observer: impl Observer<ResultNotification> + 'static,
    ) -> Subscription {
        self.register(Channel::Result, &self.result, Arc::new(observer))
    }

    /// Reserved channel; nothing dispatches on it yet
    pub fn on_result_relation_received(&self, observer: impl Observer<Value> + 'static) -> Subscription {
        self.register(Channel::Relation, &self.relation, Arc::new(observer))
    }

    /// Reserved channel; nothing dispatches on it yet
    pub fn on_result_value_received(&self, observer: impl Observer<Value> + 'static) -> Subscription {
        self.register(Channel::Value, &self.value, Arc::new(observer))
    }

    pub fn on_graph_result_received(&self, observer: impl Observer<GraphData> + 'static) -> Subscription {
        self.register(Channel::Graph, &self.graph, Arc::new(observer))
    }

    /// Remove one registration; returns false if it was already gone
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        match subscription.channel {
            Channel::Count => remove(&self.count, subscription.id),
            Channel::Result => remove(&self.result, subscription.id),
            Channel::Relation => remove(&self.relation, subscription.id),
            Channel::Value => remove(&self.value, subscription.id),
            Channel::Graph => remove(&self.graph, subscription.id),
        }
    }

    /// Number of registrations on a channel
    pub fn len(&self, channel: Channel) -> usize {
        match channel {
            Channel::Count => self.count.read().len(),
            Channel::Result => self.result.read().len(),
            Channel::Relation => self.relation.read().len(),
            Channel::Value => self.value.read().len(),
            Channel::Graph => self.graph.read().len(),
        }
    }

    pub fn counts(&self) -> ListenerCounts {
        ListenerCounts {
            count: self.len(Channel::Count),
            graph: self.len(Channel::Graph),
        }
    }

    /// Total subscriber invocations that failed or panicked so far
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn notify_count(&self, count: u64) -> DispatchReport {
        self.dispatch(Channel::Count, &self.count, &count)
    }

    pub fn notify_results(&self, notification: &ResultNotification) -> DispatchReport {
        self.dispatch(Channel::Result, &self.result, notification)
    }

    pub fn notify_graph(&self, graph: &GraphData) -> DispatchReport {
        self.dispatch(Channel::Graph, &self.graph, graph)
    }

    fn register<T: 'static>(
        &self,
        channel: Channel,
        list: &ObserverList<T>,
        observer: Arc<dyn Observer<T>>,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        list.write().push((id, observer));
        log::debug!("Registered {:?} listener #{}", channel, id);
        Subscription { channel, id }
    }

    fn dispatch<T: 'static>(&self, channel: Channel, list: &ObserverList<T>, payload: &T) -> DispatchReport {
        // Snapshot so subscribers may (un)register while being notified
        let observers: Vec<(SubscriptionId, Arc<dyn Observer<T>>)> = list.read().clone();
        let mut report = DispatchReport::default();

        for (id, observer) in observers {
            match catch_unwind(AssertUnwindSafe(|| observer.notify(payload))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    log::warn!("{:?} listener #{} failed: {}", channel, id, e);
                }
                Err(panic) => {
                    report.failed += 1;
                    log::warn!(
                        "{:?} listener #{} panicked: {}",
                        channel,
                        id,
                        panic_message(panic.as_ref())
                    );
                }
            }
        }

        if report.failed > 0 {
            self.failures.fetch_add(report.failed as u64, Ordering::Relaxed);
        }
        report
    }
}

fn remove<T: 'static>(list: &ObserverList<T>, id: SubscriptionId) -> bool {
    let mut observers = list.write();
    let before = observers.len();
    observers.retain(|(existing, _)| *existing != id);
    observers.len() != before
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
