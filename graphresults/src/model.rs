// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Domain model boundary: the currently selected root entity

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// The primary domain type driving the main result query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootEntity {
    /// Label stamped onto every result record of a cycle
    pub label: String,
    /// Last known number of matching entities
    pub count: u64,
}

impl RootEntity {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Tracks which root entity is currently selected
pub trait DomainModel: Send + Sync {
    fn root_entity(&self) -> RootEntity;
}

/// Domain model holding a single replaceable root entity
#[derive(Debug)]
pub struct StaticModel {
    root: RwLock<RootEntity>,
}

impl StaticModel {
    pub fn new(root: RootEntity) -> Self {
        Self {
            root: RwLock::new(root),
        }
    }

    /// Replace the selected root entity
    pub fn select(&self, root: RootEntity) {
        *self.root.write() = root;
    }
}

impl DomainModel for StaticModel {
    fn root_entity(&self) -> RootEntity {
        self.root.read().clone()
    }
}
