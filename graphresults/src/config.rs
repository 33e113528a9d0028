// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine configuration
//!
//! Sources, first match wins: an explicit file path, the file named by
//! `GRAPHRESULTS_CONFIG`, built-in defaults. Files are JSON; missing fields
//! take their default.

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EngineError, Result};

pub const CONFIG_ENV: &str = "GRAPHRESULTS_CONFIG";

const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of records handed to the display per cycle
    pub page_size: usize,
    /// Add a count statement when count listeners exist
    pub total_count_enabled: bool,
    /// Update the display after each successful cycle
    pub active: bool,
    pub container_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            total_count_enabled: false,
            active: false,
            container_id: String::from("results"),
        }
    }
}

impl EngineConfig {
    pub fn from_sources(cli_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_path {
            if path.as_os_str().is_empty() {
                return Err(EngineError::Config(
                    "configuration path must not be empty".into(),
                ));
            }
            return Self::load_from_path(path);
        }

        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::load_from_path(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            EngineError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        log::debug!("Loaded engine configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(EngineError::Config("page_size must be greater than 0".into()));
        }
        if self.container_id.is_empty() {
            return Err(EngineError::Config("container_id must not be empty".into()));
        }
        Ok(())
    }

    pub fn page_size(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.page_size)
            .ok_or_else(|| EngineError::Config("page_size must be greater than 0".into()))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_total_count(mut self, enabled: bool) -> Self {
        self.total_count_enabled = enabled;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}
