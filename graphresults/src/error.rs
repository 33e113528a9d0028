// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the result engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for result engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// The execution endpoint rejected the batch or reported statement errors
    #[error("Execution error: {0}")]
    Execution(String),

    /// The response did not have the shape a statement position requires
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True for failures reported by (or on the way to) the execution endpoint
    pub fn is_execution(&self) -> bool {
        matches!(self, EngineError::Execution(_))
    }
}

/// Failure raised by a single subscriber while handling a notification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Listener error: {message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ListenerError {
    fn from(s: String) -> Self {
        ListenerError::new(s)
    }
}

impl From<&str> for ListenerError {
    fn from(s: &str) -> Self {
        ListenerError::new(s)
    }
}
