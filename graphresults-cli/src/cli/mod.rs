// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for GraphResults
//!
//! Replays a recorded endpoint response through one result cycle and prints
//! what the subscriber channels received.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::{handle_pre_query, handle_run, handle_version, RunOptions};
