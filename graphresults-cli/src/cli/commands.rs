// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command definitions for GraphResults

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Verbosity of the engine's log output
///
/// `debug` shows batch composition and listener registrations.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Failed cycles only
    Error,
    /// Also failing or panicking listeners
    Warn,
    /// Also loading events and completed cycles
    Info,
    /// Also batch statements and subscriptions
    Debug,
    Trace,
    /// Silence the engine entirely
    Off,
}

impl LogLevel {
    /// Filter handed to `env_logger`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// GraphResults CLI - replay a result cycle against a recorded response
#[derive(Parser)]
#[command(name = "graphresults")]
#[command(about = "GraphResults - batched graph query results with typed subscriber channels")]
#[command(version)]
pub struct Cli {
    /// Engine log verbosity; overrides RUST_LOG
    #[arg(short = 'l', long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Shorthand for --log-level debug
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show detailed version information
    Version,

    /// Run one result cycle and print what the subscribers received
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Known root entity count, used when the count statement is skipped
        #[arg(long, default_value_t = 0)]
        count: u64,

        /// Subscribe to graph results (adds the graph statement)
        #[arg(long)]
        graph: bool,

        /// Subscribe to the total count (adds the count statement)
        #[arg(long)]
        total_count: bool,

        /// Reconcile the display container after the cycle
        #[arg(long)]
        active: bool,

        /// Page size for the display container
        #[arg(long)]
        page_size: Option<usize>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Run one result cycle and print the pre-filter fragment for its ids
    PreQuery {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Where the recorded response comes from and what it is about
#[derive(clap::Args, Clone, Debug)]
pub struct SourceArgs {
    /// Recorded endpoint response (JSON)
    #[arg(short, long)]
    pub response: PathBuf,

    /// Label of the root entity
    #[arg(long, default_value = "Node")]
    pub label: String,
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
