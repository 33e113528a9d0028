// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! GraphResults command-line driver

mod cli;

use clap::Parser;
use colored::Colorize;

use cli::{handle_pre_query, handle_run, handle_version, Cli, Commands, RunOptions};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Version => {
            handle_version();
            Ok(())
        }
        Commands::Run {
            source,
            count,
            graph,
            total_count,
            active,
            page_size,
            config,
            format,
        } => {
            let options = RunOptions {
                source,
                count,
                graph,
                total_count,
                active,
                page_size,
                config,
            };
            handle_run(options, format).await
        }
        Commands::PreQuery { source } => handle_pre_query(source).await,
    };

    if let Err(e) = result {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

/// `--verbose` wins over `--log-level`; with neither, `RUST_LOG` decides
fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    let level = if cli.verbose {
        Some(log::LevelFilter::Debug)
    } else {
        cli.log_level.map(|level| level.to_level_filter())
    };
    if let Some(level) = level {
        builder.filter_level(level);
    }

    builder.init();
}
