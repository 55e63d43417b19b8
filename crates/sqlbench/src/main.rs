// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! sqlbench - a command-line SQL workbench over a remote query service.
//!
//! This is the binary entry point.

mod render;
mod workbench;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlbench_core::ExportFormat;

use workbench::OutputMode;

/// sqlbench - run, generate, and export SQL against a query service.
#[derive(Parser, Debug)]
#[command(name = "sqlbench", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the XDG lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database to bind (overrides workbench.default_database).
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colors.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute SQL and print the result.
    Query {
        /// SQL text to execute.
        sql: String,
    },
    /// Generate SQL from a natural-language prompt.
    Generate {
        /// What the query should do, in plain words.
        prompt: String,
        /// Move the generated SQL into the buffer.
        #[arg(long)]
        adopt: bool,
        /// Adopt and then execute the generated SQL.
        #[arg(long)]
        run: bool,
    },
    /// Execute SQL and export the result to a file.
    Export {
        /// SQL text to execute.
        sql: String,
        /// Export format (csv or json).
        #[arg(short, long)]
        format: Option<ExportFormat>,
        /// Directory to write into (overrides export.download_dir).
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Show recent query history for the database.
    History,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => sqlbench_config::load_and_validate_path(path),
        None => sqlbench_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            sqlbench_config::render_errors(&errors);
            std::process::exit(2);
        }
    };

    init_tracing(&config.workbench.log_level);

    let output = OutputMode {
        json: cli.json,
        plain: cli.plain,
    };

    let result = match workbench::connect(&config, cli.database.as_deref()) {
        Ok(coordinator) => match &cli.command {
            Commands::Query { sql } => workbench::run_query(&coordinator, sql, output).await,
            Commands::Generate { prompt, adopt, run } => {
                workbench::run_generate(&coordinator, prompt, *adopt, *run, output).await
            }
            Commands::Export { sql, format, out } => {
                workbench::run_export(
                    &coordinator,
                    &config,
                    sql,
                    *format,
                    out.as_deref(),
                    output,
                )
                .await
            }
            Commands::History => workbench::run_history(&coordinator, output).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("sqlbench: {e}");
        std::process::exit(1);
    }
}

/// Installs the fmt subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sqlbench={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
