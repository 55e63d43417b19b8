// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations driving a [`SessionCoordinator`] over HTTP.

use std::io::IsTerminal;
use std::sync::Arc;

use sqlbench_client::ServiceClient;
use sqlbench_config::SqlbenchConfig;
use sqlbench_core::{ExportFormat, SqlbenchError};
use sqlbench_session::{FileDownloadSink, Outcome, Services, SessionCoordinator};
use tracing::info;

use crate::render;

/// Output switches shared by every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub json: bool,
    pub plain: bool,
}

impl OutputMode {
    fn use_color(self) -> bool {
        !self.plain && std::io::stdout().is_terminal()
    }
}

/// Builds a coordinator bound to `database` (or the configured default).
pub fn connect(
    config: &SqlbenchConfig,
    database: Option<&str>,
) -> Result<SessionCoordinator, SqlbenchError> {
    let client = Arc::new(ServiceClient::new(&config.service)?);
    let coordinator = SessionCoordinator::new(Services::from_client(client), config.history.limit);

    let database = database
        .map(str::to_string)
        .or_else(|| config.workbench.default_database.clone())
        .ok_or_else(|| {
            SqlbenchError::Validation(
                "no database given; pass --database or set workbench.default_database".to_string(),
            )
        })?;
    coordinator.bind_database(database);
    Ok(coordinator)
}

/// Executes the buffer and prints the result, or returns the service error.
async fn execute_and_print(
    coordinator: &SessionCoordinator,
    output: OutputMode,
) -> Result<(), SqlbenchError> {
    match coordinator.execute().await? {
        Outcome::Succeeded(result) => {
            if output.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(result.as_ref())
                        .unwrap_or_else(|_| "{}".to_string())
                );
            } else {
                println!("{}", render::render_table(&result));
            }
            Ok(())
        }
        Outcome::Failed(message) => Err(SqlbenchError::service(message)),
        Outcome::Superseded => Err(SqlbenchError::Internal(
            "query was superseded before it settled".to_string(),
        )),
    }
}

/// `sqlbench query <SQL>`
pub async fn run_query(
    coordinator: &SessionCoordinator,
    sql: &str,
    output: OutputMode,
) -> Result<(), SqlbenchError> {
    coordinator.edit_sql(sql);
    execute_and_print(coordinator, output).await
}

/// `sqlbench generate <PROMPT> [--adopt] [--run]`
///
/// `--run` implies `--adopt`: generated SQL is only ever executed after it
/// has been moved into the buffer.
pub async fn run_generate(
    coordinator: &SessionCoordinator,
    prompt: &str,
    adopt: bool,
    run: bool,
    output: OutputMode,
) -> Result<(), SqlbenchError> {
    let generated = match coordinator.generate(prompt).await? {
        Outcome::Succeeded(generated) => generated,
        Outcome::Failed(message) => return Err(SqlbenchError::service(message)),
        Outcome::Superseded => {
            return Err(SqlbenchError::Internal(
                "generation was superseded before it settled".to_string(),
            ));
        }
    };

    if output.json && !run {
        println!(
            "{}",
            serde_json::json!({"sql": generated.sql, "explanation": generated.explanation})
        );
    } else if !output.json {
        println!("{}", generated.sql);
        if !generated.explanation.is_empty() {
            println!();
            println!("-- {}", generated.explanation.replace('\n', "\n-- "));
        }
    }

    if adopt || run {
        coordinator.adopt_generated_sql()?;
        info!("generated SQL adopted into the buffer");
    }
    if run {
        if !output.json {
            println!();
        }
        execute_and_print(coordinator, output).await?;
    }
    Ok(())
}

/// `sqlbench export <SQL> [--format] [--out]`
pub async fn run_export(
    coordinator: &SessionCoordinator,
    config: &SqlbenchConfig,
    sql: &str,
    format: Option<ExportFormat>,
    out_dir: Option<&str>,
    output: OutputMode,
) -> Result<(), SqlbenchError> {
    coordinator.edit_sql(sql);
    match coordinator.execute().await? {
        Outcome::Succeeded(_) => {}
        Outcome::Failed(message) => return Err(SqlbenchError::service(message)),
        Outcome::Superseded => {
            return Err(SqlbenchError::Internal(
                "query was superseded before it settled".to_string(),
            ));
        }
    }

    let format = format.unwrap_or(config.export.default_format);
    let sink = FileDownloadSink::new(out_dir.unwrap_or(config.export.download_dir.as_str()));
    let file = coordinator.export(format, &sink).await?;

    if output.json {
        println!(
            "{}",
            serde_json::json!({
                "filename": file.filename,
                "location": file.location,
                "mimeType": file.mime_type,
                "size": file.size,
            })
        );
    } else if output.use_color() {
        use colored::Colorize;
        println!("{} wrote {} ({} bytes)", "✓".green(), file.location, file.size);
    } else {
        println!("[OK] wrote {} ({} bytes)", file.location, file.size);
    }
    Ok(())
}

/// `sqlbench history`
pub async fn run_history(
    coordinator: &SessionCoordinator,
    output: OutputMode,
) -> Result<(), SqlbenchError> {
    let entries = coordinator.history().await?;
    if output.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
        );
    } else {
        println!("{}", render::render_history(&entries, output.use_color()));
    }
    Ok(())
}
