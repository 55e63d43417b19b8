// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drains export commands sent by decoupled notifiers.

use std::sync::Arc;

use sqlbench_bus::ExportCommandReceiver;
use sqlbench_core::DownloadSink;
use tracing::{info, warn};

use crate::coordinator::SessionCoordinator;

/// Exports the active result once per received command until every sender
/// is dropped. Returns how many exports were delivered.
///
/// A failed export is logged and does not stop the loop.
pub async fn run_export_commands(
    coordinator: Arc<SessionCoordinator>,
    mut commands: ExportCommandReceiver,
    sink: Arc<dyn DownloadSink>,
) -> usize {
    let mut delivered = 0;
    while let Some(command) = commands.recv().await {
        match coordinator.export(command.format, sink.as_ref()).await {
            Ok(file) => {
                delivered += 1;
                info!(format = %command.format, location = %file.location, "export command done");
            }
            Err(e) => {
                warn!(format = %command.format, error = %e, "export command failed");
            }
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Services;
    use serde_json::json;
    use sqlbench_bus::export_command_channel;
    use sqlbench_core::ExportFormat;
    use sqlbench_test_utils::{
        CapturingSink, MockExportService, MockHistoryService, MockQueryService, MockSqlGenerator,
        query_response,
    };

    #[tokio::test]
    async fn each_command_exports_the_active_result() {
        let query = Arc::new(MockQueryService::new());
        query.push_response(query_response(&["id"], vec![json!({"id": "1"})]));
        let coordinator = Arc::new(SessionCoordinator::new(
            Services {
                query,
                generator: Arc::new(MockSqlGenerator::new()),
                export: Arc::new(MockExportService::new()),
                history: Arc::new(MockHistoryService::new()),
            },
            50,
        ));
        coordinator.bind_database("a");
        coordinator.edit_sql("SELECT id FROM t");
        coordinator.execute().await.unwrap();

        let sink = Arc::new(CapturingSink::new());
        let (tx, rx) = export_command_channel(8);
        assert!(tx.request(ExportFormat::Csv));
        assert!(tx.request(ExportFormat::Json));
        drop(tx);

        let delivered = run_export_commands(coordinator, rx, sink.clone()).await;
        assert_eq!(delivered, 2);
        let names: Vec<String> = sink.delivered().into_iter().map(|e| e.filename).collect();
        assert!(names[0].ends_with(".csv"));
        assert!(names[1].ends_with(".json"));
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_runner() {
        let coordinator = Arc::new(SessionCoordinator::new(
            Services {
                query: Arc::new(MockQueryService::new()),
                generator: Arc::new(MockSqlGenerator::new()),
                export: Arc::new(MockExportService::new()),
                history: Arc::new(MockHistoryService::new()),
            },
            50,
        ));
        let (tx, rx) = export_command_channel(8);
        tx.request(ExportFormat::Csv);
        drop(tx);

        // No database bound: the command fails but the runner finishes.
        let delivered = run_export_commands(coordinator, rx, Arc::new(CapturingSink::new())).await;
        assert_eq!(delivered, 0);
    }
}
