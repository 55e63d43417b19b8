// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result export through the export service.

use std::sync::Arc;

use sqlbench_core::{
    DatabaseId, DownloadSink, ExportFormat, ExportRequest, ExportResult, ExportService,
    ResultModel, SqlbenchError,
};
use tracing::{info, warn};

/// A payload that reached its download destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub location: String,
    pub mime_type: String,
    pub size: usize,
}

/// Converts a result into a downloadable payload.
///
/// Holds no state of its own, so the same result can be exported again in
/// any format without re-running its query.
#[derive(Clone)]
pub struct ExportConverter {
    service: Arc<dyn ExportService>,
}

impl ExportConverter {
    pub fn new(service: Arc<dyn ExportService>) -> Self {
        Self { service }
    }

    /// Sends every column and row of `result` to the export service.
    pub async fn convert(
        &self,
        database: &DatabaseId,
        result: &ResultModel,
        format: ExportFormat,
    ) -> Result<ExportResult, SqlbenchError> {
        let request = ExportRequest::from_result(result, format);
        self.service.export(database, &request).await
    }

    /// Converts and hands the payload to `sink`.
    ///
    /// Nothing is delivered when conversion fails.
    pub async fn export_to(
        &self,
        database: &DatabaseId,
        result: &ResultModel,
        format: ExportFormat,
        sink: &dyn DownloadSink,
    ) -> Result<ExportedFile, SqlbenchError> {
        let payload = match self.convert(database, result, format).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(database = %database, format = %format, error = %e, "export failed");
                return Err(e);
            }
        };
        let location = sink.deliver(&payload).await?;
        info!(
            database = %database,
            file = %payload.filename,
            bytes = payload.bytes.len(),
            "export delivered"
        );
        Ok(ExportedFile {
            filename: payload.filename,
            location,
            mime_type: payload.mime_type,
            size: payload.bytes.len(),
        })
    }
}

impl std::fmt::Debug for ExportConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConverter").finish_non_exhaustive()
    }
}
