// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Download sink that keeps delivered payloads in memory.

use std::sync::Mutex;

use async_trait::async_trait;
use sqlbench_core::{DownloadSink, ExportResult, SqlbenchError};

#[derive(Default)]
pub struct CapturingSink {
    delivered: Mutex<Vec<ExportResult>>,
    fail: bool,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every delivery fails and stores nothing.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<ExportResult> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DownloadSink for CapturingSink {
    async fn deliver(&self, export: &ExportResult) -> Result<String, SqlbenchError> {
        if self.fail {
            return Err(SqlbenchError::Download {
                path: format!("memory://{}", export.filename),
                source: "sink rejected the payload".into(),
            });
        }
        self.delivered
            .lock()
            .map_err(|_| SqlbenchError::Internal("sink poisoned".into()))?
            .push(export.clone());
        Ok(format!("memory://{}", export.filename))
    }
}
