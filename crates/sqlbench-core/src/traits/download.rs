// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Destination for exported payloads.

use async_trait::async_trait;

use crate::error::SqlbenchError;
use crate::types::ExportResult;

/// Receives a finished export and stores it under its filename.
///
/// Implementations must not leave a partial file behind when `deliver`
/// fails.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Stores the payload and returns a human-readable location.
    async fn deliver(&self, export: &ExportResult) -> Result<String, SqlbenchError>;
}
