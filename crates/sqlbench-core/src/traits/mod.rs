// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams for the external collaborators of the session controller.
//!
//! All traits use `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait + Send + Sync>`.

pub mod download;
pub mod service;

pub use download::DownloadSink;
pub use service::{ExportService, HistoryService, QueryService, SqlGenerator};
