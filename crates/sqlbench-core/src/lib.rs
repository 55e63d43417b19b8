// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the sqlbench query workbench.
//!
//! This crate provides the result model, the error taxonomy, and the trait
//! seams for the external services (execution, SQL generation, export,
//! history) that the session controller talks to. Every other crate in the
//! workspace builds on the items defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SqlbenchError;
pub use types::{
    DatabaseId, ExportFormat, ExportRequest, ExportResult, GeneratedSql, HistoryEntry,
    NaturalLanguageInput, QueryColumn, QueryInput, QueryResponse, QuerySource, RequestId,
    ResultModel, Row,
};

// Re-export all service traits at crate root.
pub use traits::{DownloadSink, ExportService, HistoryService, QueryService, SqlGenerator};
