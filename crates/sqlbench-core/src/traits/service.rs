// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote services consumed by the sessions: execution, natural-language
//! generation, export, and history listing.

use async_trait::async_trait;

use crate::error::SqlbenchError;
use crate::types::{
    DatabaseId, ExportRequest, ExportResult, GeneratedSql, HistoryEntry, NaturalLanguageInput,
    QueryInput, QueryResponse,
};

/// Executes SQL against a named database (`POST /dbs/{id}/query`).
///
/// Any retry policy lives in the implementation; callers never retry.
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn execute(
        &self,
        database: &DatabaseId,
        input: &QueryInput,
    ) -> Result<QueryResponse, SqlbenchError>;
}

/// Turns a natural-language prompt into SQL (`POST /dbs/{id}/query/natural`).
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn generate(
        &self,
        database: &DatabaseId,
        input: &NaturalLanguageInput,
    ) -> Result<GeneratedSql, SqlbenchError>;
}

/// Converts displayed results into a downloadable payload (`POST /dbs/{id}/export`).
///
/// Formatting rules (CSV quoting, JSON encoding of non-scalar cells) belong
/// to the service, so conversion is never done locally.
#[async_trait]
pub trait ExportService: Send + Sync {
    async fn export(
        &self,
        database: &DatabaseId,
        request: &ExportRequest,
    ) -> Result<ExportResult, SqlbenchError>;
}

/// Reads the externally owned query history (`GET /dbs/{id}/history?limit=N`).
#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn list_history(
        &self,
        database: &DatabaseId,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, SqlbenchError>;
}
