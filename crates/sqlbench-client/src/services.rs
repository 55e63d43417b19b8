// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service trait implementations backed by [`ServiceClient`].

use async_trait::async_trait;
use sqlbench_core::{
    DatabaseId, ExportRequest, ExportResult, ExportService, GeneratedSql, HistoryEntry,
    HistoryService, NaturalLanguageInput, QueryInput, QueryResponse, QueryService, SqlGenerator,
    SqlbenchError,
};
use tracing::debug;

use crate::client::ServiceClient;
use crate::wire::ExportResponse;

#[async_trait]
impl QueryService for ServiceClient {
    async fn execute(
        &self,
        database: &DatabaseId,
        input: &QueryInput,
    ) -> Result<QueryResponse, SqlbenchError> {
        let url = self.endpoint(database, &["query"])?;
        debug!(database = %database, "executing query");
        self.post_json(url, input).await
    }
}

#[async_trait]
impl SqlGenerator for ServiceClient {
    async fn generate(
        &self,
        database: &DatabaseId,
        input: &NaturalLanguageInput,
    ) -> Result<GeneratedSql, SqlbenchError> {
        let url = self.endpoint(database, &["query", "natural"])?;
        debug!(database = %database, "generating SQL from prompt");
        self.post_json(url, input).await
    }
}

#[async_trait]
impl ExportService for ServiceClient {
    async fn export(
        &self,
        database: &DatabaseId,
        request: &ExportRequest,
    ) -> Result<ExportResult, SqlbenchError> {
        let url = self.endpoint(database, &["export"])?;
        debug!(
            database = %database,
            format = %request.format,
            rows = request.rows.len(),
            "requesting export"
        );
        let response: ExportResponse = self.post_json(url, request).await.map_err(|e| match e {
            SqlbenchError::Service {
                message, source, ..
            } => SqlbenchError::Export { message, source },
            other => other,
        })?;
        Ok(ExportResult::new(
            response.data.into_bytes(),
            response.filename.as_deref(),
            request.format,
        ))
    }
}

#[async_trait]
impl HistoryService for ServiceClient {
    async fn list_history(
        &self,
        database: &DatabaseId,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, SqlbenchError> {
        let mut url = self.endpoint(database, &["history"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }
}
