// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic in-memory export service.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use sqlbench_core::{
    DatabaseId, ExportFormat, ExportRequest, ExportResult, ExportService, SqlbenchError,
};

/// Converts rows locally instead of calling a service.
///
/// CSV output is a header line plus one comma-joined line per row, with
/// strings written bare and `null` written as an empty field. JSON output is
/// the row array as-is.
pub struct MockExportService {
    filename: Option<String>,
    failure: Option<String>,
    requests: Mutex<Vec<ExportRequest>>,
}

impl MockExportService {
    pub fn new() -> Self {
        Self {
            filename: None,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Suggests `name` as the filename of every export.
    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }

    /// Fails every export with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn last_request(&self) -> Option<ExportRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl Default for MockExportService {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn render(request: &ExportRequest) -> Vec<u8> {
    match request.format {
        ExportFormat::Csv => {
            let names: Vec<&str> = request.columns.iter().map(|c| c.name.as_str()).collect();
            let mut out = names.join(",");
            out.push('\n');
            for row in &request.rows {
                let line: Vec<String> = names.iter().map(|n| csv_field(row.get(*n))).collect();
                out.push_str(&line.join(","));
                out.push('\n');
            }
            out.into_bytes()
        }
        ExportFormat::Json => {
            let rows: Vec<Value> = request.rows.iter().cloned().map(Value::Object).collect();
            Value::Array(rows).to_string().into_bytes()
        }
    }
}

#[async_trait]
impl ExportService for MockExportService {
    async fn export(
        &self,
        _database: &DatabaseId,
        request: &ExportRequest,
    ) -> Result<ExportResult, SqlbenchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(message) = &self.failure {
            return Err(SqlbenchError::Export {
                message: message.clone(),
                source: None,
            });
        }
        Ok(ExportResult::new(
            render(request),
            self.filename.as_deref(),
            request.format,
        ))
    }
}
