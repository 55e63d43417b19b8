// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the service traits, sessions, and the event bus.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::warn;

use crate::error::SqlbenchError;

/// Opaque name of an external database connection.
///
/// Used as the correlation key for sessions, settled events, and history
/// refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseId(pub String);

impl DatabaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatabaseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DatabaseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Monotonic request counter value, scoped to one session instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Body of `POST /dbs/{id}/query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInput {
    pub sql: String,
}

impl QueryInput {
    /// Builds a query input, rejecting SQL that is blank after trimming.
    pub fn new(sql: impl Into<String>) -> Result<Self, SqlbenchError> {
        let sql = sql.into();
        if sql.trim().is_empty() {
            return Err(SqlbenchError::Validation(
                "SQL must not be blank".to_string(),
            ));
        }
        Ok(Self { sql })
    }
}

/// Body of `POST /dbs/{id}/query/natural`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalLanguageInput {
    pub prompt: String,
}

impl NaturalLanguageInput {
    /// Builds a generation input, rejecting prompts that are blank after trimming.
    pub fn new(prompt: impl Into<String>) -> Result<Self, SqlbenchError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(SqlbenchError::Validation(
                "prompt must not be blank".to_string(),
            ));
        }
        Ok(Self { prompt })
    }
}

/// SQL produced by the natural-language service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSql {
    pub sql: String,
    #[serde(default)]
    pub explanation: String,
}

/// A result column as reported by the execution service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryColumn {
    pub name: String,
    pub data_type: String,
}

impl QueryColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// One result row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Raw execution response as it arrives from the service.
///
/// Not yet normalized: rows may omit keys and `row_count` may disagree with
/// the row list. Use [`ResultModel::from_response`] before handing it out.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub columns: Vec<QueryColumn>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub row_count: Option<u64>,
    #[serde(default)]
    pub execution_time_ms: Option<u64>,
    #[serde(default)]
    pub sql: Option<String>,
}

/// Normalized outcome of a successful query execution.
///
/// Invariants, upheld by construction:
/// - `row_count() == rows().len()`
/// - every row has exactly one key per column name; absent values are
///   stored as explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultModel {
    columns: Vec<QueryColumn>,
    rows: Vec<Row>,
    row_count: usize,
    execution_time_ms: u64,
    source_sql: String,
}

impl ResultModel {
    /// Normalizes a service response.
    ///
    /// `submitted_sql` is used as the source SQL when the service does not
    /// echo one back (the service may rewrite the statement, e.g. by adding
    /// a `LIMIT`, in which case its version wins).
    pub fn from_response(response: QueryResponse, submitted_sql: &str) -> Self {
        let QueryResponse {
            columns,
            rows,
            row_count,
            execution_time_ms,
            sql,
        } = response;

        let mut dropped_keys = 0usize;
        let rows: Vec<Row> = rows
            .into_iter()
            .map(|mut raw| {
                let mut row = Row::new();
                for column in &columns {
                    let value = raw.remove(&column.name).unwrap_or(Value::Null);
                    row.entry(column.name.clone()).or_insert(value);
                }
                dropped_keys += raw.len();
                row
            })
            .collect();

        if dropped_keys > 0 {
            warn!(
                dropped_keys,
                "result rows carried keys outside the column list; dropped"
            );
        }
        if let Some(reported) = row_count
            && reported != rows.len() as u64
        {
            warn!(
                reported,
                actual = rows.len(),
                "service row count disagrees with rows; using actual"
            );
        }

        Self {
            row_count: rows.len(),
            columns,
            rows,
            execution_time_ms: execution_time_ms.unwrap_or(0),
            source_sql: sql.unwrap_or_else(|| submitted_sql.to_string()),
        }
    }

    pub fn columns(&self) -> &[QueryColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn execution_time_ms(&self) -> u64 {
        self.execution_time_ms
    }

    pub fn source_sql(&self) -> &str {
        &self.source_sql
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Where the SQL of an attempt came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuerySource {
    #[default]
    Manual,
    NaturalLanguage,
}

/// Output format accepted by the export service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

/// Body of `POST /dbs/{id}/export`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRequest {
    pub columns: Vec<QueryColumn>,
    pub rows: Vec<Row>,
    pub format: ExportFormat,
}

impl ExportRequest {
    /// Exports exactly the displayed result: all columns, all rows.
    pub fn from_result(result: &ResultModel, format: ExportFormat) -> Self {
        Self {
            columns: result.columns().to_vec(),
            rows: result.rows().to_vec(),
            format,
        }
    }
}

/// A downloadable export payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

impl ExportResult {
    /// Builds a payload whose filename is guaranteed to end in the format's
    /// extension. A blank suggested filename is replaced by a timestamped one.
    pub fn new(bytes: Vec<u8>, suggested_filename: Option<&str>, format: ExportFormat) -> Self {
        let ext = format.extension();
        let filename = match suggested_filename.map(str::trim) {
            Some(name) if !name.is_empty() => {
                let wanted = format!(".{ext}");
                if name.to_ascii_lowercase().ends_with(&wanted) {
                    name.to_string()
                } else {
                    format!("{name}{wanted}")
                }
            }
            _ => default_export_filename(format, Utc::now()),
        };
        Self {
            bytes,
            filename,
            mime_type: format.mime_type().to_string(),
        }
    }
}

/// `query_result_{YYYYmmdd_HHMMSS}.{ext}`
pub fn default_export_filename(format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "query_result_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// A history record owned by the external history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(default)]
    pub database_name: Option<String>,
    pub sql_text: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub executed_at: DateTime<Utc>,
    #[serde(default)]
    pub execution_time_ms: Option<u64>,
    #[serde(default)]
    pub row_count: Option<u64>,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default, rename = "querySource", alias = "source")]
    pub source: QuerySource,
}

/// Accepts RFC 3339 timestamps and naive ISO timestamps (taken as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp `{raw}`: {e}")))
}
