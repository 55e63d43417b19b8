// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the sqlbench workbench.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};
use sqlbench_core::ExportFormat;

/// Top-level sqlbench configuration.
///
/// Every section is optional and defaults to values that target a local
/// query service on port 8000.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SqlbenchConfig {
    /// Remote query service endpoint and client behavior.
    #[serde(default)]
    pub service: ServiceConfig,

    /// History listing settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Export and download settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Workbench defaults.
    #[serde(default)]
    pub workbench: WorkbenchConfig,
}

/// Remote query service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Base URL of the versioned API, without a trailing `/dbs`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on 429/502/503. Zero disables retrying.
    #[serde(default)]
    pub max_retries: u32,

    /// Optional bearer token sent as `Authorization: Bearer <key>`.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            api_key: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// History listing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Number of entries requested per history fetch.
    #[serde(default = "default_history_limit")]
    pub limit: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> u32 {
    50
}

/// Export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory exported files are written into.
    #[serde(default = "default_download_dir")]
    pub download_dir: String,

    /// Format used when none is requested explicitly.
    #[serde(default)]
    pub default_format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            default_format: ExportFormat::default(),
        }
    }
}

fn default_download_dir() -> String {
    ".".to_string()
}

/// Workbench defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkbenchConfig {
    /// Database bound at startup when none is given on the command line.
    #[serde(default)]
    pub default_database: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            default_database: None,
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
