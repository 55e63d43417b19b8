// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the sqlbench workspace.
//!
//! A stale response is deliberately absent from this enum: dropping a
//! superseded response is a normal outcome of a session, not an error.

use thiserror::Error;

/// The primary error type used across all service traits and sessions.
#[derive(Debug, Error)]
pub enum SqlbenchError {
    /// Rejected locally before any service call (blank SQL or prompt, no
    /// database bound, nothing to export).
    #[error("validation error: {0}")]
    Validation(String),

    /// Network failure or an error reported by a remote service.
    #[error("service error: {message}")]
    Service {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The export service could not convert a result.
    #[error("export error: {message}")]
    Export {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Writing an exported payload to its destination failed.
    #[error("download to {path} failed: {source}")]
    Download {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, bad URL, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SqlbenchError {
    /// Builds a service error carrying only a message.
    pub fn service(message: impl Into<String>) -> Self {
        SqlbenchError::Service {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Returns the message to show in a `Failed` session state.
    ///
    /// Service and export messages are returned verbatim, without the
    /// display prefix; every other variant falls back to its display form.
    pub fn service_message(&self) -> String {
        match self {
            SqlbenchError::Service { message, .. } | SqlbenchError::Export { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    /// True when the error was produced locally without reaching a service.
    pub fn is_validation(&self) -> bool {
        matches!(self, SqlbenchError::Validation(_))
    }
}
