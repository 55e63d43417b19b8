// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire shapes that exist only at the HTTP boundary.

use serde::Deserialize;

/// Error envelope. The service answers either `{"error": {...}}` or, when
/// raised through the framework's exception handler, `{"detail": {"error": {...}}}`.
/// Plain `{"detail": "text"}` bodies also occur for request validation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorBody {
    Direct { error: ApiErrorDetail },
    Wrapped { detail: WrappedDetail },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WrappedDetail {
    Error { error: ApiErrorDetail },
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

impl ApiErrorBody {
    /// The human-readable message, exactly as the service wrote it.
    pub fn message(&self) -> &str {
        match self {
            ApiErrorBody::Direct { error }
            | ApiErrorBody::Wrapped {
                detail: WrappedDetail::Error { error },
            } => &error.message,
            ApiErrorBody::Wrapped {
                detail: WrappedDetail::Text(text),
            } => text,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiErrorBody::Direct { error }
            | ApiErrorBody::Wrapped {
                detail: WrappedDetail::Error { error },
            } => error.code.as_deref(),
            ApiErrorBody::Wrapped { .. } => None,
        }
    }
}

/// Export response: the converted payload as text plus the suggested name.
#[derive(Debug, Deserialize)]
pub struct ExportResponse {
    pub data: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}
