// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde cannot express: URL syntax, non-zero
//! timeouts, the history limit range, and known log levels.

use tracing::warn;

use crate::diagnostic::ConfigError;
use crate::model::SqlbenchConfig;

/// Upper bound accepted for `history.limit`.
pub const MAX_HISTORY_LIMIT: u32 = 1000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn is_loopback(url: &url::Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &SqlbenchConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.service.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "service.base_url must not be empty".to_string(),
        });
    } else {
        match url::Url::parse(base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                if config.service.api_key.is_some()
                    && parsed.scheme() == "http"
                    && !is_loopback(&parsed)
                {
                    warn!(url = %parsed, "service.api_key will be sent over plain http");
                }
            }
            Ok(parsed) => errors.push(ConfigError::Validation {
                message: format!(
                    "service.base_url must use http or https, got `{}`",
                    parsed.scheme()
                ),
            }),
            Err(e) => errors.push(ConfigError::Validation {
                message: format!("service.base_url `{base_url}` is not a valid URL: {e}"),
            }),
        }
    }

    if config.service.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "service.timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.history.limit == 0 || config.history.limit > MAX_HISTORY_LIMIT {
        errors.push(ConfigError::Validation {
            message: format!(
                "history.limit must be between 1 and {MAX_HISTORY_LIMIT}, got {}",
                config.history.limit
            ),
        });
    }

    if config.export.download_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "export.download_dir must not be empty".to_string(),
        });
    }

    let level = config.workbench.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "workbench.log_level `{}` is not one of {}",
                config.workbench.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if let Some(db) = &config.workbench.default_database
        && db.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "workbench.default_database must not be blank when set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
