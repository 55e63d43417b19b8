// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./sqlbench.toml` > `~/.config/sqlbench/sqlbench.toml`
//! > `/etc/sqlbench/sqlbench.toml`, with `SQLBENCH_` environment overrides.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SqlbenchConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/sqlbench/sqlbench.toml`
/// 3. `~/.config/sqlbench/sqlbench.toml`
/// 4. `./sqlbench.toml`
/// 5. `SQLBENCH_*` environment variables
pub fn load_config() -> Result<SqlbenchConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SqlbenchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SqlbenchConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SqlbenchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SqlbenchConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for XDG config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SqlbenchConfig::default()))
        .merge(Toml::file("/etc/sqlbench/sqlbench.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("sqlbench/sqlbench.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("sqlbench.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `SQLBENCH_SERVICE_BASE_URL` must map to `service.base_url`,
/// not `service.base.url`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("SQLBENCH_").map(|key| {
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("service_", "service.", 1)
            .replacen("history_", "history.", 1)
            .replacen("export_", "export.", 1)
            .replacen("workbench_", "workbench.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SQLBENCH_SERVICE_BASE_URL", "http://db-api:9000/api/v1");
            jail.set_env("SQLBENCH_HISTORY_LIMIT", "25");
            jail.set_env("SQLBENCH_WORKBENCH_DEFAULT_DATABASE", "analytics");

            let config: SqlbenchConfig = Figment::new()
                .merge(Serialized::defaults(SqlbenchConfig::default()))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.service.base_url, "http://db-api:9000/api/v1");
            assert_eq!(config.history.limit, 25);
            assert_eq!(
                config.workbench.default_database.as_deref(),
                Some("analytics")
            );
            Ok(())
        });
    }

    #[test]
    fn env_overrides_apply_on_top_of_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("sqlbench.toml", "[history]\nlimit = 10\n")?;
            jail.set_env("SQLBENCH_HISTORY_LIMIT", "200");
            jail.set_env("SQLBENCH_EXPORT_DEFAULT_FORMAT", "json");

            let config = load_config_from_path(Path::new("sqlbench.toml"))?;
            assert_eq!(config.history.limit, 200);
            assert_eq!(
                config.export.default_format,
                sqlbench_core::ExportFormat::Json
            );
            Ok(())
        });
    }

    #[test]
    fn local_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "sqlbench.toml",
                r#"
[export]
download_dir = "exports"
default_format = "json"
"#,
            )?;

            let config = load_config_from_path(Path::new("sqlbench.toml"))?;
            assert_eq!(config.export.download_dir, "exports");
            assert_eq!(
                config.export.default_format,
                sqlbench_core::ExportFormat::Json
            );
            assert_eq!(config.history.limit, 50);
            Ok(())
        });
    }
}
