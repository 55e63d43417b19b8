// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Download sink that writes exports into a directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlbench_core::{DownloadSink, ExportResult, SqlbenchError};
use tracing::debug;

/// Writes each payload to `<dir>/<filename>` via a `.part` file and a
/// rename, so a failed write leaves nothing under the final name.
#[derive(Debug, Clone)]
pub struct FileDownloadSink {
    dir: PathBuf,
}

impl FileDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path for `filename`. Only the last path component of the
    /// suggested name is used.
    pub fn target_path(&self, filename: &str) -> Result<PathBuf, SqlbenchError> {
        let name = Path::new(filename)
            .file_name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                SqlbenchError::Validation(format!("export filename `{filename}` is not a file name"))
            })?;
        Ok(self.dir.join(name))
    }
}

fn download_error(path: &Path, e: std::io::Error) -> SqlbenchError {
    SqlbenchError::Download {
        path: path.display().to_string(),
        source: Box::new(e),
    }
}

#[async_trait]
impl DownloadSink for FileDownloadSink {
    async fn deliver(&self, export: &ExportResult) -> Result<String, SqlbenchError> {
        let target = self.target_path(&export.filename)?;
        let mut part = target.clone().into_os_string();
        part.push(".part");
        let part = PathBuf::from(part);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| download_error(&self.dir, e))?;

        if let Err(e) = tokio::fs::write(&part, &export.bytes).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(download_error(&target, e));
        }
        if let Err(e) = tokio::fs::rename(&part, &target).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(download_error(&target, e));
        }

        debug!(path = %target.display(), bytes = export.bytes.len(), "export written");
        Ok(target.display().to_string())
    }
}
