// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit command channel for exports requested outside the coordinator
//! (a toast button, a keyboard shortcut handler, a background job).

use sqlbench_core::ExportFormat;
use tokio::sync::mpsc;
use tracing::warn;

/// Request to export the active result in a given format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportCommand {
    pub format: ExportFormat,
}

/// Cloneable handle used by notifiers.
#[derive(Debug, Clone)]
pub struct ExportCommandSender {
    tx: mpsc::Sender<ExportCommand>,
}

impl ExportCommandSender {
    /// Queues an export; returns `false` when the listener is gone or the
    /// queue is full.
    pub fn request(&self, format: ExportFormat) -> bool {
        match self.tx.try_send(ExportCommand { format }) {
            Ok(()) => true,
            Err(e) => {
                warn!(format = %format, error = %e, "export command not queued");
                false
            }
        }
    }
}

/// Receiving end, drained by the export command runner.
#[derive(Debug)]
pub struct ExportCommandReceiver {
    rx: mpsc::Receiver<ExportCommand>,
}

impl ExportCommandReceiver {
    pub async fn recv(&mut self) -> Option<ExportCommand> {
        self.rx.recv().await
    }
}

pub fn export_command_channel(capacity: usize) -> (ExportCommandSender, ExportCommandReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ExportCommandSender { tx }, ExportCommandReceiver { rx })
}
