// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query sessions for the sqlbench workbench.
//!
//! Each session tracks one category of asynchronous attempt (execution or
//! SQL generation) for one database. Only the response to the most recently
//! issued request is ever applied; older responses are dropped silently.
//!
//! - [`AttemptSession`] - the generic counter-plus-state machine
//! - [`ExecutionSession`] / [`NaturalLanguageSession`] - the two session kinds
//! - [`ExportConverter`] and [`FileDownloadSink`] - result export
//! - [`SessionCoordinator`] - active database, SQL buffer, explicit handoffs

pub mod attempt;
pub mod commands;
pub mod coordinator;
pub mod download;
pub mod execution;
pub mod export;
pub mod generation;

pub use attempt::{AttemptSession, Outcome, SessionState, Settled};
pub use commands::run_export_commands;
pub use coordinator::{DatabaseSessions, Services, SessionCoordinator};
pub use download::FileDownloadSink;
pub use execution::ExecutionSession;
pub use export::{ExportConverter, ExportedFile};
pub use generation::NaturalLanguageSession;
