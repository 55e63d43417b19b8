// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP implementation of the sqlbench service traits.
//!
//! A single [`ServiceClient`] talks to the versioned query API and
//! implements [`QueryService`], [`SqlGenerator`], [`ExportService`], and
//! [`HistoryService`], so one `Arc<ServiceClient>` can be handed to every
//! session.
//!
//! [`QueryService`]: sqlbench_core::QueryService
//! [`SqlGenerator`]: sqlbench_core::SqlGenerator
//! [`ExportService`]: sqlbench_core::ExportService
//! [`HistoryService`]: sqlbench_core::HistoryService

pub mod client;
pub mod services;
pub mod wire;

pub use client::ServiceClient;
