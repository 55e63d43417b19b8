// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for sqlbench.
//!
//! Provides in-memory implementations of every service trait so session
//! behavior can be tested deterministically without a running query service.
//!
//! # Components
//!
//! - [`MockQueryService`] - scripted execution responses with optional delays
//! - [`MockSqlGenerator`] - scripted natural-language generation responses
//! - [`MockExportService`] - deterministic CSV/JSON conversion
//! - [`MockHistoryService`] - in-memory history store
//! - [`CapturingSink`] - download sink that keeps payloads in memory

pub mod mock_export;
pub mod mock_history;
pub mod mock_services;
pub mod sink;

pub use mock_export::MockExportService;
pub use mock_history::MockHistoryService;
pub use mock_services::{query_response, MockQueryService, MockSqlGenerator};
pub use sink::CapturingSink;
