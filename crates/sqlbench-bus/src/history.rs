// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History refresh tokens.
//!
//! The execution session knows *when* something history-worthy happened; the
//! history store knows *how* to fetch it. [`HistoryCorrelator`] sits between
//! them as a per-database monotonic counter, so neither side depends on the
//! other.

use std::sync::Arc;

use dashmap::DashMap;
use sqlbench_core::{DatabaseId, HistoryEntry, HistoryService, SqlbenchError};
use tokio::sync::watch;
use tracing::debug;

use crate::events::SettledOutcome;

/// Per-database history refresh tokens.
#[derive(Debug, Default)]
pub struct HistoryCorrelator {
    tokens: DashMap<DatabaseId, watch::Sender<u64>>,
}

impl HistoryCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that an execution against `database` settled.
    ///
    /// Successes and failures both bump the token: failed attempts are
    /// history-worthy too.
    pub fn notify(&self, database: &DatabaseId, outcome: &SettledOutcome) {
        let sender = self
            .tokens
            .entry(database.clone())
            .or_insert_with(|| watch::channel(0).0);
        sender.send_modify(|token| *token += 1);
        debug!(
            database = %database,
            token = *sender.borrow(),
            success = outcome.is_success(),
            "history refresh token raised"
        );
    }

    /// Current token for `database`; zero until the first notification.
    pub fn token(&self, database: &DatabaseId) -> u64 {
        self.tokens
            .get(database)
            .map(|sender| *sender.borrow())
            .unwrap_or(0)
    }

    /// Receiver that observes every later change of `database`'s token.
    pub fn subscribe(&self, database: &DatabaseId) -> watch::Receiver<u64> {
        self.tokens
            .entry(database.clone())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }
}

/// Consumer side of the correlator: re-fetches history whenever the token
/// for its database changes.
pub struct HistoryFeed {
    database: DatabaseId,
    token: watch::Receiver<u64>,
    service: Arc<dyn HistoryService>,
    limit: u32,
}

impl HistoryFeed {
    pub fn new(
        database: DatabaseId,
        correlator: &HistoryCorrelator,
        service: Arc<dyn HistoryService>,
        limit: u32,
    ) -> Self {
        let token = correlator.subscribe(&database);
        Self {
            database,
            token,
            service,
            limit,
        }
    }

    pub fn database(&self) -> &DatabaseId {
        &self.database
    }

    /// Fetches the current history without waiting for a change.
    pub async fn fetch(&mut self) -> Result<Vec<HistoryEntry>, SqlbenchError> {
        self.token.borrow_and_update();
        self.service.list_history(&self.database, self.limit).await
    }

    /// Waits for the next token change, then fetches.
    ///
    /// Several notifications that land before the wait resumes collapse into
    /// one fetch. Returns `None` once the correlator has been dropped.
    pub async fn next_refresh(&mut self) -> Option<Result<Vec<HistoryEntry>, SqlbenchError>> {
        self.token.changed().await.ok()?;
        let token = *self.token.borrow_and_update();
        debug!(database = %self.database, token, "re-fetching history");
        Some(self.service.list_history(&self.database, self.limit).await)
    }
}
