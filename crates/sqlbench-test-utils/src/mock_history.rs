// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory history store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlbench_core::{DatabaseId, HistoryEntry, HistoryService, QuerySource, SqlbenchError};

#[derive(Default)]
struct Store {
    entries: HashMap<DatabaseId, Vec<HistoryEntry>>,
    next_id: i64,
    calls: usize,
    last_limit: Option<u32>,
}

/// A history service whose entries are pushed by the test.
///
/// Listing returns the newest entries first, truncated to the limit.
#[derive(Default)]
pub struct MockHistoryService {
    store: Mutex<Store>,
}

impl MockHistoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entry for `database` as if the service had executed `sql`.
    pub fn push_entry(&self, database: &DatabaseId, sql: &str, success: bool) {
        let Ok(mut store) = self.store.lock() else {
            return;
        };
        store.next_id += 1;
        let entry = HistoryEntry {
            id: store.next_id,
            database_name: Some(database.to_string()),
            sql_text: sql.to_string(),
            executed_at: Utc::now(),
            execution_time_ms: success.then_some(1),
            row_count: success.then_some(0),
            success,
            error_message: (!success).then(|| "mock failure".to_string()),
            source: QuerySource::Manual,
        };
        store.entries.entry(database.clone()).or_default().push(entry);
    }

    pub fn call_count(&self) -> usize {
        self.store.lock().map(|s| s.calls).unwrap_or(0)
    }

    pub fn last_limit(&self) -> Option<u32> {
        self.store.lock().ok().and_then(|s| s.last_limit)
    }
}

#[async_trait]
impl HistoryService for MockHistoryService {
    async fn list_history(
        &self,
        database: &DatabaseId,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, SqlbenchError> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| SqlbenchError::Internal("history store poisoned".into()))?;
        store.calls += 1;
        store.last_limit = Some(limit);
        Ok(store
            .entries
            .get(database)
            .map(|entries| {
                entries
                    .iter()
                    .rev()
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
