// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQL execution session for one database.

use std::sync::Arc;

use chrono::Utc;
use sqlbench_bus::{HistoryCorrelator, SessionKind, SettledBus, SettledEvent, SettledOutcome};
use sqlbench_core::{
    DatabaseId, QueryInput, QueryService, QuerySource, RequestId, ResultModel, SqlbenchError,
};
use tracing::{debug, info, warn};

use crate::attempt::{AttemptSession, Outcome, SessionState, Settled};

/// Runs SQL against one database, applying only the latest response.
///
/// Every applied settlement, success or failure, is published on the
/// settled bus and raises the database's history refresh token.
pub struct ExecutionSession {
    database: DatabaseId,
    service: Arc<dyn QueryService>,
    attempts: AttemptSession<ResultModel>,
    bus: SettledBus,
    history: Arc<HistoryCorrelator>,
}

impl ExecutionSession {
    pub fn new(
        database: DatabaseId,
        service: Arc<dyn QueryService>,
        bus: SettledBus,
        history: Arc<HistoryCorrelator>,
    ) -> Self {
        Self {
            database,
            service,
            attempts: AttemptSession::new("execution"),
            bus,
            history,
        }
    }

    pub fn database(&self) -> &DatabaseId {
        &self.database
    }

    /// Submits `sql` and waits for it to settle.
    ///
    /// Blank SQL is rejected with [`SqlbenchError::Validation`] before the
    /// state is touched. Service failures are not errors here: they settle
    /// the session as `Failed` and come back as [`Outcome::Failed`].
    pub async fn submit(
        &self,
        sql: &str,
        source: QuerySource,
    ) -> Result<Outcome<ResultModel>, SqlbenchError> {
        let input = QueryInput::new(sql)?;
        let request_id = self.attempts.begin();
        debug!(database = %self.database, request = %request_id, "query submitted");

        let result = self
            .service
            .execute(&self.database, &input)
            .await
            .map(|response| ResultModel::from_response(response, &input.sql))
            .map_err(|e| e.service_message());

        let outcome = self.attempts.settle(request_id, result);
        self.announce(request_id, source, &outcome);
        Ok(outcome)
    }

    fn announce(&self, request_id: RequestId, source: QuerySource, outcome: &Outcome<ResultModel>) {
        let settled = match outcome {
            Outcome::Superseded => return,
            Outcome::Succeeded(result) => {
                info!(
                    database = %self.database,
                    request = %request_id,
                    rows = result.row_count(),
                    elapsed_ms = result.execution_time_ms(),
                    "query succeeded"
                );
                SettledOutcome::Success {
                    row_count: Some(result.row_count()),
                    execution_time_ms: Some(result.execution_time_ms()),
                }
            }
            Outcome::Failed(message) => {
                warn!(
                    database = %self.database,
                    request = %request_id,
                    error = %message,
                    "query failed"
                );
                SettledOutcome::Failure {
                    message: message.clone(),
                }
            }
        };

        self.history.notify(&self.database, &settled);
        self.bus.publish(SettledEvent {
            database_id: self.database.clone(),
            kind: SessionKind::Execution,
            request_id,
            source,
            outcome: settled,
            settled_at: Utc::now(),
        });
    }

    /// Returns to `Idle`; a response still in flight will be dropped.
    pub fn reset(&self) {
        self.attempts.reset();
    }

    pub fn state(&self) -> SessionState<ResultModel> {
        self.attempts.state()
    }

    pub fn displayed(&self) -> Option<Settled<ResultModel>> {
        self.attempts.displayed()
    }

    /// The result currently on display, if the displayed attempt succeeded.
    pub fn displayed_result(&self) -> Option<Arc<ResultModel>> {
        self.displayed().and_then(|settled| settled.payload().cloned())
    }
}

impl std::fmt::Debug for ExecutionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionSession")
            .field("database", &self.database)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}
