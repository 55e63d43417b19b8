// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Natural-language to SQL generation session.

use std::sync::Arc;

use chrono::Utc;
use sqlbench_bus::{SessionKind, SettledBus, SettledEvent, SettledOutcome};
use sqlbench_core::{
    DatabaseId, GeneratedSql, NaturalLanguageInput, QuerySource, SqlGenerator, SqlbenchError,
};
use tracing::{debug, info, warn};

use crate::attempt::{AttemptSession, Outcome, SessionState, Settled};

/// Generates SQL from prompts against one database.
///
/// Generated SQL is never executed from here; it reaches the SQL buffer only
/// through the coordinator's explicit adopt step. Settlements are published
/// on the bus but do not touch query history.
pub struct NaturalLanguageSession {
    database: DatabaseId,
    generator: Arc<dyn SqlGenerator>,
    attempts: AttemptSession<GeneratedSql>,
    bus: SettledBus,
}

impl NaturalLanguageSession {
    pub fn new(database: DatabaseId, generator: Arc<dyn SqlGenerator>, bus: SettledBus) -> Self {
        Self {
            database,
            generator,
            attempts: AttemptSession::new("generation"),
            bus,
        }
    }

    pub async fn submit(&self, prompt: &str) -> Result<Outcome<GeneratedSql>, SqlbenchError> {
        let input = NaturalLanguageInput::new(prompt)?;
        let request_id = self.attempts.begin();
        debug!(database = %self.database, request = %request_id, "generation submitted");

        let result = self
            .generator
            .generate(&self.database, &input)
            .await
            .map_err(|e| e.service_message());
        let outcome = self.attempts.settle(request_id, result);

        let settled = match &outcome {
            Outcome::Superseded => return Ok(outcome),
            Outcome::Succeeded(generated) => {
                info!(database = %self.database, request = %request_id, "SQL generated");
                debug!(sql = %generated.sql, "generated SQL");
                SettledOutcome::Success {
                    row_count: None,
                    execution_time_ms: None,
                }
            }
            Outcome::Failed(message) => {
                warn!(
                    database = %self.database,
                    request = %request_id,
                    error = %message,
                    "generation failed"
                );
                SettledOutcome::Failure {
                    message: message.clone(),
                }
            }
        };
        self.bus.publish(SettledEvent {
            database_id: self.database.clone(),
            kind: SessionKind::Generation,
            request_id,
            source: QuerySource::NaturalLanguage,
            outcome: settled,
            settled_at: Utc::now(),
        });
        Ok(outcome)
    }

    pub fn reset(&self) {
        self.attempts.reset();
    }

    pub fn state(&self) -> SessionState<GeneratedSql> {
        self.attempts.state()
    }

    pub fn displayed(&self) -> Option<Settled<GeneratedSql>> {
        self.attempts.displayed()
    }
}

impl std::fmt::Debug for NaturalLanguageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NaturalLanguageSession")
            .field("database", &self.database)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}
