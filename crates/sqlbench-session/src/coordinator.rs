// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session coordinator: active database, SQL buffer, and one execution
//! and one generation session per database.
//!
//! Sessions are created lazily per database and kept for the coordinator's
//! lifetime. Switching the active database resets the sessions being
//! activated; the sessions left behind keep running, so a response for the
//! previous database still settles into that database's own session without
//! touching the active view.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sqlbench_bus::{
    HistoryCorrelator, HistoryFeed, SettledBus, SettledEvent, SettledSubscription,
};
use sqlbench_core::{
    DatabaseId, DownloadSink, ExportFormat, ExportResult, ExportService, GeneratedSql,
    HistoryEntry, HistoryService, QueryService, QuerySource, ResultModel, SqlGenerator,
    SqlbenchError,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::attempt::{Outcome, SessionState};
use crate::execution::ExecutionSession;
use crate::export::{ExportConverter, ExportedFile};
use crate::generation::NaturalLanguageSession;

/// The four remote services a coordinator drives.
#[derive(Clone)]
pub struct Services {
    pub query: Arc<dyn QueryService>,
    pub generator: Arc<dyn SqlGenerator>,
    pub export: Arc<dyn ExportService>,
    pub history: Arc<dyn HistoryService>,
}

impl Services {
    /// Uses one client for every service.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: QueryService + SqlGenerator + ExportService + HistoryService + 'static,
    {
        Self {
            query: client.clone(),
            generator: client.clone(),
            export: client.clone(),
            history: client,
        }
    }
}

/// Both sessions of one database.
#[derive(Debug)]
pub struct DatabaseSessions {
    pub execution: ExecutionSession,
    pub generation: NaturalLanguageSession,
}

struct State {
    active: Option<DatabaseId>,
    sql_buffer: String,
    source: QuerySource,
    sessions: HashMap<DatabaseId, Arc<DatabaseSessions>>,
}

/// Owns the SQL buffer and routes actions to the active database's sessions.
///
/// All methods take `&self`; wrap the coordinator in an `Arc` to share it
/// between tasks.
pub struct SessionCoordinator {
    services: Services,
    exporter: ExportConverter,
    history_limit: u32,
    bus: SettledBus,
    correlator: Arc<HistoryCorrelator>,
    state: Mutex<State>,
}

impl SessionCoordinator {
    pub fn new(services: Services, history_limit: u32) -> Self {
        Self::with_bus(services, history_limit, SettledBus::default())
    }

    /// Builds a coordinator that publishes on an existing bus.
    pub fn with_bus(services: Services, history_limit: u32, bus: SettledBus) -> Self {
        Self {
            exporter: ExportConverter::new(Arc::clone(&services.export)),
            services,
            history_limit,
            bus,
            correlator: Arc::new(HistoryCorrelator::new()),
            state: Mutex::new(State {
                active: None,
                sql_buffer: String::new(),
                source: QuerySource::Manual,
                sessions: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sessions_for(&self, state: &mut State, database: &DatabaseId) -> Arc<DatabaseSessions> {
        let entry = state.sessions.entry(database.clone()).or_insert_with(|| {
            debug!(database = %database, "creating sessions");
            Arc::new(DatabaseSessions {
                execution: ExecutionSession::new(
                    database.clone(),
                    Arc::clone(&self.services.query),
                    self.bus.clone(),
                    Arc::clone(&self.correlator),
                ),
                generation: NaturalLanguageSession::new(
                    database.clone(),
                    Arc::clone(&self.services.generator),
                    self.bus.clone(),
                ),
            })
        });
        Arc::clone(entry)
    }

    fn active_sessions(&self) -> Result<(DatabaseId, Arc<DatabaseSessions>), SqlbenchError> {
        let mut state = self.lock();
        let database = state
            .active
            .clone()
            .ok_or_else(|| SqlbenchError::Validation("no database selected".to_string()))?;
        let sessions = self.sessions_for(&mut state, &database);
        Ok((database, sessions))
    }

    /// Makes `database` the active one. Binding a different database resets
    /// its sessions to `Idle`; binding the active one again does nothing.
    /// The SQL buffer is kept either way.
    pub fn bind_database(&self, database: impl Into<DatabaseId>) {
        let database = database.into();
        let mut state = self.lock();
        if state.active.as_ref() == Some(&database) {
            return;
        }
        let sessions = self.sessions_for(&mut state, &database);
        sessions.execution.reset();
        sessions.generation.reset();
        let previous = state.active.replace(database.clone());
        info!(
            database = %database,
            previous = previous.as_ref().map(DatabaseId::as_str).unwrap_or("-"),
            "database bound"
        );
    }

    pub fn active_database(&self) -> Option<DatabaseId> {
        self.lock().active.clone()
    }

    /// Replaces the SQL buffer. The buffer counts as hand-written afterwards.
    pub fn edit_sql(&self, text: impl Into<String>) {
        let mut state = self.lock();
        state.sql_buffer = text.into();
        state.source = QuerySource::Manual;
    }

    pub fn sql_buffer(&self) -> String {
        self.lock().sql_buffer.clone()
    }

    /// Where the current buffer came from.
    pub fn query_source(&self) -> QuerySource {
        self.lock().source
    }

    /// Executes the SQL buffer against the active database.
    ///
    /// Fails with [`SqlbenchError::Validation`] and no service call when no
    /// database is bound or the buffer is blank.
    pub async fn execute(&self) -> Result<Outcome<ResultModel>, SqlbenchError> {
        let (database, sessions, sql, source) = {
            let (database, sessions) = self.active_sessions()?;
            let state = self.lock();
            (database, sessions, state.sql_buffer.clone(), state.source)
        };
        debug!(database = %database, source = %source, "executing buffer");
        sessions.execution.submit(&sql, source).await
    }

    /// Generates SQL for `prompt` against the active database. The result is
    /// held in the generation session until adopted.
    pub async fn generate(&self, prompt: &str) -> Result<Outcome<GeneratedSql>, SqlbenchError> {
        let (_, sessions) = self.active_sessions()?;
        sessions.generation.submit(prompt).await
    }

    /// Copies the generated SQL into the buffer and resets the generation
    /// session to `Idle`. Returns the adopted SQL.
    pub fn adopt_generated_sql(&self) -> Result<String, SqlbenchError> {
        let (database, sessions) = self.active_sessions()?;
        let sql = match sessions.generation.state() {
            SessionState::Succeeded { payload, .. } => payload.sql.clone(),
            SessionState::Pending { .. } => {
                return Err(SqlbenchError::Validation(
                    "SQL generation is still pending".to_string(),
                ));
            }
            _ => {
                return Err(SqlbenchError::Validation(
                    "no generated SQL to adopt".to_string(),
                ));
            }
        };

        {
            let mut state = self.lock();
            state.sql_buffer = sql.clone();
            state.source = QuerySource::NaturalLanguage;
        }
        sessions.generation.reset();
        info!(database = %database, "generated SQL adopted");
        Ok(sql)
    }

    /// Empties the buffer and resets both active sessions.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.sql_buffer.clear();
        state.source = QuerySource::Manual;
        if let Some(database) = state.active.clone() {
            let sessions = self.sessions_for(&mut state, &database);
            sessions.execution.reset();
            sessions.generation.reset();
            debug!(database = %database, "sessions cleared");
        }
    }

    fn displayed_result(&self) -> Result<(DatabaseId, Arc<ResultModel>), SqlbenchError> {
        let (database, sessions) = self.active_sessions()?;
        let result = sessions
            .execution
            .displayed_result()
            .ok_or_else(|| SqlbenchError::Validation("no result to export".to_string()))?;
        Ok((database, result))
    }

    /// Converts the displayed result without delivering it anywhere.
    pub async fn convert(&self, format: ExportFormat) -> Result<ExportResult, SqlbenchError> {
        let (database, result) = self.displayed_result()?;
        self.exporter.convert(&database, &result, format).await
    }

    /// Exports the displayed result and hands it to `sink`.
    ///
    /// Export failures are returned to the caller and leave the execution
    /// session untouched.
    pub async fn export(
        &self,
        format: ExportFormat,
        sink: &dyn DownloadSink,
    ) -> Result<ExportedFile, SqlbenchError> {
        let (database, result) = self.displayed_result()?;
        self.exporter.export_to(&database, &result, format, sink).await
    }

    /// Execution state of the active database; `Idle` when none is bound.
    pub fn execution_state(&self) -> SessionState<ResultModel> {
        self.active_sessions()
            .map(|(_, sessions)| sessions.execution.state())
            .unwrap_or(SessionState::Idle)
    }

    /// Generation state of the active database; `Idle` when none is bound.
    pub fn generation_state(&self) -> SessionState<GeneratedSql> {
        self.active_sessions()
            .map(|(_, sessions)| sessions.generation.state())
            .unwrap_or(SessionState::Idle)
    }

    /// Sessions of any database seen so far, active or not.
    pub fn sessions(&self, database: &DatabaseId) -> Option<Arc<DatabaseSessions>> {
        self.lock().sessions.get(database).cloned()
    }

    pub fn settled_bus(&self) -> &SettledBus {
        &self.bus
    }

    /// Settlements of every database.
    pub fn subscribe_settled(&self) -> broadcast::Receiver<SettledEvent> {
        self.bus.subscribe()
    }

    /// Settlements of one database.
    pub fn settled_events(&self, database: &DatabaseId) -> SettledSubscription {
        self.bus.subscribe_to(database.clone())
    }

    pub fn history_token(&self, database: &DatabaseId) -> u64 {
        self.correlator.token(database)
    }

    pub fn subscribe_history(&self, database: &DatabaseId) -> watch::Receiver<u64> {
        self.correlator.subscribe(database)
    }

    /// A feed that re-fetches `database`'s history on every token change.
    pub fn history_feed(&self, database: &DatabaseId) -> HistoryFeed {
        HistoryFeed::new(
            database.clone(),
            &self.correlator,
            Arc::clone(&self.services.history),
            self.history_limit,
        )
    }

    /// Fetches the active database's history once.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, SqlbenchError> {
        let database = self
            .active_database()
            .ok_or_else(|| SqlbenchError::Validation("no database selected".to_string()))?;
        self.services
            .history
            .list_history(&database, self.history_limit)
            .await
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionCoordinator")
            .field("active", &state.active)
            .field("source", &state.source)
            .field("databases", &state.sessions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlbench_test_utils::{
        MockExportService, MockHistoryService, MockQueryService, MockSqlGenerator,
        query_response,
    };

    struct Fixture {
        query: Arc<MockQueryService>,
        generator: Arc<MockSqlGenerator>,
        coordinator: SessionCoordinator,
    }

    fn fixture() -> Fixture {
        let query = Arc::new(MockQueryService::new());
        let generator = Arc::new(MockSqlGenerator::new());
        let services = Services {
            query: query.clone(),
            generator: generator.clone(),
            export: Arc::new(MockExportService::new()),
            history: Arc::new(MockHistoryService::new()),
        };
        Fixture {
            query,
            generator,
            coordinator: SessionCoordinator::new(services, 50),
        }
    }

    #[tokio::test]
    async fn execute_without_database_is_rejected() {
        let f = fixture();
        f.coordinator.edit_sql("SELECT 1");
        let err = f.coordinator.execute().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(f.query.call_count(), 0);
    }

    #[tokio::test]
    async fn rebinding_same_database_keeps_state() {
        let f = fixture();
        f.query.push_response(query_response(&["n"], vec![json!({"n": "1"})]));
        f.coordinator.bind_database("a");
        f.coordinator.edit_sql("SELECT 1 AS n");
        f.coordinator.execute().await.unwrap();

        f.coordinator.bind_database("a");
        assert!(matches!(
            f.coordinator.execution_state(),
            SessionState::Succeeded { .. }
        ));
    }

    #[tokio::test]
    async fn switching_database_keeps_buffer_and_resets_target() {
        let f = fixture();
        f.coordinator.bind_database("a");
        f.coordinator.edit_sql("SELECT 1");
        f.coordinator.execute().await.unwrap();

        f.coordinator.bind_database("b");
        assert_eq!(f.coordinator.sql_buffer(), "SELECT 1");
        assert!(f.coordinator.execution_state().is_idle());

        // Coming back to `a` activates it afresh.
        f.coordinator.bind_database("a");
        assert!(f.coordinator.execution_state().is_idle());
    }

    #[tokio::test]
    async fn adopt_moves_generated_sql_into_buffer() {
        let f = fixture();
        f.generator.push_sql("SELECT name FROM users", "Lists users.");
        f.coordinator.bind_database("a");
        f.coordinator.edit_sql("old");

        f.coordinator.generate("list users").await.unwrap();
        // Generation alone never touches the buffer.
        assert_eq!(f.coordinator.sql_buffer(), "old");

        let adopted = f.coordinator.adopt_generated_sql().unwrap();
        assert_eq!(adopted, "SELECT name FROM users");
        assert_eq!(f.coordinator.sql_buffer(), "SELECT name FROM users");
        assert_eq!(f.coordinator.query_source(), QuerySource::NaturalLanguage);
        assert!(f.coordinator.generation_state().is_idle());

        f.coordinator.edit_sql("SELECT name FROM users LIMIT 5");
        assert_eq!(f.coordinator.query_source(), QuerySource::Manual);
    }

    #[tokio::test]
    async fn adopt_without_generation_is_rejected() {
        let f = fixture();
        f.coordinator.bind_database("a");
        assert!(f.coordinator.adopt_generated_sql().unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn clear_empties_buffer_and_sessions() {
        let f = fixture();
        f.coordinator.bind_database("a");
        f.coordinator.edit_sql("SELECT 1");
        f.coordinator.execute().await.unwrap();
        f.coordinator.generate("anything").await.unwrap();

        f.coordinator.clear();
        assert_eq!(f.coordinator.sql_buffer(), "");
        assert!(f.coordinator.execution_state().is_idle());
        assert!(f.coordinator.generation_state().is_idle());
    }

    #[tokio::test]
    async fn export_without_result_is_rejected() {
        let f = fixture();
        f.coordinator.bind_database("a");
        let err = f.coordinator.convert(ExportFormat::Csv).await.unwrap_err();
        assert!(err.is_validation());
    }
}
