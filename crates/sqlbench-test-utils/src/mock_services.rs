// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted query and generation services.
//!
//! Each call pops the next scripted reply on its first poll, before any
//! await, so the order in which calls start decides which reply each one
//! gets and the scripted delay decides the order in which they complete.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlbench_core::{
    DatabaseId, GeneratedSql, NaturalLanguageInput, QueryColumn, QueryInput, QueryResponse,
    QueryService, Row, SqlGenerator, SqlbenchError,
};

/// Builds a response whose columns are all typed `text`.
///
/// Each row value must be a JSON object; anything else becomes an empty row.
pub fn query_response(columns: &[&str], rows: Vec<Value>) -> QueryResponse {
    let rows: Vec<Row> = rows
        .into_iter()
        .map(|row| match row {
            Value::Object(map) => map,
            _ => Row::new(),
        })
        .collect();
    QueryResponse {
        columns: columns
            .iter()
            .map(|name| QueryColumn::new(*name, "text"))
            .collect(),
        row_count: Some(rows.len() as u64),
        rows,
        execution_time_ms: Some(1),
        sql: None,
    }
}

struct Reply<T> {
    delay: Duration,
    result: Result<T, String>,
}

struct Script<T> {
    replies: VecDeque<Reply<T>>,
    calls: usize,
}

impl<T> Script<T> {
    fn new() -> Self {
        Self {
            replies: VecDeque::new(),
            calls: 0,
        }
    }
}

async fn play<T>(reply: Reply<T>) -> Result<T, SqlbenchError> {
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    reply.result.map_err(SqlbenchError::service)
}

/// A query service that answers from a FIFO script.
///
/// When the script is empty, an empty result (no columns, no rows) is
/// returned immediately.
pub struct MockQueryService {
    script: Mutex<Script<QueryResponse>>,
    last_sql: Mutex<Option<String>>,
    last_database: Mutex<Option<DatabaseId>>,
}

impl MockQueryService {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::new()),
            last_sql: Mutex::new(None),
            last_database: Mutex::new(None),
        }
    }

    /// Queues a successful reply returned without delay.
    pub fn push_response(&self, response: QueryResponse) {
        self.push_delayed(Duration::ZERO, response);
    }

    /// Queues a successful reply returned after `delay`.
    pub fn push_delayed(&self, delay: Duration, response: QueryResponse) {
        self.push(delay, Ok(response));
    }

    /// Queues a failure carrying `message` as the service error text.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.push(Duration::ZERO, Err(message.into()));
    }

    pub fn push_delayed_failure(&self, delay: Duration, message: impl Into<String>) {
        self.push(delay, Err(message.into()));
    }

    fn push(&self, delay: Duration, result: Result<QueryResponse, String>) {
        if let Ok(mut script) = self.script.lock() {
            script.replies.push_back(Reply { delay, result });
        }
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().map(|s| s.calls).unwrap_or(0)
    }

    pub fn last_sql(&self) -> Option<String> {
        self.last_sql.lock().ok().and_then(|s| s.clone())
    }

    pub fn last_database(&self) -> Option<DatabaseId> {
        self.last_database.lock().ok().and_then(|d| d.clone())
    }

    fn next_reply(&self, database: &DatabaseId, sql: &str) -> Reply<QueryResponse> {
        if let Ok(mut last) = self.last_sql.lock() {
            *last = Some(sql.to_string());
        }
        if let Ok(mut last) = self.last_database.lock() {
            *last = Some(database.clone());
        }
        let mut script = match self.script.lock() {
            Ok(script) => script,
            Err(poisoned) => poisoned.into_inner(),
        };
        script.calls += 1;
        script.replies.pop_front().unwrap_or_else(|| Reply {
            delay: Duration::ZERO,
            result: Ok(query_response(&[], vec![])),
        })
    }
}

impl Default for MockQueryService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryService for MockQueryService {
    async fn execute(
        &self,
        database: &DatabaseId,
        input: &QueryInput,
    ) -> Result<QueryResponse, SqlbenchError> {
        let reply = self.next_reply(database, &input.sql);
        play(reply).await
    }
}

/// A generation service that answers from a FIFO script.
///
/// When the script is empty the prompt is echoed back inside a comment.
pub struct MockSqlGenerator {
    script: Mutex<Script<GeneratedSql>>,
    last_prompt: Mutex<Option<String>>,
}

impl MockSqlGenerator {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::new()),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn push_sql(&self, sql: impl Into<String>, explanation: impl Into<String>) {
        self.push_delayed(Duration::ZERO, sql, explanation);
    }

    pub fn push_delayed(
        &self,
        delay: Duration,
        sql: impl Into<String>,
        explanation: impl Into<String>,
    ) {
        self.push(
            delay,
            Ok(GeneratedSql {
                sql: sql.into(),
                explanation: explanation.into(),
            }),
        );
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.push(Duration::ZERO, Err(message.into()));
    }

    fn push(&self, delay: Duration, result: Result<GeneratedSql, String>) {
        if let Ok(mut script) = self.script.lock() {
            script.replies.push_back(Reply { delay, result });
        }
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().map(|s| s.calls).unwrap_or(0)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }

    fn next_reply(&self, prompt: &str) -> Reply<GeneratedSql> {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        let mut script = match self.script.lock() {
            Ok(script) => script,
            Err(poisoned) => poisoned.into_inner(),
        };
        script.calls += 1;
        script.replies.pop_front().unwrap_or_else(|| Reply {
            delay: Duration::ZERO,
            result: Ok(GeneratedSql {
                sql: format!("-- {prompt}\nSELECT 1"),
                explanation: "mock generation".to_string(),
            }),
        })
    }
}

impl Default for MockSqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SqlGenerator for MockSqlGenerator {
    async fn generate(
        &self,
        _database: &DatabaseId,
        input: &NaturalLanguageInput,
    ) -> Result<GeneratedSql, SqlbenchError> {
        let reply = self.next_reply(&input.prompt);
        play(reply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replies_in_script_order() {
        let svc = MockQueryService::new();
        svc.push_response(query_response(&["n"], vec![json!({"n": "1"})]));
        svc.push_failure("boom");

        let db = DatabaseId::from("a");
        let first = svc
            .execute(&db, &QueryInput::new("SELECT 1").unwrap())
            .await
            .unwrap();
        assert_eq!(first.rows.len(), 1);

        let second = svc
            .execute(&db, &QueryInput::new("SELECT 2").unwrap())
            .await
            .unwrap_err();
        assert_eq!(second.service_message(), "boom");
        assert_eq!(svc.call_count(), 2);
        assert_eq!(svc.last_sql().as_deref(), Some("SELECT 2"));
        assert_eq!(svc.last_database(), Some(db));
    }

    #[tokio::test(start_paused = true)]
    async fn reply_is_claimed_on_first_poll() {
        let svc = MockQueryService::new();
        svc.push_delayed(Duration::from_millis(100), query_response(&["slow"], vec![]));
        svc.push_response(query_response(&["fast"], vec![]));

        let db = DatabaseId::from("a");
        let input = QueryInput::new("SELECT 1").unwrap();
        let slow = svc.execute(&db, &input);
        let fast = svc.execute(&db, &input);
        let (slow, fast) = tokio::join!(slow, fast);
        assert_eq!(slow.unwrap().columns[0].name, "slow");
        assert_eq!(fast.unwrap().columns[0].name, "fast");
    }

    #[tokio::test]
    async fn generator_echoes_prompt_when_unscripted() {
        let generator = MockSqlGenerator::new();
        let out = generator
            .generate(
                &DatabaseId::from("a"),
                &NaturalLanguageInput::new("count users").unwrap(),
            )
            .await
            .unwrap();
        assert!(out.sql.contains("count users"));
        assert_eq!(generator.last_prompt().as_deref(), Some("count users"));
    }
}
