// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end session behavior against mock services.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use sqlbench_core::{DatabaseId, ExportFormat, QueryColumn, QueryResponse, QuerySource};
use sqlbench_session::{Outcome, Services, SessionCoordinator, SessionState};
use sqlbench_test_utils::{
    CapturingSink, MockExportService, MockHistoryService, MockQueryService, MockSqlGenerator,
    query_response,
};

struct Workbench {
    query: Arc<MockQueryService>,
    export: Arc<MockExportService>,
    history: Arc<MockHistoryService>,
    coordinator: SessionCoordinator,
}

fn workbench() -> Workbench {
    let query = Arc::new(MockQueryService::new());
    let export = Arc::new(MockExportService::new());
    let history = Arc::new(MockHistoryService::new());
    let coordinator = SessionCoordinator::new(
        Services {
            query: query.clone(),
            generator: Arc::new(MockSqlGenerator::new()),
            export: export.clone(),
            history: history.clone(),
        },
        20,
    );
    Workbench {
        query,
        export,
        history,
        coordinator,
    }
}

fn single(label: &str) -> QueryResponse {
    query_response(&["label"], vec![json!({ "label": label })])
}

fn label_of(state: &SessionState<sqlbench_core::ResultModel>) -> Option<String> {
    match state {
        SessionState::Succeeded { payload, .. } => payload.rows()[0]
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[tokio::test(start_paused = true)]
async fn later_submission_wins_even_when_earlier_finishes_last() {
    let wb = workbench();
    wb.query.push_delayed(Duration::from_millis(100), single("A"));
    wb.query.push_delayed(Duration::from_millis(10), single("B"));
    wb.coordinator.bind_database("sales");
    wb.coordinator.edit_sql("SELECT 'A' AS label");

    let (first, second) = tokio::join!(wb.coordinator.execute(), async {
        wb.coordinator.edit_sql("SELECT 'B' AS label");
        wb.coordinator.execute().await
    });

    assert!(first.unwrap().is_superseded());
    assert!(matches!(second.unwrap(), Outcome::Succeeded(_)));
    let state = wb.coordinator.execution_state();
    assert_eq!(label_of(&state).as_deref(), Some("B"));
    match state {
        SessionState::Succeeded { request_id, .. } => assert_eq!(request_id.0, 2),
        other => panic!("unexpected state {other}"),
    }
    // Only the applied settlement raised the history token.
    assert_eq!(wb.coordinator.history_token(&DatabaseId::from("sales")), 1);
}

#[tokio::test(start_paused = true)]
async fn previous_result_stays_visible_while_pending() {
    let wb = workbench();
    wb.query.push_response(single("first"));
    wb.query.push_delayed(Duration::from_millis(50), single("second"));
    wb.coordinator.bind_database("sales");
    wb.coordinator.edit_sql("SELECT 1");
    wb.coordinator.execute().await.unwrap();

    let (outcome, ()) = tokio::join!(wb.coordinator.execute(), async {
        match wb.coordinator.execution_state() {
            SessionState::Pending {
                previous: Some(previous),
                ..
            } => {
                let shown = previous.payload().unwrap();
                assert_eq!(shown.rows()[0]["label"], "first");
            }
            other => panic!("expected pending with previous result, got {other}"),
        }
    });
    assert!(matches!(outcome.unwrap(), Outcome::Succeeded(_)));
    assert_eq!(
        label_of(&wb.coordinator.execution_state()).as_deref(),
        Some("second")
    );
}

#[tokio::test]
async fn re_export_yields_identical_bytes() {
    let wb = workbench();
    wb.query.push_response(query_response(
        &["id", "name"],
        vec![json!({"id": 1, "name": "ada"}), json!({"id": 2, "name": "grace"})],
    ));
    wb.coordinator.bind_database("sales");
    wb.coordinator.edit_sql("SELECT id, name FROM users");
    wb.coordinator.execute().await.unwrap();

    let sink = CapturingSink::new();
    wb.coordinator.export(ExportFormat::Csv, &sink).await.unwrap();
    wb.coordinator.export(ExportFormat::Csv, &sink).await.unwrap();
    wb.coordinator.export(ExportFormat::Json, &sink).await.unwrap();

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 3);
    assert_eq!(delivered[0].bytes, delivered[1].bytes);
    assert!(delivered[2].filename.ends_with(".json"));
    // Exporting never re-runs the query.
    assert_eq!(wb.query.call_count(), 1);
    assert_eq!(wb.export.call_count(), 3);
}

#[tokio::test]
async fn failed_export_leaves_execution_state_alone() {
    let query = Arc::new(MockQueryService::new());
    query.push_response(single("x"));
    let coordinator = SessionCoordinator::new(
        Services {
            query,
            generator: Arc::new(MockSqlGenerator::new()),
            export: Arc::new(MockExportService::failing("export backend down")),
            history: Arc::new(MockHistoryService::new()),
        },
        20,
    );
    coordinator.bind_database("sales");
    coordinator.edit_sql("SELECT 1");
    coordinator.execute().await.unwrap();

    let sink = CapturingSink::new();
    let err = coordinator
        .export(ExportFormat::Csv, &sink)
        .await
        .unwrap_err();
    assert_eq!(err.service_message(), "export backend down");
    assert!(sink.delivered().is_empty());
    assert_eq!(
        label_of(&coordinator.execution_state()).as_deref(),
        Some("x")
    );
}

#[tokio::test]
async fn blank_buffer_makes_no_service_call() {
    let wb = workbench();
    wb.coordinator.bind_database("sales");
    wb.coordinator.edit_sql("   ");

    let err = wb.coordinator.execute().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(wb.query.call_count(), 0);
    assert!(wb.coordinator.execution_state().is_idle());
    assert_eq!(wb.coordinator.history_token(&DatabaseId::from("sales")), 0);
}

#[tokio::test(start_paused = true)]
async fn switching_database_isolates_the_pending_response() {
    let wb = workbench();
    wb.query.push_delayed(Duration::from_millis(50), single("from-a"));
    wb.coordinator.bind_database("a");
    wb.coordinator.edit_sql("SELECT 'from-a' AS label");

    let (outcome, ()) = tokio::join!(wb.coordinator.execute(), async {
        wb.coordinator.bind_database("b");
        assert!(wb.coordinator.execution_state().is_idle());
    });

    // A's response landed in A's own session.
    assert!(matches!(outcome.unwrap(), Outcome::Succeeded(_)));
    let a = wb.coordinator.sessions(&DatabaseId::from("a")).unwrap();
    assert_eq!(label_of(&a.execution.state()).as_deref(), Some("from-a"));

    // The active view (B) never saw it.
    assert_eq!(wb.coordinator.active_database(), Some(DatabaseId::from("b")));
    assert!(wb.coordinator.execution_state().is_idle());
    assert_eq!(wb.coordinator.history_token(&DatabaseId::from("a")), 1);
    assert_eq!(wb.coordinator.history_token(&DatabaseId::from("b")), 0);
}

#[tokio::test]
async fn history_token_moves_once_per_outcome() {
    let wb = workbench();
    let db = DatabaseId::from("sales");
    let mut token = wb.coordinator.subscribe_history(&db);
    wb.query.push_response(single("ok"));
    wb.query.push_failure("division by zero");
    wb.coordinator.bind_database("sales");
    wb.coordinator.edit_sql("SELECT 1");

    wb.coordinator.execute().await.unwrap();
    assert_eq!(wb.coordinator.history_token(&db), 1);
    token.changed().await.unwrap();
    assert_eq!(*token.borrow_and_update(), 1);

    let outcome = wb.coordinator.execute().await.unwrap();
    assert!(matches!(outcome, Outcome::Failed(ref m) if m == "division by zero"));
    assert_eq!(wb.coordinator.history_token(&db), 2);
    token.changed().await.unwrap();
    assert_eq!(*token.borrow_and_update(), 2);
}

#[tokio::test]
async fn history_feed_refetches_after_execution() {
    let wb = workbench();
    let db = DatabaseId::from("sales");
    let mut feed = wb.coordinator.history_feed(&db);
    wb.coordinator.bind_database("sales");
    wb.coordinator.edit_sql("SELECT 1");

    wb.history.push_entry(&db, "SELECT 1", true);
    wb.coordinator.execute().await.unwrap();

    let entries = feed.next_refresh().await.unwrap().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(wb.history.last_limit(), Some(20));
}

#[tokio::test]
async fn missing_values_are_explicit_nulls() {
    let wb = workbench();
    wb.query.push_response(QueryResponse {
        columns: vec![QueryColumn::new("id", "int")],
        rows: vec![
            json!({"id": 1}).as_object().cloned().unwrap(),
            json!({"id": null}).as_object().cloned().unwrap(),
        ],
        row_count: Some(2),
        execution_time_ms: Some(4),
        sql: Some("SELECT id FROM t".into()),
    });
    wb.coordinator.bind_database("sales");
    wb.coordinator.edit_sql("SELECT id FROM t");

    let outcome = wb.coordinator.execute().await.unwrap();
    let result = outcome.payload().unwrap();
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.rows()[1].get("id"), Some(&Value::Null));
    assert_eq!(result.columns()[0], QueryColumn::new("id", "int"));
}

#[tokio::test]
async fn settled_events_carry_query_source() {
    let wb = workbench();
    let mut events = wb.coordinator.settled_events(&DatabaseId::from("sales"));
    wb.coordinator.bind_database("sales");
    wb.coordinator.generate("count rows").await.unwrap();
    wb.coordinator.adopt_generated_sql().unwrap();
    wb.coordinator.execute().await.unwrap();

    let generation = events.recv().await.unwrap();
    let execution = events.recv().await.unwrap();
    assert_eq!(generation.source, QuerySource::NaturalLanguage);
    assert_eq!(execution.source, QuerySource::NaturalLanguage);
    assert_eq!(execution.request_id.0, 1);
}
