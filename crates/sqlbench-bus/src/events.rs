// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `settled` event stream exposed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlbench_core::{DatabaseId, QuerySource, RequestId};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default buffer of the settled broadcast channel.
pub const DEFAULT_CAPACITY: usize = 256;

/// Which kind of session settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Execution,
    Generation,
}

/// Terminal result of an applied attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SettledOutcome {
    Success {
        row_count: Option<usize>,
        execution_time_ms: Option<u64>,
    },
    Failure {
        message: String,
    },
}

impl SettledOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SettledOutcome::Success { .. })
    }
}

/// Published once per applied settlement. Stale responses never produce one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledEvent {
    pub database_id: DatabaseId,
    pub kind: SessionKind,
    pub request_id: RequestId,
    pub source: QuerySource,
    pub outcome: SettledOutcome,
    pub settled_at: DateTime<Utc>,
}

/// Broadcast channel for [`SettledEvent`]s.
///
/// Publishing never blocks and succeeds with zero subscribers.
#[derive(Debug, Clone)]
pub struct SettledBus {
    tx: broadcast::Sender<SettledEvent>,
}

impl Default for SettledBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SettledBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: SettledEvent) {
        debug!(
            database = %event.database_id,
            kind = ?event.kind,
            request = %event.request_id,
            success = event.outcome.is_success(),
            "settled"
        );
        // An error here only means nobody is listening.
        let _ = self.tx.send(event);
    }

    /// All settlements, across every database.
    pub fn subscribe(&self) -> broadcast::Receiver<SettledEvent> {
        self.tx.subscribe()
    }

    /// Settlements for one database only.
    pub fn subscribe_to(&self, database: DatabaseId) -> SettledSubscription {
        SettledSubscription {
            database,
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Receiver filtered to a single database id.
#[derive(Debug)]
pub struct SettledSubscription {
    database: DatabaseId,
    rx: broadcast::Receiver<SettledEvent>,
}

impl SettledSubscription {
    pub fn database(&self) -> &DatabaseId {
        &self.database
    }

    /// Next settlement for this database, or `None` once the bus is gone.
    ///
    /// A lagging receiver skips what it missed and keeps going.
    pub async fn recv(&mut self) -> Option<SettledEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.database_id == self.database => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(database = %self.database, skipped, "settled subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(db: &str, id: u64, outcome: SettledOutcome) -> SettledEvent {
        SettledEvent {
            database_id: DatabaseId::from(db),
            kind: SessionKind::Execution,
            request_id: RequestId(id),
            source: QuerySource::Manual,
            outcome,
            settled_at: Utc::now(),
        }
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = SettledBus::default();
        bus.publish(event(
            "a",
            1,
            SettledOutcome::Failure {
                message: "x".into(),
            },
        ));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn filtered_subscription_skips_other_databases() {
        let bus = SettledBus::default();
        let mut only_b = bus.subscribe_to(DatabaseId::from("b"));

        bus.publish(event(
            "a",
            1,
            SettledOutcome::Success {
                row_count: Some(1),
                execution_time_ms: Some(2),
            },
        ));
        bus.publish(event(
            "b",
            7,
            SettledOutcome::Failure {
                message: "nope".into(),
            },
        ));

        let got = only_b.recv().await.unwrap();
        assert_eq!(got.database_id.as_str(), "b");
        assert_eq!(got.request_id, RequestId(7));
    }

    #[tokio::test]
    async fn subscription_ends_when_bus_dropped() {
        let bus = SettledBus::default();
        let mut sub = bus.subscribe_to(DatabaseId::from("a"));
        drop(bus);
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn event_serializes_with_tagged_outcome() {
        let value = serde_json::to_value(event(
            "a",
            3,
            SettledOutcome::Success {
                row_count: Some(2),
                execution_time_ms: Some(9),
            },
        ))
        .unwrap();
        assert_eq!(value["databaseId"], "a");
        assert_eq!(value["kind"], "execution");
        assert_eq!(value["outcome"]["status"], "success");
        assert_eq!(value["outcome"]["row_count"], 2);
    }
}
