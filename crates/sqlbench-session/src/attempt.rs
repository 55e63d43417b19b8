// SPDX-FileCopyrightText: 2026 Sqlbench Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic attempt state machine with last-submission-wins semantics.
//!
//! States: Idle -> Pending -> Succeeded | Failed, and back to Pending on the
//! next attempt. Every `begin`, and every `reset` of a busy session, bumps a
//! monotonic counter; a response is applied only when it carries the
//! counter's current value.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sqlbench_core::RequestId;
use tracing::debug;

/// A terminal attempt result.
#[derive(Debug)]
pub enum Settled<T> {
    Succeeded { request_id: RequestId, payload: Arc<T> },
    Failed { request_id: RequestId, message: String },
}

impl<T> Clone for Settled<T> {
    fn clone(&self) -> Self {
        match self {
            Settled::Succeeded {
                request_id,
                payload,
            } => Settled::Succeeded {
                request_id: *request_id,
                payload: Arc::clone(payload),
            },
            Settled::Failed {
                request_id,
                message,
            } => Settled::Failed {
                request_id: *request_id,
                message: message.clone(),
            },
        }
    }
}

impl<T> Settled<T> {
    pub fn request_id(&self) -> RequestId {
        match self {
            Settled::Succeeded { request_id, .. } | Settled::Failed { request_id, .. } => {
                *request_id
            }
        }
    }

    pub fn payload(&self) -> Option<&Arc<T>> {
        match self {
            Settled::Succeeded { payload, .. } => Some(payload),
            Settled::Failed { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Settled::Failed { message, .. } => Some(message),
            Settled::Succeeded { .. } => None,
        }
    }
}

/// Observable state of one session.
#[derive(Debug)]
pub enum SessionState<T> {
    /// Nothing submitted since creation, clear, or rebinding.
    Idle,
    /// A request is in flight. `previous` is the last settled attempt, kept
    /// on display until this one settles.
    Pending {
        request_id: RequestId,
        previous: Option<Settled<T>>,
    },
    Succeeded {
        request_id: RequestId,
        payload: Arc<T>,
    },
    Failed {
        request_id: RequestId,
        message: String,
    },
}

impl<T> Clone for SessionState<T> {
    fn clone(&self) -> Self {
        match self {
            SessionState::Idle => SessionState::Idle,
            SessionState::Pending {
                request_id,
                previous,
            } => SessionState::Pending {
                request_id: *request_id,
                previous: previous.clone(),
            },
            SessionState::Succeeded {
                request_id,
                payload,
            } => SessionState::Succeeded {
                request_id: *request_id,
                payload: Arc::clone(payload),
            },
            SessionState::Failed {
                request_id,
                message,
            } => SessionState::Failed {
                request_id: *request_id,
                message: message.clone(),
            },
        }
    }
}

impl<T> SessionState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::Pending { .. })
    }

    /// The settled attempt the presentation layer should show: the current
    /// one, or while pending the one before it.
    pub fn displayed(&self) -> Option<Settled<T>> {
        match self {
            SessionState::Idle => None,
            SessionState::Pending { previous, .. } => previous.clone(),
            SessionState::Succeeded {
                request_id,
                payload,
            } => Some(Settled::Succeeded {
                request_id: *request_id,
                payload: Arc::clone(payload),
            }),
            SessionState::Failed {
                request_id,
                message,
            } => Some(Settled::Failed {
                request_id: *request_id,
                message: message.clone(),
            }),
        }
    }
}

impl<T> std::fmt::Display for SessionState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Pending { request_id, .. } => write!(f, "pending {request_id}"),
            SessionState::Succeeded { request_id, .. } => write!(f, "succeeded {request_id}"),
            SessionState::Failed { request_id, .. } => write!(f, "failed {request_id}"),
        }
    }
}

/// What a settlement did to the session.
#[derive(Debug)]
pub enum Outcome<T> {
    Succeeded(Arc<T>),
    Failed(String),
    /// A newer request (or a reset) took over; the response was dropped.
    Superseded,
}

impl<T> Outcome<T> {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Outcome::Superseded)
    }

    pub fn payload(&self) -> Option<&Arc<T>> {
        match self {
            Outcome::Succeeded(payload) => Some(payload),
            _ => None,
        }
    }
}

struct Inner<T> {
    counter: u64,
    state: SessionState<T>,
}

/// Request counter plus state, guarded by one mutex that is never held
/// across an await.
pub struct AttemptSession<T> {
    label: &'static str,
    inner: Mutex<Inner<T>>,
}

impl<T> AttemptSession<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            inner: Mutex::new(Inner {
                counter: 0,
                state: SessionState::Idle,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts an attempt and returns its id. Whatever was on display stays
    /// available through [`SessionState::displayed`].
    pub fn begin(&self) -> RequestId {
        let mut inner = self.lock();
        inner.counter += 1;
        let request_id = RequestId(inner.counter);
        let previous = match std::mem::replace(&mut inner.state, SessionState::Idle) {
            SessionState::Idle => None,
            SessionState::Pending { previous, .. } => previous,
            SessionState::Succeeded {
                request_id,
                payload,
            } => Some(Settled::Succeeded {
                request_id,
                payload,
            }),
            SessionState::Failed {
                request_id,
                message,
            } => Some(Settled::Failed {
                request_id,
                message,
            }),
        };
        inner.state = SessionState::Pending {
            request_id,
            previous,
        };
        request_id
    }

    /// Applies a response if `request_id` is still the latest attempt.
    pub fn settle(&self, request_id: RequestId, result: Result<T, String>) -> Outcome<T> {
        let mut inner = self.lock();
        if request_id.0 != inner.counter {
            debug!(
                session = self.label,
                request = %request_id,
                current = inner.counter,
                "dropping superseded response"
            );
            return Outcome::Superseded;
        }
        match result {
            Ok(payload) => {
                let payload = Arc::new(payload);
                inner.state = SessionState::Succeeded {
                    request_id,
                    payload: Arc::clone(&payload),
                };
                Outcome::Succeeded(payload)
            }
            Err(message) => {
                inner.state = SessionState::Failed {
                    request_id,
                    message: message.clone(),
                };
                Outcome::Failed(message)
            }
        }
    }

    /// Returns to `Idle`; any in-flight response becomes stale.
    ///
    /// An idle session has nothing in flight, so its counter is left alone.
    pub fn reset(&self) {
        let mut inner = self.lock();
        if inner.state.is_idle() {
            return;
        }
        inner.counter += 1;
        inner.state = SessionState::Idle;
    }

    pub fn state(&self) -> SessionState<T> {
        self.lock().state.clone()
    }

    pub fn displayed(&self) -> Option<Settled<T>> {
        self.lock().state.displayed()
    }

    /// Id that the next response must carry to be applied.
    pub fn current_request(&self) -> RequestId {
        RequestId(self.lock().counter)
    }
}

impl<T> std::fmt::Debug for AttemptSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("AttemptSession")
            .field("label", &self.label)
            .field("counter", &inner.counter)
            .field("state", &format_args!("{}", inner.state))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let session: AttemptSession<u32> = AttemptSession::new("test");
        assert!(session.state().is_idle());
        assert!(session.displayed().is_none());
        assert_eq!(session.current_request(), RequestId(0));
    }

    #[test]
    fn ids_increase_monotonically() {
        let session: AttemptSession<u32> = AttemptSession::new("test");
        assert_eq!(session.begin(), RequestId(1));
        assert_eq!(session.begin(), RequestId(2));
        session.reset();
        assert_eq!(session.begin(), RequestId(4));
    }

    #[test]
    fn resetting_an_idle_session_keeps_its_counter() {
        let session: AttemptSession<u32> = AttemptSession::new("test");
        session.reset();
        assert_eq!(session.begin(), RequestId(1));
    }

    #[test]
    fn latest_response_is_applied() {
        let session = AttemptSession::new("test");
        let id = session.begin();
        let outcome = session.settle(id, Ok(7u32));
        assert_eq!(outcome.payload().map(|p| **p), Some(7));
        match session.state() {
            SessionState::Succeeded {
                request_id,
                payload,
            } => {
                assert_eq!(request_id, id);
                assert_eq!(*payload, 7);
            }
            other => panic!("unexpected state {other}"),
        }
    }

    #[test]
    fn stale_response_is_dropped_in_either_order() {
        let session = AttemptSession::new("test");
        let first = session.begin();
        let second = session.begin();

        assert!(session.settle(first, Ok(1u32)).is_superseded());
        assert!(session.state().is_pending());

        session.settle(second, Ok(2));
        assert!(session.settle(first, Ok(1)).is_superseded());
        let shown = session.displayed().unwrap();
        assert_eq!(shown.request_id(), second);
        assert_eq!(shown.payload().map(|p| **p), Some(2));
    }

    #[test]
    fn pending_keeps_previous_result_on_display() {
        let session = AttemptSession::new("test");
        let first = session.begin();
        session.settle(first, Ok(1u32));

        let second = session.begin();
        match session.state() {
            SessionState::Pending {
                request_id,
                previous: Some(previous),
            } => {
                assert_eq!(request_id, second);
                assert_eq!(previous.request_id(), first);
            }
            other => panic!("unexpected state {other}"),
        }

        // A third attempt still shows the first result, not nothing.
        session.begin();
        assert_eq!(session.displayed().unwrap().request_id(), first);
    }

    #[test]
    fn failure_message_is_kept_verbatim() {
        let session: AttemptSession<u32> = AttemptSession::new("test");
        let id = session.begin();
        let outcome = session.settle(id, Err("relation \"t\" does not exist".into()));
        assert!(matches!(outcome, Outcome::Failed(ref m) if m == "relation \"t\" does not exist"));
        assert_eq!(
            session.displayed().unwrap().message(),
            Some("relation \"t\" does not exist")
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn superseded_drop_is_logged_at_debug() {
        let session = AttemptSession::new("execution");
        let first = session.begin();
        session.begin();
        session.settle(first, Ok(1u32));
        assert!(logs_contain("dropping superseded response"));
        assert!(!logs_contain("WARN"));
    }

    #[test]
    fn reset_makes_in_flight_response_stale() {
        let session = AttemptSession::new("test");
        let id = session.begin();
        session.reset();
        assert!(session.settle(id, Ok(1u32)).is_superseded());
        assert!(session.state().is_idle());
    }
}
