//! Push-to-pull bridging between a connection and result consumers.
//!
//! A [`StreamObserver`] is the handle a [`Connection`](crate::Connection)
//! delivers record and terminal notifications into. Internally it is a
//! buffered event store: every record is kept in arrival order together with
//! a tagged terminal state, so any number of consumers can replay the stream
//! from the start, whether they attach before, during, or after delivery.
//!
//! Delivery for one connection is serialized (part of the
//! [`Connection`](crate::Connection) contract), so the store only needs a mutex for the brief hand-off between
//! the connection's delivery context and awaiting consumers.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::models::{Record, ResultSummary, ServerFailure, ServerSummary, Statement};

/// Subscriber role notified of records and the terminal outcome for one
/// statement execution.
///
/// Every method has a no-op default, so a subscriber implements only the
/// notifications it cares about.
pub trait ResultObserver: Send {
    /// One record arrived.
    fn on_next(&mut self, _record: &Record) {}

    /// The statement completed; no further notifications follow.
    fn on_completed(&mut self, _summary: &ResultSummary) {}

    /// The statement failed; no further notifications follow.
    fn on_error(&mut self, _failure: &ServerFailure) {}
}

/// Terminal state of a result stream.
#[derive(Debug, Clone)]
pub(crate) enum Terminal {
    Completed(ResultSummary),
    Failed(ServerFailure),
}

/// A registered subscriber plus its delivery cursor into the record buffer.
struct Subscriber {
    observer: Box<dyn ResultObserver>,
    /// Number of buffered records already delivered to this observer.
    delivered: usize,
}

impl Subscriber {
    fn has_pending(&self, state: &StreamState) -> bool {
        self.delivered < state.records.len() || state.terminal.is_some()
    }
}

struct StreamState {
    records: Vec<Record>,
    terminal: Option<Terminal>,
    /// Live subscribers still awaiting the terminal. Dropped once it is
    /// delivered, which is what makes the terminal at-most-once per
    /// subscriber.
    subscribers: Vec<Subscriber>,
}

pub(crate) struct StreamInner {
    statement: Statement,
    state: Mutex<StreamState>,
    /// Wakes consumers parked in `QueryResult::next` / `collect`.
    notify: Notify,
}

impl StreamInner {
    /// Run `f` against the buffered state.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&[Record], Option<&Terminal>) -> R) -> R {
        let state = self.state.lock().expect("stream state poisoned");
        f(&state.records, state.terminal.as_ref())
    }

    pub(crate) fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Park until the connection delivers another notification.
    ///
    /// Callers must pin and `enable` this future *before* inspecting the
    /// state, then await it only when nothing new was found; otherwise a
    /// notification landing between the check and the await would be missed.
    pub(crate) fn notified(&self) -> tokio::sync::futures::Notified<'_> {
        self.notify.notified()
    }

    /// Attach a subscriber: replay everything buffered so far in arrival
    /// order, then either deliver the buffered terminal or keep the
    /// subscriber for live delivery.
    pub(crate) fn subscribe(&self, observer: Box<dyn ResultObserver>) {
        self.state
            .lock()
            .expect("stream state poisoned")
            .subscribers
            .push(Subscriber {
                observer,
                delivered: 0,
            });
        self.pump();
    }

    /// Deliver pending records and terminals to registered subscribers.
    ///
    /// Observer callbacks must not run under the state lock: a re-entrant
    /// callback touching the same stream would deadlock, and a panicking
    /// one would poison the lock. So each subscriber with pending
    /// notifications is taken out of the state, delivered to with the lock
    /// released, and re-registered afterwards (or dropped once it received
    /// its terminal). The delivery cursor makes a taken-out subscriber
    /// invisible to concurrent pumps, preserving per-subscriber ordering
    /// and the at-most-once terminal.
    fn pump(&self) {
        loop {
            let (mut subscriber, batch, terminal) = {
                let mut state = self.state.lock().expect("stream state poisoned");
                let Some(pos) = state
                    .subscribers
                    .iter()
                    .position(|s| s.has_pending(&state))
                else {
                    return;
                };
                let mut subscriber = state.subscribers.swap_remove(pos);
                let batch = state.records[subscriber.delivered..].to_vec();
                subscriber.delivered = state.records.len();
                (subscriber, batch, state.terminal.clone())
            };

            for record in &batch {
                subscriber.observer.on_next(record);
            }
            match terminal {
                Some(Terminal::Completed(summary)) => subscriber.observer.on_completed(&summary),
                Some(Terminal::Failed(failure)) => subscriber.observer.on_error(&failure),
                None => {
                    // More records may have arrived during delivery; the
                    // next loop iteration picks them up.
                    self.state
                        .lock()
                        .expect("stream state poisoned")
                        .subscribers
                        .push(subscriber);
                }
            }
        }
    }
}

/// Push-side handle handed to a [`Connection`](crate::Connection) for one
/// statement execution.
///
/// The connection calls [`on_next`](StreamObserver::on_next) zero or more
/// times followed by exactly one of [`on_completed`](StreamObserver::on_completed)
/// or [`on_error`](StreamObserver::on_error). Notifications arriving after
/// the terminal violate that contract and are discarded with a warning.
#[derive(Clone)]
pub struct StreamObserver {
    inner: Arc<StreamInner>,
}

impl StreamObserver {
    pub(crate) fn new(statement: Statement) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                statement,
                state: Mutex::new(StreamState {
                    records: Vec::new(),
                    terminal: None,
                    subscribers: Vec::new(),
                }),
                notify: Notify::new(),
            }),
        }
    }

    pub(crate) fn inner(&self) -> Arc<StreamInner> {
        Arc::clone(&self.inner)
    }

    pub(crate) fn subscribe(&self, observer: Box<dyn ResultObserver>) {
        self.inner.subscribe(observer);
    }

    /// Deliver one record.
    pub fn on_next(&self, record: Record) {
        {
            let mut state = self.inner.state.lock().expect("stream state poisoned");
            if state.terminal.is_some() {
                log::warn!(
                    "[arbor-link] record received after terminal notification, discarding \
                     (statement: \"{}\")",
                    self.inner.statement.text
                );
                return;
            }
            state.records.push(record);
        }
        self.inner.pump();
        self.inner.notify.notify_waiters();
    }

    /// Deliver the completion terminal with the server's summary payload.
    pub fn on_completed(&self, payload: ServerSummary) {
        let summary = ResultSummary::new(self.inner.statement.clone(), payload);
        {
            let mut state = self.inner.state.lock().expect("stream state poisoned");
            if state.terminal.is_some() {
                log::warn!(
                    "[arbor-link] duplicate terminal notification, discarding \
                     (statement: \"{}\")",
                    self.inner.statement.text
                );
                return;
            }
            state.terminal = Some(Terminal::Completed(summary));
        }
        self.inner.pump();
        self.inner.notify.notify_waiters();
    }

    /// Deliver the failure terminal.
    pub fn on_error(&self, failure: ServerFailure) {
        {
            let mut state = self.inner.state.lock().expect("stream state poisoned");
            if state.terminal.is_some() {
                log::warn!(
                    "[arbor-link] duplicate terminal notification, discarding \
                     (statement: \"{}\")",
                    self.inner.statement.text
                );
                return;
            }
            state.terminal = Some(Terminal::Failed(failure));
        }
        self.inner.pump();
        self.inner.notify.notify_waiters();
    }
}
