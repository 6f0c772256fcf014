//! Shared test harness: an in-process scripted connection.
//!
//! `FakeConnection` implements the `Connection` contract the session layer
//! depends on: operations are queued by `run`/`pull_all`, and `sync` hands
//! the queued batch to a single dispatcher task that delivers observer
//! callbacks asynchronously, in submission order, one terminal per
//! statement.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, oneshot};

use arbor_link::{Connection, Record, ServerFailure, ServerSummary, Statement, StreamObserver};

/// Scripted outcome for one statement, consumed in submission order.
pub enum Response {
    Success {
        keys: Vec<String>,
        rows: Vec<Vec<JsonValue>>,
        summary: ServerSummary,
    },
    Failure(ServerFailure),
}

impl Response {
    /// A record-less success, as BEGIN/COMMIT/ROLLBACK produce.
    pub fn empty() -> Self {
        Response::Success {
            keys: Vec::new(),
            rows: Vec::new(),
            summary: ServerSummary::default(),
        }
    }

    /// A success with records and a default summary.
    pub fn records(keys: &[&str], rows: Vec<Vec<JsonValue>>) -> Self {
        Response::Success {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            rows,
            summary: ServerSummary::default(),
        }
    }

    /// A success with records and an explicit summary payload.
    pub fn records_with_summary(
        keys: &[&str],
        rows: Vec<Vec<JsonValue>>,
        summary: ServerSummary,
    ) -> Self {
        Response::Success {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            rows,
            summary,
        }
    }

    /// A scripted failure.
    pub fn failure(code: &str, message: &str) -> Self {
        Response::Failure(ServerFailure::new(code, message))
    }
}

struct Queued {
    observer: StreamObserver,
    response: Response,
}

struct FakeInner {
    script: VecDeque<Response>,
    pending: Vec<Queued>,
}

/// In-process `Connection` with a scripted response per submitted statement.
pub struct FakeConnection {
    inner: Mutex<FakeInner>,
    deliver_tx: mpsc::UnboundedSender<Vec<Queued>>,
    /// Every operation observed, in call order, for assertions.
    ops: Arc<Mutex<Vec<String>>>,
}

impl FakeConnection {
    /// Must be called from within a tokio runtime (the dispatcher task is
    /// spawned here).
    pub fn new(script: Vec<Response>) -> Arc<Self> {
        let (deliver_tx, mut deliver_rx) = mpsc::unbounded_channel::<Vec<Queued>>();

        // Single dispatcher task: serialized delivery across all syncs, in
        // submission order, exactly as the connection contract promises.
        tokio::spawn(async move {
            while let Some(batch) = deliver_rx.recv().await {
                for queued in batch {
                    // Yield so delivery is genuinely asynchronous with
                    // respect to the submitting call.
                    tokio::task::yield_now().await;
                    match queued.response {
                        Response::Success {
                            keys,
                            rows,
                            summary,
                        } => {
                            let keys = Arc::new(keys);
                            for row in rows {
                                queued.observer.on_next(Record::new(Arc::clone(&keys), row));
                            }
                            queued.observer.on_completed(summary);
                        }
                        Response::Failure(failure) => queued.observer.on_error(failure),
                    }
                }
            }
        });

        Arc::new(Self {
            inner: Mutex::new(FakeInner {
                script: script.into(),
                pending: Vec::new(),
            }),
            deliver_tx,
            ops: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Operations observed so far.
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    /// Shared handle to the op log, so tests can interleave their own
    /// markers (e.g. a session release hook) with connection operations.
    pub fn op_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.ops)
    }

    /// Statement texts submitted via `run`, in order.
    pub fn statements(&self) -> Vec<String> {
        self.ops()
            .iter()
            .filter_map(|op| op.strip_prefix("run ").map(str::to_string))
            .collect()
    }
}

impl Connection for FakeConnection {
    fn run(&self, statement: &Statement, observer: StreamObserver) {
        self.ops
            .lock()
            .unwrap()
            .push(format!("run {}", statement.text));
        let mut inner = self.inner.lock().unwrap();
        let response = inner
            .script
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for \"{}\"", statement.text));
        inner.pending.push(Queued { observer, response });
    }

    fn pull_all(&self, _observer: StreamObserver) {
        self.ops.lock().unwrap().push("pull_all".to_string());
    }

    fn sync(&self) {
        self.ops.lock().unwrap().push("sync".to_string());
        let batch = std::mem::take(&mut self.inner.lock().unwrap().pending);
        self.deliver_tx
            .send(batch)
            .expect("dispatcher task stopped");
    }

    fn close(&self, on_closed: oneshot::Sender<()>) {
        self.ops.lock().unwrap().push("close".to_string());
        let _ = on_closed.send(());
    }
}
