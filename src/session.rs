//! Session: the logical execution context for sequential statements over
//! one connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::connection::Connection;
use crate::error::{ArborLinkError, Result};
use crate::models::{ResultSummary, ServerFailure, Statement};
use crate::observer::{ResultObserver, StreamObserver};
use crate::result::QueryResult;
use crate::transaction::Transaction;

/// Typed handle to a session's open-transaction state.
///
/// A [`Transaction`] holds a clone of its session's slot and clears it when
/// the transaction ends, making the lifecycle coupling between the two
/// explicit rather than hidden in a captured closure.
#[derive(Clone, Debug, Default)]
pub(crate) struct TxSlot(Arc<AtomicBool>);

impl TxSlot {
    /// Mark the slot open; fails when a transaction is already open.
    fn try_open(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark the transaction ended. Idempotent.
    pub(crate) fn end(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub(crate) fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Log-friendly preview of statement text, truncated to at most 80 bytes on
/// a char boundary.
pub(crate) fn statement_preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.len() > 80 {
        let mut cut = 80;
        while !flat.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &flat[..cut])
    } else {
        flat
    }
}

/// Issue the fixed run / pull-all / sync sequence for one statement and
/// return the result handle wrapping its observer.
pub(crate) fn run_statement(conn: &Arc<dyn Connection>, statement: Statement) -> QueryResult {
    log::debug!(
        "[arbor-link] run: \"{}\" ({} params)",
        statement_preview(&statement.text),
        statement.parameters.len()
    );
    let observer = StreamObserver::new(statement);
    let result = QueryResult::new(&observer);
    conn.run(result.statement(), observer.clone());
    conn.pull_all(observer.clone());
    conn.sync();
    result
}

/// A session over one connection.
///
/// Statements submitted through a session execute sequentially on the
/// connection; at most one [`Transaction`] is open per session at a time.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn example(conn: std::sync::Arc<dyn arbor_link::Connection>) -> arbor_link::Result<()> {
/// let mut session = arbor_link::Session::new(conn);
///
/// let result = session.run("RETURN 1 AS a")?;
/// let records = result.collect().await?;
/// assert_eq!(records.len(), 1);
///
/// session.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    conn: Arc<dyn Connection>,
    tx: TxSlot,
    /// Hook returning the connection to its owner (e.g. a driver pool); runs
    /// before the connection itself is closed.
    on_release: Option<Box<dyn FnOnce() + Send>>,
    closed: bool,
}

impl Session {
    /// Create a session over a connection.
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        Self {
            conn,
            tx: TxSlot::default(),
            on_release: None,
            closed: false,
        }
    }

    /// Create a session whose `on_release` hook runs when the session is
    /// closed, before the connection is.
    pub fn with_release_hook(
        conn: Arc<dyn Connection>,
        on_release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            conn,
            tx: TxSlot::default(),
            on_release: Some(Box::new(on_release)),
            closed: false,
        }
    }

    /// Run a statement and return its result handle immediately.
    ///
    /// Accepts a bare `&str`, a `(text, parameters)` pair, or a
    /// [`Statement`]; execution is asynchronous and the returned
    /// [`QueryResult`] fills in as the connection delivers notifications.
    pub fn run(&self, statement: impl Into<Statement>) -> Result<QueryResult> {
        if self.closed {
            return Err(ArborLinkError::SessionClosed);
        }
        Ok(run_statement(&self.conn, statement.into()))
    }

    /// Begin an explicit transaction.
    ///
    /// Issues `BEGIN` on the connection and resolves once the server
    /// acknowledges it. While the returned [`Transaction`] is open the
    /// session refuses to open another one.
    pub async fn begin_transaction(&self) -> Result<Transaction> {
        if self.closed {
            return Err(ArborLinkError::SessionClosed);
        }
        if !self.tx.try_open() {
            return Err(ArborLinkError::TransactionOpen);
        }

        let (done_tx, done_rx) = oneshot::channel();
        let statement = Statement::new("BEGIN");
        let observer = StreamObserver::new(statement.clone());
        observer.subscribe(Box::new(TxBeginObserver {
            conn: Arc::clone(&self.conn),
            slot: self.tx.clone(),
            done: Some(done_tx),
        }));
        self.conn.run(&statement, observer.clone());
        self.conn.pull_all(observer.clone());
        self.conn.sync();

        match done_rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.tx.end();
                Err(ArborLinkError::Internal(
                    "connection dropped BEGIN without a terminal notification".to_string(),
                ))
            }
        }
    }

    /// Whether a transaction is currently open on this session.
    pub fn has_open_transaction(&self) -> bool {
        self.tx.is_open()
    }

    /// Close the session: run the release hook, then close the connection
    /// and wait for it to report closure.
    ///
    /// Safe to call multiple times — subsequent calls are no-ops.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(on_release) = self.on_release.take() {
            on_release();
        }
        let (closed_tx, closed_rx) = oneshot::channel();
        self.conn.close(closed_tx);
        // A connection that drops the sender without signalling is treated
        // as closed.
        let _ = closed_rx.await;
        log::debug!("[arbor-link] session closed");
    }
}

/// Bridges the `BEGIN` statement's terminal notification into a
/// [`Transaction`] handed to the caller. `BEGIN` produces no records, so
/// only the terminal callbacks are implemented.
struct TxBeginObserver {
    conn: Arc<dyn Connection>,
    slot: TxSlot,
    done: Option<oneshot::Sender<Result<Transaction>>>,
}

impl ResultObserver for TxBeginObserver {
    fn on_completed(&mut self, _summary: &ResultSummary) {
        if let Some(done) = self.done.take() {
            let transaction = Transaction::new(Arc::clone(&self.conn), self.slot.clone());
            let _ = done.send(Ok(transaction));
        }
    }

    fn on_error(&mut self, failure: &ServerFailure) {
        // BEGIN failed, so no transaction ever opened.
        self.slot.end();
        if let Some(done) = self.done.take() {
            let _ = done.send(Err(failure.clone().into()));
        }
    }
}
