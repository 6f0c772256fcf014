//! Transaction: a bounded BEGIN..COMMIT/ROLLBACK unit of execution within a
//! session.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::connection::Connection;
use crate::error::{ArborLinkError, Result};
use crate::models::{ResultSummary, ServerFailure, Statement};
use crate::observer::{ResultObserver, StreamObserver};
use crate::result::QueryResult;
use crate::session::{run_statement, TxSlot};

/// An open transaction on a session.
///
/// Created by `Session::begin_transaction` once the server acknowledges
/// `BEGIN`. Any number of statements may run inside it; the transaction ends
/// with exactly one of [`commit`](Transaction::commit) or
/// [`rollback`](Transaction::rollback), after which further operations are
/// rejected. Whatever the outcome, the owning session's open-transaction
/// state is cleared before the caller observes it, so a new transaction can
/// be begun immediately from the caller's continuation.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn example(session: &arbor_link::Session) -> arbor_link::Result<()> {
/// let mut tx = session.begin_transaction().await?;
/// let result = tx.run("CREATE (n:Person {name: $name}) RETURN n")?;
/// result.consume().await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
pub struct Transaction {
    conn: Arc<dyn Connection>,
    slot: TxSlot,
    closed: bool,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("slot", &self.slot)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Transaction {
    pub(crate) fn new(conn: Arc<dyn Connection>, slot: TxSlot) -> Self {
        Self {
            conn,
            slot,
            closed: false,
        }
    }

    /// Run a statement inside this transaction.
    ///
    /// Same input forms and execution pattern as `Session::run`, over the
    /// same connection.
    pub fn run(&self, statement: impl Into<Statement>) -> Result<QueryResult> {
        if self.closed {
            return Err(ArborLinkError::TransactionClosed);
        }
        Ok(run_statement(&self.conn, statement.into()))
    }

    /// Commit the transaction, returning the server's commit summary.
    ///
    /// The transaction is closed whether or not the commit succeeds; a
    /// second call yields [`ArborLinkError::TransactionClosed`].
    pub async fn commit(&mut self) -> Result<ResultSummary> {
        self.finish("COMMIT").await
    }

    /// Roll the transaction back, discarding its writes.
    pub async fn rollback(&mut self) -> Result<ResultSummary> {
        self.finish("ROLLBACK").await
    }

    async fn finish(&mut self, text: &str) -> Result<ResultSummary> {
        if self.closed {
            return Err(ArborLinkError::TransactionClosed);
        }
        // Terminal regardless of outcome.
        self.closed = true;
        log::debug!("[arbor-link] closing transaction: {}", text);

        let (done_tx, done_rx) = oneshot::channel();
        let statement = Statement::new(text);
        let observer = StreamObserver::new(statement.clone());
        observer.subscribe(Box::new(TxCloseObserver {
            slot: self.slot.clone(),
            done: Some(done_tx),
        }));
        self.conn.run(&statement, observer.clone());
        self.conn.pull_all(observer.clone());
        self.conn.sync();

        match done_rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.slot.end();
                Err(ArborLinkError::Internal(format!(
                    "connection dropped {text} without a terminal notification"
                )))
            }
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        // A leaked open transaction must not wedge its session.
        if !self.closed {
            log::warn!("[arbor-link] transaction dropped without commit or rollback");
            self.slot.end();
        }
    }
}

/// Bridges the `COMMIT`/`ROLLBACK` terminal notification back to the caller.
///
/// Invariant: the session's open-transaction slot is cleared *before* the
/// outcome is sent, so a caller resuming on the outcome may immediately
/// begin a new transaction. `COMMIT` and `ROLLBACK` produce no user-visible
/// records, so only the terminal callbacks are implemented.
struct TxCloseObserver {
    slot: TxSlot,
    done: Option<oneshot::Sender<Result<ResultSummary>>>,
}

impl ResultObserver for TxCloseObserver {
    fn on_completed(&mut self, summary: &ResultSummary) {
        self.slot.end();
        if let Some(done) = self.done.take() {
            let _ = done.send(Ok(summary.clone()));
        }
    }

    fn on_error(&mut self, failure: &ServerFailure) {
        self.slot.end();
        if let Some(done) = self.done.take() {
            let _ = done.send(Err(failure.clone().into()));
        }
    }
}
