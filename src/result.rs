//! Consumer-facing result handle for one statement execution.

use std::sync::Arc;

use crate::error::{ArborLinkError, Result};
use crate::models::{Record, ResultSummary, Statement};
use crate::observer::{ResultObserver, StreamInner, StreamObserver, Terminal};

/// Lazily consumed result of one statement execution.
///
/// Returned immediately by `Session::run` / `Transaction::run`; the stream
/// fills in as the connection delivers notifications. Two consumption
/// protocols are offered, with identical ordering and exactly-one-terminal
/// guarantees:
///
/// - **subscription**: [`subscribe`](QueryResult::subscribe) an observer;
///   everything buffered so far is replayed synchronously, then delivery
///   continues live;
/// - **awaiting**: [`next`](QueryResult::next) pulls records one at a time,
///   [`collect`](QueryResult::collect) waits for completion and yields the
///   full sequence, [`consume`](QueryResult::consume) waits for completion
///   and yields the summary.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn example(session: &arbor_link::Session) -> arbor_link::Result<()> {
/// let mut result = session.run("MATCH (n) RETURN n.name AS name")?;
/// while let Some(record) = result.next().await {
///     println!("{:?}", record?.get("name"));
/// }
/// # Ok(())
/// # }
/// ```
pub struct QueryResult {
    inner: Arc<StreamInner>,
    /// Index of the next buffered record `next()` will yield. Each
    /// `QueryResult` consumer replays from the start of the buffer.
    cursor: usize,
    /// Whether `next()` has already yielded the failure terminal.
    errored: bool,
}

impl QueryResult {
    pub(crate) fn new(observer: &StreamObserver) -> Self {
        Self {
            inner: observer.inner(),
            cursor: 0,
            errored: false,
        }
    }

    /// The statement this result was produced by, as resolved at the API
    /// boundary.
    pub fn statement(&self) -> &Statement {
        self.inner.statement()
    }

    /// Attach a subscriber.
    ///
    /// Records buffered so far are replayed synchronously in arrival order;
    /// if the stream already terminated the terminal follows immediately.
    /// Otherwise the subscriber receives further notifications live. Each
    /// subscriber sees the terminal at most once.
    pub fn subscribe(&self, observer: impl ResultObserver + 'static) {
        self.inner.subscribe(Box::new(observer));
    }

    /// Pull the next record, waiting for the connection when the buffer is
    /// drained.
    ///
    /// Yields `Some(Err(..))` exactly once for a failed statement, then
    /// `None`. Yields `None` after the last record of a completed statement.
    pub async fn next(&mut self) -> Option<Result<Record>> {
        loop {
            // Register for wakeup before checking, so a notification landing
            // between the check and the await is not lost. `enable` is what
            // actually registers the waiter with the Notify.
            let notified = self.inner.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            enum Step {
                Yield(Record),
                Done,
                Fail(crate::models::ServerFailure),
                Wait,
            }

            let step = self.inner.with_state(|records, terminal| {
                if self.cursor < records.len() {
                    return Step::Yield(records[self.cursor].clone());
                }
                match terminal {
                    Some(Terminal::Completed(_)) => Step::Done,
                    Some(Terminal::Failed(failure)) if !self.errored => {
                        Step::Fail(failure.clone())
                    }
                    Some(Terminal::Failed(_)) => Step::Done,
                    None => Step::Wait,
                }
            });

            match step {
                Step::Yield(record) => {
                    self.cursor += 1;
                    return Some(Ok(record));
                }
                Step::Done => return None,
                Step::Fail(failure) => {
                    self.errored = true;
                    return Some(Err(failure.into()));
                }
                Step::Wait => notified.await,
            }
        }
    }

    /// Wait for the terminal notification and return the full record
    /// sequence, always from the start of the stream and independent of any
    /// [`next`](QueryResult::next) cursor.
    pub async fn collect(&self) -> Result<Vec<Record>> {
        match self.wait_terminal().await {
            Terminal::Completed(_) => {
                Ok(self.inner.with_state(|records, _| records.to_vec()))
            }
            Terminal::Failed(failure) => Err(failure.into()),
        }
    }

    /// Wait for the terminal notification and return the summary, discarding
    /// any unread records.
    pub async fn consume(&self) -> Result<ResultSummary> {
        match self.wait_terminal().await {
            Terminal::Completed(summary) => Ok(summary),
            Terminal::Failed(failure) => Err(failure.into()),
        }
    }

    /// Summary of the completed statement.
    ///
    /// Only valid after completion: a still-streaming result yields
    /// [`ArborLinkError::ResultIncomplete`], a failed result yields the
    /// server failure.
    pub fn summary(&self) -> Result<ResultSummary> {
        self.inner.with_state(|_, terminal| match terminal {
            Some(Terminal::Completed(summary)) => Ok(summary.clone()),
            Some(Terminal::Failed(failure)) => Err(failure.clone().into()),
            None => Err(ArborLinkError::ResultIncomplete),
        })
    }

    async fn wait_terminal(&self) -> Terminal {
        loop {
            let notified = self.inner.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let terminal = self.inner.with_state(|_, terminal| terminal.cloned());
            match terminal {
                Some(terminal) => return terminal,
                None => notified.await,
            }
        }
    }
}
