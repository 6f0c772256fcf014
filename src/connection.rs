//! The connection contract this crate executes statements over.
//!
//! The transport itself (framing, value encoding, pooling, reconnection)
//! lives below this trait and is out of scope here; the session layer only
//! depends on the delivery guarantees documented on [`Connection`].

use tokio::sync::oneshot;

use crate::models::Statement;
use crate::observer::StreamObserver;

/// One logical connection to an ArborDB server.
///
/// Implementations must honor the following delivery contract, which the
/// session layer relies on instead of doing its own synchronization:
///
/// - operations are executed in the order they were queued;
/// - observer notifications are delivered asynchronously from the
///   connection's own task, never concurrently with each other for the same
///   connection;
/// - each statement's observer receives zero or more
///   [`on_next`](StreamObserver::on_next) calls followed by exactly one of
///   [`on_completed`](StreamObserver::on_completed) or
///   [`on_error`](StreamObserver::on_error), never both.
pub trait Connection: Send + Sync {
    /// Enqueue statement execution. The observer receives the statement's
    /// record notifications once the queue is flushed.
    fn run(&self, statement: &Statement, observer: StreamObserver);

    /// Enqueue a request for all remaining result records of the most
    /// recently run statement.
    fn pull_all(&self, observer: StreamObserver);

    /// Flush queued operations to the network, triggering eventual callback
    /// delivery.
    fn sync(&self);

    /// Release the connection; `on_closed` fires once release completes.
    fn close(&self, on_closed: oneshot::Sender<()>);
}
