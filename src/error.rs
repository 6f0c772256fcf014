//! Error types for the arbor-link session layer.

use thiserror::Error;

use crate::models::ServerFailure;

/// Error type for session, transaction, and result operations.
#[derive(Debug, Error)]
pub enum ArborLinkError {
    /// The server reported a statement or transaction failure.
    #[error("server failure: {0}")]
    Server(#[from] ServerFailure),

    /// The session has been closed.
    #[error("session is closed")]
    SessionClosed,

    /// The transaction has already been committed or rolled back.
    #[error("transaction is closed")]
    TransactionClosed,

    /// A transaction is already open on this session.
    #[error("a transaction is already open on this session")]
    TransactionOpen,

    /// The result stream has not reached completion yet.
    #[error("result has not completed yet")]
    ResultIncomplete,

    /// The connection dropped an in-flight operation without a terminal
    /// notification.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ArborLinkError {
    /// The server failure carried by this error, when there is one.
    pub fn server_failure(&self) -> Option<&ServerFailure> {
        match self {
            ArborLinkError::Server(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Result type alias using [`ArborLinkError`].
pub type Result<T> = std::result::Result<T, ArborLinkError>;
