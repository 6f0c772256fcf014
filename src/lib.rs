//! Client-side session and transaction layer for the ArborDB driver.
//!
//! This crate turns one logical [`Connection`] into a sequence of
//! well-ordered statement executions, each yielding a lazily consumed
//! [`QueryResult`], while enforcing transaction lifecycle rules: at most one
//! open [`Transaction`] per [`Session`], commit or rollback exactly once, no
//! statement execution after close.
//!
//! The wire transport, value encoding, pooling, and retry policy live below
//! the [`Connection`] trait and are provided by the driver crate.
//!
//! # Examples
//!
//! ```rust,no_run
//! # async fn example(conn: std::sync::Arc<dyn arbor_link::Connection>) -> arbor_link::Result<()> {
//! let mut session = arbor_link::Session::new(conn);
//!
//! // Auto-commit statement.
//! let result = session.run("RETURN 1 AS a")?;
//! for record in result.collect().await? {
//!     println!("a = {:?}", record.get("a"));
//! }
//!
//! // Explicit transaction.
//! let mut tx = session.begin_transaction().await?;
//! tx.run("CREATE (n:Person {name: $name})")?.consume().await?;
//! tx.commit().await?;
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod observer;
pub mod result;
pub mod session;
pub mod transaction;

pub use connection::Connection;
pub use error::{ArborLinkError, Result};
pub use models::{Parameters, Record, ResultSummary, ServerFailure, ServerSummary, Statement};
pub use observer::{ResultObserver, StreamObserver};
pub use result::QueryResult;
pub use session::Session;
pub use transaction::Transaction;
