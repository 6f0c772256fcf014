//! Data models for the arbor-link session layer.
//!
//! Defines the canonical statement form, result records, and the
//! server-reported summary and failure payloads consumed from the
//! connection layer.

pub mod record;
pub mod result_summary;
pub mod server_failure;
pub mod server_summary;
pub mod statement;


pub use record::Record;
pub use result_summary::ResultSummary;
pub use server_failure::ServerFailure;
pub use server_summary::ServerSummary;
pub use statement::{Parameters, Statement};
