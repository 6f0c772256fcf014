use serde_json::Value as JsonValue;

use super::server_summary::ServerSummary;
use super::statement::Statement;

/// Summary of one completed statement execution.
///
/// Pairs the statement as resolved at the API boundary with the metadata the
/// server reported on completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    /// The statement that was executed, text and parameters.
    pub statement: Statement,

    /// Server-reported completion metadata, forwarded verbatim.
    pub server: ServerSummary,
}

impl ResultSummary {
    pub(crate) fn new(statement: Statement, server: ServerSummary) -> Self {
        Self { statement, server }
    }

    /// Statement classification, when the server reported one.
    pub fn statement_type(&self) -> Option<&str> {
        self.server.statement_type.as_deref()
    }

    /// Update statistics payload, when the server reported one.
    pub fn stats(&self) -> Option<&JsonValue> {
        self.server.stats.as_ref()
    }

    /// True when the summary carries a query plan. A profiled statement
    /// always has a plan.
    pub fn has_plan(&self) -> bool {
        self.server.plan.is_some() || self.server.profile.is_some()
    }

    /// True when the summary carries an execution profile.
    pub fn has_profile(&self) -> bool {
        self.server.profile.is_some()
    }

    /// Query plan payload.
    pub fn plan(&self) -> Option<&JsonValue> {
        self.server.plan.as_ref().or(self.server.profile.as_ref())
    }

    /// Execution profile payload.
    pub fn profile(&self) -> Option<&JsonValue> {
        self.server.profile.as_ref()
    }

    /// Server notifications attached to the statement.
    pub fn notifications(&self) -> &[JsonValue] {
        &self.server.notifications
    }
}
