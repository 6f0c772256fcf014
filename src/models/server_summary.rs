use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Post-completion metadata as reported by the server for one statement.
///
/// The connection layer decodes this from the wire and hands it to the
/// active observer verbatim; everything except the statement classification
/// is treated as an opaque payload whose internal shape the server owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSummary {
    /// Statement classification (e.g. read-only, read-write, schema-write).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_type: Option<String>,

    /// Update statistics (nodes created, properties set, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<JsonValue>,

    /// Query plan, present for EXPLAIN-ed and profiled statements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<JsonValue>,

    /// Execution profile, present for profiled statements only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<JsonValue>,

    /// Server notifications (warnings, hints) attached to the statement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<JsonValue>,
}
