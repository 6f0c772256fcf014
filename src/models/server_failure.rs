use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Structured failure reported by the server for one statement.
///
/// Carried verbatim to every current and future subscriber of the failed
/// result; never followed by further records or a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerFailure {
    /// Machine-readable failure code (e.g. `Arbor.ClientError.Statement.InvalidSyntax`).
    pub code: String,

    /// Human-readable failure message.
    pub message: String,

    /// Optional additional details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl ServerFailure {
    /// Create a failure from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// The populated fields of this failure as `(name, value)` pairs.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("code", self.code.clone()),
            ("message", self.message.clone()),
        ];
        if let Some(details) = &self.details {
            fields.push(("details", details.to_string()));
        }
        fields
    }
}

impl fmt::Display for ServerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServerFailure {}
