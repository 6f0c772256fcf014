use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Parameter mapping attached to a statement.
pub type Parameters = Map<String, JsonValue>;

/// A unit of query text plus its parameter mapping.
///
/// `Session::run` and `Transaction::run` accept anything convertible into a
/// `Statement`, so callers can pass a bare `&str`, a `(text, parameters)`
/// pair, or a fully built `Statement` value. The conversion happens once at
/// the API boundary; everything downstream sees the canonical form.
///
/// # Examples
///
/// ```rust
/// use arbor_link::Statement;
///
/// let plain = Statement::new("MATCH (n) RETURN n");
///
/// let with_params = Statement::new("CREATE (n:Label {prop: $prop}) RETURN n")
///     .param("prop", "string");
/// assert_eq!(with_params.parameters.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// The query text.
    pub text: String,

    /// Named parameters referenced by the text. Empty when the statement
    /// takes none.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Parameters,
}

impl Statement {
    /// Create a statement with no parameters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Parameters::new(),
        }
    }

    /// Create a statement with an existing parameter mapping.
    pub fn with_parameters(text: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            text: text.into(),
            parameters,
        }
    }

    /// Add a single named parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

impl From<&str> for Statement {
    fn from(text: &str) -> Self {
        Statement::new(text)
    }
}

impl From<String> for Statement {
    fn from(text: String) -> Self {
        Statement::new(text)
    }
}

impl<T: Into<String>> From<(T, Parameters)> for Statement {
    fn from((text, parameters): (T, Parameters)) -> Self {
        Statement::with_parameters(text, parameters)
    }
}
