/// Database Module
///
/// This module provides the core database functionality for oralab,
/// organized into focused submodules:
///
/// - **Gateway surface** (this file): the `Driver`/`Session` trait pair that
///   every database backend implements, plus the value and row-set types
///   exchanged across it.
/// - **Output Drain Protocol** (`drain.rs`): the polling loop that retrieves
///   line-buffered procedural output until the sentinel status.
/// - **Executors** (`executor.rs`): the script execution orchestrator and the
///   tabular query gateway built on top of the trait pair.
/// - **Oracle backend** (`oracle.rs`, feature `oracle`): the OCI-backed
///   implementation of the gateway surface.
///
/// ## Error Handling
///
/// Backends report failures as `GatewayError`; the executors classify them
/// per pipeline stage into the application-wide `OralabError`.
pub mod drain;
pub mod executor;
#[cfg(feature = "oracle")]
pub mod oracle;

pub use drain::*;
pub use executor::*;

use serde::Serialize;
use std::fmt;

/// A single scalar value crossing the gateway surface.
///
/// Serializes to the natural JSON scalar: `Null` to `null`, `Integer` and
/// `Number` to numbers, `Text` to a string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Number(f64),
    Text(String),
}

impl SqlValue {
    /// Renders the value for plain-text output such as the export endpoint.
    /// NULL renders as the empty string, matching how a spreadsheet-style
    /// export leaves missing cells blank.
    pub fn as_text(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Number(n) => n.to_string(),
            SqlValue::Text(t) => t.clone(),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Integer(i)
    }
}

/// A named bind parameter for a script or query.
pub type Bind = (&'static str, SqlValue);

/// The raw result of one read query: column names captured once, rows as
/// positional value sequences in column order.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// One round trip of the line-retrieval protocol.
///
/// `more == true` means a line was produced and another round trip may
/// follow; `more == false` is the sentinel status, after which the buffer is
/// exhausted. A produced-but-empty line arrives as `line: None, more: true`.
#[derive(Debug, Clone)]
pub struct FetchedLine {
    pub line: Option<String>,
    pub more: bool,
}

/// Failure reported by a gateway backend, carrying the database's message
/// and, when the backend surfaces one, its numeric error code.
#[derive(Debug, Clone)]
pub struct GatewayError {
    pub message: String,
    pub code: Option<i32>,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        GatewayError {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        GatewayError {
            message: message.into(),
            code: Some(code),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "ORA-{:05}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Raw gateway result type used by backend implementations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// A live handle to one database connection.
///
/// A session is exclusively owned by the request handling that created it
/// and released exactly once at the end of that handling. Sessions are never
/// shared across requests.
pub trait Session: Send {
    /// Submits a procedural block or statement that produces no row set.
    fn run(&mut self, text: &str, binds: &[Bind]) -> GatewayResult<()>;

    /// Submits one read query and collects its full row set.
    fn query(&mut self, sql: &str, binds: &[Bind]) -> GatewayResult<RowSet>;

    /// Performs one round trip of the buffered-output retrieval protocol.
    fn fetch_output_line(&mut self) -> GatewayResult<FetchedLine>;

    /// Releases the underlying connection. Idempotent; must not fail the
    /// caller's flow.
    fn release(&mut self);
}

/// Factory for sessions. One driver instance is shared by the whole server;
/// each request connects its own session through it.
pub trait Driver: Send + Sync {
    fn connect(&self) -> GatewayResult<Box<dyn Session>>;
}

/// Runs a closure against a freshly acquired session, releasing the session
/// on every exit path.
///
/// This is the single place that implements the scoped acquisition/release
/// discipline; the orchestrator and every query route go through it.
///
/// # Errors
///
/// Returns `OralabError::Connection` if the session cannot be acquired;
/// otherwise whatever the closure returns.
pub fn with_session<T, F>(driver: &dyn Driver, f: F) -> crate::core::Result<T>
where
    F: FnOnce(&mut dyn Session) -> crate::core::Result<T>,
{
    let mut session = driver
        .connect()
        .map_err(|e| crate::core::OralabError::Connection(e.to_string()))?;
    let outcome = f(session.as_mut());
    session.release();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_serialization() {
        let values = vec![
            SqlValue::Null,
            SqlValue::Integer(42),
            SqlValue::Number(10.5),
            SqlValue::Text("hello".to_string()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,42,10.5,"hello"]"#);
    }

    #[test]
    fn test_sql_value_as_text() {
        assert_eq!(SqlValue::Null.as_text(), "");
        assert_eq!(SqlValue::Integer(7).as_text(), "7");
        assert_eq!(SqlValue::Text("a".to_string()).as_text(), "a");
    }

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::with_code("table or view does not exist", 942);
        assert_eq!(err.to_string(), "ORA-00942: table or view does not exist");

        let plain = GatewayError::new("listener refused the connection");
        assert_eq!(plain.to_string(), "listener refused the connection");
    }
}
