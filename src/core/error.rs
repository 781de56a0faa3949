/// Oralab Error Module
///
/// This module defines the error taxonomy for the whole application. Each
/// variant corresponds to one step of the request pipeline that can fail
/// independently: reaching the database, managing the server output buffer,
/// running a procedural block, draining its output, or running a read query.
use thiserror::Error;

/// Comprehensive error type for the oralab application.
///
/// The database-facing variants map one-to-one onto the stages of script
/// execution, so a caller can always tell which stage broke:
/// - `Connection`: the session could not be acquired at all
/// - `Session`: the output buffer could not be enabled
/// - `Script`: the submitted PL/SQL block itself failed
/// - `Drain`: the line-retrieval loop failed (distinct from "no output")
/// - `Query`: a read query failed
#[derive(Error, Debug)]
pub enum OralabError {
    /// The database is unreachable or rejected the credentials.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The output buffer could not be enabled on an acquired session.
    #[error("Session error: {0}")]
    Session(String),

    /// The submitted procedural block failed, reported with the database's
    /// own message and, when available, its numeric error code.
    #[error("Script error: {message}")]
    Script {
        message: String,
        code: Option<i32>,
    },

    /// The output drain loop itself failed partway through.
    #[error("Drain error: {0}")]
    Drain(String),

    /// A read query failed (syntax, missing table, invalid column).
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OralabError {
    /// Short machine-readable classification used by the HTTP layer.
    pub fn kind(&self) -> &'static str {
        match self {
            OralabError::Connection(_) => "connection",
            OralabError::Session(_) => "session",
            OralabError::Script { .. } => "script",
            OralabError::Drain(_) => "drain",
            OralabError::Query(_) => "query",
            OralabError::Config(_) => "config",
            OralabError::Io(_) => "io",
            OralabError::Json(_) => "json",
        }
    }
}

/// Type alias for Result to use OralabError as the error type.
///
/// This provides a consistent error type across the entire application
/// instead of using `Result<T, String>` or mixed error types.
pub type Result<T> = std::result::Result<T, OralabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let conn_err = OralabError::Connection("listener refused".to_string());
        assert!(conn_err.to_string().contains("Connection error"));

        let script_err = OralabError::Script {
            message: "table or view does not exist".to_string(),
            code: Some(942),
        };
        assert!(script_err.to_string().contains("Script error"));

        let config_err = OralabError::Config("Invalid config".to_string());
        assert!(config_err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_kind_classification() {
        assert_eq!(OralabError::Connection(String::new()).kind(), "connection");
        assert_eq!(OralabError::Session(String::new()).kind(), "session");
        assert_eq!(OralabError::Drain(String::new()).kind(), "drain");
        assert_eq!(OralabError::Query(String::new()).kind(), "query");
        let script = OralabError::Script {
            message: String::new(),
            code: None,
        };
        assert_eq!(script.kind(), "script");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OralabError = io_err.into();
        match err {
            OralabError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }
    }
}
