//! Error types for clusterdba.
//!
//! Defines the main error enum used throughout the console.

use thiserror::Error;

/// Main error type for console operations.
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Cluster connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution errors reported by the cluster.
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, unknown cluster, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Administrative command errors (bad arguments, unknown command).
    #[error("Command error: {0}")]
    Command(String),

    /// Statements refused by the interactive allow-list.
    #[error("Security error: {0}")]
    Security(String),

    /// Session termination failures (precondition, discovery or kill).
    #[error("Kill error: {0}")]
    Kill(String),

    /// Internal errors (history persistence, poisoned state, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConsoleError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a command error with the given message.
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Creates a security error with the given message.
    pub fn security(msg: impl Into<String>) -> Self {
        Self::Security(msg.into())
    }

    /// Creates a kill error with the given message.
    pub fn kill(msg: impl Into<String>) -> Self {
        Self::Kill(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Command(_) => "Command Error",
            Self::Security(_) => "Security Error",
            Self::Kill(_) => "Kill Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if the error ends a SQL dispatch. Only allow-list
    /// rejections let the remaining statements run.
    pub fn aborts_dispatch(&self) -> bool {
        !matches!(self, Self::Security(_))
    }
}

/// Result type alias using ConsoleError.
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_connection() {
        let err = ConsoleError::connection("Cannot connect to 10.0.0.1:4000");
        assert_eq!(
            err.to_string(),
            "Connection error: Cannot connect to 10.0.0.1:4000"
        );
        assert_eq!(err.category(), "Connection Error");
    }

    #[test]
    fn test_error_display_query() {
        let err = ConsoleError::query("Unknown column 'emal' in 'field list'");
        assert_eq!(
            err.to_string(),
            "Query error: Unknown column 'emal' in 'field list'"
        );
        assert_eq!(err.category(), "Query Error");
    }

    #[test]
    fn test_error_display_security() {
        let err = ConsoleError::security("current command [DELETE] is not allowed");
        assert_eq!(
            err.to_string(),
            "Security error: current command [DELETE] is not allowed"
        );
        assert_eq!(err.category(), "Security Error");
    }

    #[test]
    fn test_error_display_kill() {
        let err = ConsoleError::kill("enable-global-kill is not set");
        assert_eq!(err.to_string(), "Kill error: enable-global-kill is not set");
        assert_eq!(err.category(), "Kill Error");
    }

    #[test]
    fn test_error_display_internal() {
        let err = ConsoleError::internal("save history error");
        assert_eq!(err.to_string(), "Internal error: save history error");
        assert_eq!(err.category(), "Internal Error");
    }

    #[test]
    fn test_dispatch_abort_classes() {
        assert!(ConsoleError::connection("x").aborts_dispatch());
        assert!(ConsoleError::query("x").aborts_dispatch());
        assert!(ConsoleError::config("x").aborts_dispatch());
        assert!(!ConsoleError::security("x").aborts_dispatch());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConsoleError>();
    }
}
