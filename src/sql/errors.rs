//! SQL layer errors
//!
//! Every variant is an infrastructure failure. None are retried.

use thiserror::Error;

/// Result type for SQL operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while talking to the system under test
#[derive(Debug, Clone, Error)]
pub enum SqlError {
    /// Could not open or keep a session
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The engine rejected or failed a statement
    #[error("Execution failed for `{statement}`: {message}")]
    Execution { statement: String, message: String },

    /// A returned value did not have the expected shape
    #[error("Decode failed: {0}")]
    Decode(String),

    /// The statement is outside the dialect this backend understands
    #[error("Unsupported statement: {0}")]
    Unsupported(String),

    /// Shared engine state was poisoned by a panicking session
    #[error("Engine state poisoned")]
    Poisoned,
}

impl SqlError {
    /// Build an execution error for a statement
    pub fn execution(statement: &str, message: impl Into<String>) -> Self {
        SqlError::Execution {
            statement: Self::abbreviate(statement),
            message: message.into(),
        }
    }

    /// Short upper-snake code for CLI output
    pub fn code(&self) -> &'static str {
        match self {
            SqlError::Connection(_) => "PUSHDOWN_SQL_CONNECTION",
            SqlError::Execution { .. } => "PUSHDOWN_SQL_EXECUTION",
            SqlError::Decode(_) => "PUSHDOWN_SQL_DECODE",
            SqlError::Unsupported(_) => "PUSHDOWN_SQL_UNSUPPORTED",
            SqlError::Poisoned => "PUSHDOWN_SQL_POISONED",
        }
    }

    // Batched inserts are large; keep messages readable.
    fn abbreviate(statement: &str) -> String {
        const MAX: usize = 160;
        if statement.len() <= MAX {
            return statement.to_string();
        }
        let mut end = MAX;
        while !statement.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &statement[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_abbreviates_long_statements() {
        let stmt = format!("INSERT INTO t VALUES {}", "(?, ?), ".repeat(100));
        let err = SqlError::execution(&stmt, "boom");
        let display = err.to_string();
        assert!(display.contains("..."));
        assert!(display.contains("boom"));
        assert!(display.len() < stmt.len());
    }

    #[test]
    fn test_codes() {
        assert_eq!(SqlError::Poisoned.code(), "PUSHDOWN_SQL_POISONED");
        assert_eq!(
            SqlError::Decode("x".into()).code(),
            "PUSHDOWN_SQL_DECODE"
        );
    }
}
