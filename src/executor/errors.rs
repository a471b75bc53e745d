//! Executor error types
//!
//! Error codes:
//! - PUSHDOWN_EXEC_CONNECT_FAILED (FATAL)
//! - PUSHDOWN_EXEC_QUERY_FAILED (FATAL)
//! - PUSHDOWN_EXEC_DECODE_FAILED (FATAL)
//!
//! Every executor error is an infrastructure failure and ends the run.

use std::fmt;

use crate::sql::SqlError;

/// Executor error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Could not open or prepare the verification session
    ConnectFailed,
    /// The system under test rejected a query
    QueryFailed,
    /// A returned row did not have the expected shape
    DecodeFailed,
}

impl ExecutorErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::ConnectFailed => "PUSHDOWN_EXEC_CONNECT_FAILED",
            ExecutorErrorCode::QueryFailed => "PUSHDOWN_EXEC_QUERY_FAILED",
            ExecutorErrorCode::DecodeFailed => "PUSHDOWN_EXEC_DECODE_FAILED",
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error with the case it happened on
#[derive(Debug, Clone)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    /// Case id, when the failure is tied to one
    case: Option<String>,
}

impl ExecutorError {
    pub fn connect_failed(source: SqlError) -> Self {
        Self {
            code: ExecutorErrorCode::ConnectFailed,
            message: source.to_string(),
            case: None,
        }
    }

    pub fn query_failed(case: &str, source: SqlError) -> Self {
        Self {
            code: ExecutorErrorCode::QueryFailed,
            message: source.to_string(),
            case: Some(case.to_string()),
        }
    }

    pub fn decode_failed(case: &str, source: SqlError) -> Self {
        Self {
            code: ExecutorErrorCode::DecodeFailed,
            message: source.to_string(),
            case: Some(case.to_string()),
        }
    }

    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn case(&self) -> Option<&str> {
        self.case.as_deref()
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code, self.message)?;
        if let Some(case) = &self.case {
            write!(f, " [{}]", case)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutorError {}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ExecutorErrorCode::QueryFailed.code(),
            "PUSHDOWN_EXEC_QUERY_FAILED"
        );
        assert_eq!(
            ExecutorErrorCode::DecodeFailed.code(),
            "PUSHDOWN_EXEC_DECODE_FAILED"
        );
    }

    #[test]
    fn test_error_display_names_case() {
        let err = ExecutorError::query_failed("case-0003", SqlError::Connection("reset".into()));
        let display = err.to_string();
        assert!(display.starts_with("[FATAL] PUSHDOWN_EXEC_QUERY_FAILED"));
        assert!(display.contains("reset"));
        assert!(display.ends_with("[case-0003]"));
        assert_eq!(err.case(), Some("case-0003"));
    }
}
