//! Ground-truth index errors
//!
//! Error codes:
//! - PUSHDOWN_DUPLICATE_KEY (FATAL)

use std::fmt;

use crate::dataset::CompositeKey;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The run must stop
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// A composite key was recorded twice
    PushdownDuplicateKey,
}

impl IndexErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::PushdownDuplicateKey => "PUSHDOWN_DUPLICATE_KEY",
        }
    }

    /// All index errors are FATAL: a corrupt oracle cannot judge anything
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error with context
#[derive(Debug, Clone)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
}

impl IndexError {
    /// A key already present in some bucket was inserted again
    pub fn duplicate_key(key: &CompositeKey, existing_k: i64, new_k: i64) -> Self {
        Self {
            code: IndexErrorCode::PushdownDuplicateKey,
            message: format!(
                "key {} already indexed under k={} (attempted k={})",
                key, existing_k, new_k
            ),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    /// Returns the message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
