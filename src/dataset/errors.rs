//! Seeding error types
//!
//! Error codes:
//! - PUSHDOWN_SEED_INVALID_PLAN (FATAL)
//! - PUSHDOWN_SEED_WRITE_FAILED (FATAL)
//! - PUSHDOWN_SEED_WORKER_PANICKED (FATAL)
//! - PUSHDOWN_SEED_ABORTED (FATAL)
//! - PUSHDOWN_SEED_INDEX_CONFLICT (FATAL)

use std::fmt;

use crate::index::IndexError;
use crate::sql::SqlError;

/// Seeding error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateErrorCode {
    /// Plan parameters cannot produce a dataset
    InvalidPlan,
    /// A batch insert failed
    WriteFailed,
    /// A worker thread panicked
    WorkerPanicked,
    /// A worker stopped early because another worker failed
    Aborted,
    /// Ground truth rejected a row
    IndexConflict,
}

impl GenerateErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            GenerateErrorCode::InvalidPlan => "PUSHDOWN_SEED_INVALID_PLAN",
            GenerateErrorCode::WriteFailed => "PUSHDOWN_SEED_WRITE_FAILED",
            GenerateErrorCode::WorkerPanicked => "PUSHDOWN_SEED_WORKER_PANICKED",
            GenerateErrorCode::Aborted => "PUSHDOWN_SEED_ABORTED",
            GenerateErrorCode::IndexConflict => "PUSHDOWN_SEED_INDEX_CONFLICT",
        }
    }
}

impl fmt::Display for GenerateErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Seeding failure. Always fatal to the run.
#[derive(Debug, Clone)]
pub struct GenerateError {
    code: GenerateErrorCode,
    message: String,
    worker: Option<usize>,
}

impl GenerateError {
    pub fn invalid_plan(reason: impl Into<String>) -> Self {
        Self {
            code: GenerateErrorCode::InvalidPlan,
            message: reason.into(),
            worker: None,
        }
    }

    pub fn write_failed(worker: usize, source: SqlError) -> Self {
        Self {
            code: GenerateErrorCode::WriteFailed,
            message: source.to_string(),
            worker: Some(worker),
        }
    }

    pub fn worker_panicked(worker: usize) -> Self {
        Self {
            code: GenerateErrorCode::WorkerPanicked,
            message: "seeding worker panicked".to_string(),
            worker: Some(worker),
        }
    }

    pub fn aborted(worker: usize) -> Self {
        Self {
            code: GenerateErrorCode::Aborted,
            message: "stopped after another seeding worker failed".to_string(),
            worker: Some(worker),
        }
    }

    pub fn index_conflict(source: IndexError) -> Self {
        Self {
            code: GenerateErrorCode::IndexConflict,
            message: source.message().to_string(),
            worker: None,
        }
    }

    pub fn code(&self) -> GenerateErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Worker that failed, if the failure is worker-local
    pub fn worker(&self) -> Option<usize> {
        self.worker
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code, self.message)?;
        if let Some(worker) = self.worker {
            write!(f, " [worker {}]", worker)?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerateError {}

impl From<IndexError> for GenerateError {
    fn from(e: IndexError) -> Self {
        GenerateError::index_conflict(e)
    }
}

/// Result type for seeding
pub type GenerateResult<T> = Result<T, GenerateError>;
