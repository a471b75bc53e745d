//! Top-level harness errors
//!
//! Infrastructure failures from every layer, gathered for the orchestrator
//! and the CLI. Correctness violations are not errors; they live in the
//! run report.

use thiserror::Error;

use crate::config::ConfigError;
use crate::dataset::GenerateError;
use crate::executor::ExecutorError;
use crate::sql::SqlError;

pub type HarnessResult<T> = Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Sql(#[from] SqlError),

    #[error("{0}")]
    Generate(#[from] GenerateError),

    #[error("{0}")]
    Executor(#[from] ExecutorError),

    /// Seeding finished but ground truth does not describe the planned rows
    #[error("ground truth holds {actual} rows, planned {expected}")]
    TruthMismatch { expected: u64, actual: u64 },
}

impl HarnessError {
    pub fn code(&self) -> &'static str {
        match self {
            HarnessError::Config(e) => e.code().code(),
            HarnessError::Sql(e) => e.code(),
            HarnessError::Generate(e) => e.code().code(),
            HarnessError::Executor(e) => e.code().code(),
            HarnessError::TruthMismatch { .. } => "PUSHDOWN_TRUTH_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_pass_through() {
        let err: HarnessError = SqlError::Connection("refused".into()).into();
        assert_eq!(err.code(), "PUSHDOWN_SQL_CONNECTION");
        assert!(err.to_string().contains("refused"));

        let err: HarnessError = ConfigError::invalid("workers must be > 0").into();
        assert_eq!(err.code(), "PUSHDOWN_CONFIG_INVALID");

        let err = HarnessError::TruthMismatch {
            expected: 10,
            actual: 9,
        };
        assert_eq!(err.code(), "PUSHDOWN_TRUTH_MISMATCH");
    }
}
