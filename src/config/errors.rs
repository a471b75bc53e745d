//! Configuration error types
//!
//! Error codes:
//! - PUSHDOWN_CONFIG_READ (FATAL)
//! - PUSHDOWN_CONFIG_PARSE (FATAL)
//! - PUSHDOWN_CONFIG_INVALID (FATAL)

use std::fmt;

/// Configuration error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// File could not be read
    Read,
    /// File is not valid JSON for the config shape
    Parse,
    /// Values are well-formed but unusable
    Invalid,
}

impl ConfigErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigErrorCode::Read => "PUSHDOWN_CONFIG_READ",
            ConfigErrorCode::Parse => "PUSHDOWN_CONFIG_PARSE",
            ConfigErrorCode::Invalid => "PUSHDOWN_CONFIG_INVALID",
        }
    }
}

/// Configuration error
#[derive(Debug, Clone)]
pub struct ConfigError {
    code: ConfigErrorCode,
    message: String,
}

impl ConfigError {
    pub fn read(message: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::Read,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::Parse,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::Invalid,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ConfigErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ConfigError {}

pub type ConfigResult<T> = Result<T, ConfigError>;
