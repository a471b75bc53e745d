//! Connector construction from configuration

use crate::config::BackendConfig;
use crate::engine::MemoryEngine;
use crate::sql::{Connector, SqlResult};

/// Opens the configured backend
pub fn open_backend(config: &BackendConfig) -> SqlResult<Box<dyn Connector>> {
    match config {
        BackendConfig::Memory { fault } => Ok(Box::new(MemoryEngine::new(*fault)?)),
        BackendConfig::Mysql { url } => open_mysql(url),
    }
}

#[cfg(feature = "mysql")]
fn open_mysql(url: &str) -> SqlResult<Box<dyn Connector>> {
    Ok(Box::new(crate::sql::MysqlConnector::new(url)?))
}

#[cfg(not(feature = "mysql"))]
fn open_mysql(_url: &str) -> SqlResult<Box<dyn Connector>> {
    Err(crate::sql::SqlError::Unsupported(
        "mysql backend requires building with `--features mysql`".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FaultMode;

    #[test]
    fn test_memory_backend() {
        let connector = open_backend(&BackendConfig::Memory {
            fault: FaultMode::None,
        })
        .unwrap();
        assert_eq!(connector.name(), "memory");
    }

    #[cfg(not(feature = "mysql"))]
    #[test]
    fn test_mysql_needs_feature() {
        let result = open_backend(&BackendConfig::Mysql {
            url: "mysql://root@127.0.0.1:4000/test".to_string(),
        });
        assert!(result.is_err());
    }
}
