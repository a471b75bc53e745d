//! SQL connection abstraction for the system under test
//!
//! The harness only ever talks to the database through two calls:
//! `execute` for statements whose result is an affected-row count and
//! `query` for statements that return rows. DDL and maintenance
//! directives (CREATE, SPLIT, SET) travel through `execute` as opaque text.
//!
//! # Invariants
//!
//! - Rows come back in exactly the order the engine produced them
//! - Every error is an infrastructure error and is fatal to the run

mod errors;
#[cfg(feature = "mysql")]
mod mysql;
pub mod statements;
mod value;

pub use errors::{SqlError, SqlResult};
#[cfg(feature = "mysql")]
pub use mysql::MysqlConnector;
pub use value::{SqlRow, SqlValue};

/// A single session against the system under test.
pub trait SqlConnection: Send {
    /// Executes a statement and returns the affected row count.
    fn execute(&mut self, statement: &str, args: &[SqlValue]) -> SqlResult<u64>;

    /// Executes a query and returns the rows in the order received.
    fn query(&mut self, statement: &str, args: &[SqlValue]) -> SqlResult<Vec<SqlRow>>;
}

/// Opens sessions. Shared by reference across seeding workers.
pub trait Connector: Sync {
    /// Opens a new, independent session
    fn connect(&self) -> SqlResult<Box<dyn SqlConnection>>;

    /// Short backend name for logs and reports
    fn name(&self) -> &str;
}
