//! Query Executor
//!
//! Turns a case into a hinted SELECT, runs it over one reused session, and
//! hands back the rows in the order they arrived. Order only matters to the
//! verifier when the case asked for a sort.
//!
//! Any failure here is an infrastructure error: there is no retry.

mod errors;
mod executor;
mod query;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult};
pub use executor::{LiveRow, QueryExecutor};
pub use query::QueryBuilder;
