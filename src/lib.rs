//! pushdown-verify - a randomized correctness oracle for secondary-index
//! lookup pushdown
//!
//! Seeds a table and an in-memory ground truth from the same seeded stream,
//! reshapes the table's physical layout, and checks that every synthesized
//! index query returns exactly what ground truth predicts under each layout.

pub mod cases;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod index;
pub mod observability;
pub mod orchestrator;
pub mod sql;
pub mod verifier;

pub use errors::{HarnessError, HarnessResult};
