//! Dataset generation
//!
//! Produces the rows of the table under test with a controlled
//! distribution of the indexed column `k`, writes them to the system under
//! test, and records each one in the ground truth as it is constructed.
//!
//! # Seeding model
//!
//! - The dense id range `1..=N` is cut into contiguous, disjoint slices
//! - One worker thread per slice, each with its own connection and RNG
//! - Workers share nothing but atomic progress counters
//! - All workers join before the ground truth is handed out

mod errors;
mod generator;
mod row;

pub use errors::{GenerateError, GenerateErrorCode, GenerateResult};
pub use generator::{worker_ranges, DatasetGenerator, DatasetPlan, KeyCoverage};
pub use row::{random_id2, CompositeKey, Row};
