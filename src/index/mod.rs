//! Ground-truth index
//!
//! An in-memory mapping from indexed value `k` to the exact set of
//! composite keys a pushdown query must return, plus the reverse mapping
//! from key back to `k` used for order checks.
//!
//! # Invariants
//!
//! - The union of all buckets is exactly the generated row set
//! - Each composite key lives in exactly one bucket
//! - Built during seeding, read-only during verification
//! - BTree ordering keeps every lookup deterministic

mod errors;
mod ground_truth;

pub use errors::{IndexError, IndexErrorCode, IndexResult};
pub use ground_truth::{GroundTruthIndex, KeySet};
