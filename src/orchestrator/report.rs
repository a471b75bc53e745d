//! Machine-readable run report
//!
//! Serialized to stdout by the CLI. Everything needed to reproduce a
//! failure is in here: the seed, the failing cases, and the returned keys.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cases::Case;
use crate::observability::MetricsSnapshot;
use crate::sql::statements::PrimaryKey;
use crate::verifier::Violation;

/// One layout's verification pass
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub layout: String,
    pub regions: u32,
    /// Cases actually run; less than the batch when fail-fast stopped early
    pub cases_run: usize,
    pub cases_passed: usize,
    pub elapsed_ms: u64,
    pub violations: Vec<Violation>,
}

impl PhaseReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A case answered differently by two layouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutDivergence {
    pub case: Case,
    pub baseline: String,
    pub layout: String,
    pub baseline_count: usize,
    pub count: usize,
    /// Present when the key sets were compared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub seed: u64,
    pub rows: u64,
    pub key_cardinality: i64,
    pub primary_key: PrimaryKey,
    pub backend: String,
    pub cases: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phases: Vec<PhaseReport>,
    pub divergences: Vec<LayoutDivergence>,
    pub metrics: MetricsSnapshot,
    pub passed: bool,
}

impl RunReport {
    /// Every violation across all phases, in run order
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.phases.iter().flat_map(|p| p.violations.iter())
    }
}
