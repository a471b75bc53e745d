//! Run counters
//!
//! - Counters only, monotonic within a run
//! - Thread-safe: seeding workers increment concurrently
//! - Snapshotted into the run report

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one verification run.
///
/// Relaxed ordering throughout; the join barrier after seeding and the
/// sequential verification loop give all the ordering the report needs.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    rows_written: AtomicU64,
    batches_written: AtomicU64,
    statements_executed: AtomicU64,
    queries_executed: AtomicU64,
    rows_returned: AtomicU64,
    cases_passed: AtomicU64,
    cases_failed: AtomicU64,
    splits_applied: AtomicU64,
    layout_divergences: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding

    pub fn add_rows_written(&self, rows: u64) {
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn increment_batches_written(&self) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.statements_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Relaxed)
    }

    // Maintenance

    pub fn increment_statements(&self) {
        self.statements_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_splits(&self) {
        self.splits_applied.fetch_add(1, Ordering::Relaxed);
        self.statements_executed.fetch_add(1, Ordering::Relaxed);
    }

    // Verification

    pub fn record_query(&self, rows_returned: u64) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
        self.rows_returned.fetch_add(rows_returned, Ordering::Relaxed);
    }

    pub fn increment_cases_passed(&self) {
        self.cases_passed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cases_failed(&self) {
        self.cases_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_divergences(&self) {
        self.layout_divergences.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_written: self.rows_written.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            statements_executed: self.statements_executed.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            rows_returned: self.rows_returned.load(Ordering::Relaxed),
            cases_passed: self.cases_passed.load(Ordering::Relaxed),
            cases_failed: self.cases_failed.load(Ordering::Relaxed),
            splits_applied: self.splits_applied.load(Ordering::Relaxed),
            layout_divergences: self.layout_divergences.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of every counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub rows_written: u64,
    pub batches_written: u64,
    pub statements_executed: u64,
    pub queries_executed: u64,
    pub rows_returned: u64,
    pub cases_passed: u64,
    pub cases_failed: u64,
    pub splits_applied: u64,
    pub layout_divergences: u64,
}
