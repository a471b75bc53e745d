//! Result Verifier
//!
//! A pure function of (case, live rows, ground truth). Checks run in a fixed
//! order and the first failure decides the verdict:
//!
//! 1. Uniqueness: no composite key twice
//! 2. Soundness: every row satisfies the predicate and agrees with ground truth
//! 3. Count: exactly what pagination leaves of the expected set
//! 4. Order: `k` is monotonic in the requested direction
//!
//! Violations are values. Nothing in here logs, panics, or returns an error.

mod fingerprint;
mod verdict;

pub use fingerprint::ResultFingerprint;
pub use verdict::{Verdict, Violation, ViolationKind};

use std::collections::HashSet;

use crate::cases::Case;
use crate::executor::LiveRow;
use crate::index::GroundTruthIndex;

/// Checks one case's live result against ground truth
pub fn verify(case: &Case, rows: &[LiveRow], truth: &GroundTruthIndex) -> Verdict {
    let expected = truth.expected_for(&case.predicate);
    let expected_count = case.pagination.expected_count(expected.len());
    let fingerprint = ResultFingerprint::of(rows.iter().map(|r| &r.key));

    let violation = |kind: ViolationKind, detail: String| Violation {
        kind,
        case: case.clone(),
        expected_count,
        actual_count: rows.len(),
        keys: rows.iter().map(|r| r.key.to_string()).collect(),
        detail,
    };

    let mut seen = HashSet::with_capacity(rows.len());
    for (pos, row) in rows.iter().enumerate() {
        if !seen.insert(&row.key) {
            let detail = format!("key {} returned twice (second at position {})", row.key, pos);
            let found = violation(ViolationKind::Duplicate, detail);
            return Verdict::fail(case, expected_count, fingerprint, found);
        }
    }

    for row in rows {
        let detail = if !case.predicate.matches(row.k) {
            format!("key {} has k = {}, which fails `{}`", row.key, row.k, case.predicate)
        } else if !expected.contains(&row.key) {
            format!("key {} is not in the expected set", row.key)
        } else if truth.k_of(&row.key) != Some(row.k) {
            format!(
                "key {} returned with k = {} but was written with k = {:?}",
                row.key,
                row.k,
                truth.k_of(&row.key)
            )
        } else {
            continue;
        };
        let found = violation(ViolationKind::Unsound, detail);
        return Verdict::fail(case, expected_count, fingerprint, found);
    }

    if rows.len() != expected_count {
        let detail = format!(
            "{} keys match before pagination; expected {} rows, got {}",
            expected.len(),
            expected_count,
            rows.len()
        );
        let found = violation(ViolationKind::CountMismatch, detail);
        return Verdict::fail(case, expected_count, fingerprint, found);
    }

    if let Some(order) = case.sort {
        // soundness guarantees every key resolves
        let ks: Vec<i64> = rows.iter().filter_map(|r| truth.k_of(&r.key)).collect();
        for (pos, pair) in ks.windows(2).enumerate() {
            if !order.allows(pair[0], pair[1]) {
                let detail = format!(
                    "k = {} follows k = {} at position {} in {} order",
                    pair[1],
                    pair[0],
                    pos + 1,
                    order.as_str()
                );
                let found = violation(ViolationKind::OrderBroken, detail);
                return Verdict::fail(case, expected_count, fingerprint, found);
            }
        }
    }

    Verdict::pass(case, expected_count, fingerprint)
}
