//! Verification outcomes

use std::fmt;

use serde::Serialize;

use super::fingerprint::ResultFingerprint;
use crate::cases::Case;

/// Which check a case failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Duplicate,
    Unsound,
    CountMismatch,
    OrderBroken,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Duplicate => "duplicate",
            ViolationKind::Unsound => "unsound",
            ViolationKind::CountMismatch => "count_mismatch",
            ViolationKind::OrderBroken => "order_broken",
        }
    }
}

/// A failed case with everything needed to reproduce and diagnose it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub case: Case,
    pub expected_count: usize,
    pub actual_count: usize,
    /// Every returned key, in received order
    pub keys: Vec<String>,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {} (expected {} rows, got {})",
            self.case,
            self.kind.as_str(),
            self.detail,
            self.expected_count,
            self.actual_count
        )
    }
}

/// Outcome of verifying one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub case_id: String,
    pub expected_count: usize,
    pub fingerprint: ResultFingerprint,
    pub violation: Option<Violation>,
}

impl Verdict {
    pub(super) fn pass(case: &Case, expected_count: usize, fingerprint: ResultFingerprint) -> Self {
        Self {
            case_id: case.id.clone(),
            expected_count,
            fingerprint,
            violation: None,
        }
    }

    pub(super) fn fail(
        case: &Case,
        expected_count: usize,
        fingerprint: ResultFingerprint,
        violation: Violation,
    ) -> Self {
        Self {
            case_id: case.id.clone(),
            expected_count,
            fingerprint,
            violation: Some(violation),
        }
    }

    pub fn passed(&self) -> bool {
        self.violation.is_none()
    }
}
