//! Observable harness events
//!
//! Events are explicit and typed. Their string form is the `event` field
//! of the JSON log line.

use std::fmt;

use super::logger::Severity;

/// Observable events in a verification run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Run lifecycle
    /// Run begins, configuration resolved
    RunBegin,
    /// Run finished with every check passing
    RunComplete,
    /// Run finished with violations or aborted
    RunFailed,

    // Seeding
    /// Table dropped and recreated
    SchemaReset,
    /// Rows written so far
    SeedProgress,
    /// Ground truth merged after the join barrier
    GroundTruthReady,

    // Layout
    /// Region split directive accepted
    SplitApplied,
    /// Waiting for layout metadata to propagate
    SettleWait,

    // Verification
    /// Case executed and checked
    CaseExecuted,
    /// Case failed a correctness check
    CaseViolation,
    /// Same case answered differently under two layouts
    LayoutDivergence,
    /// Infrastructure failure; the run is over
    InfrastructureFailure,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RunBegin => "RUN_BEGIN",
            Event::RunComplete => "RUN_COMPLETE",
            Event::RunFailed => "RUN_FAILED",

            Event::SchemaReset => "SCHEMA_RESET",
            Event::SeedProgress => "SEED_PROGRESS",
            Event::GroundTruthReady => "GROUND_TRUTH_READY",

            Event::SplitApplied => "SPLIT_APPLIED",
            Event::SettleWait => "SETTLE_WAIT",

            Event::CaseExecuted => "CASE_EXECUTED",
            Event::CaseViolation => "CASE_VIOLATION",
            Event::LayoutDivergence => "LAYOUT_DIVERGENCE",
            Event::InfrastructureFailure => "INFRASTRUCTURE_FAILURE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::CaseExecuted => Severity::Trace,
            Event::CaseViolation | Event::LayoutDivergence | Event::RunFailed => Severity::Error,
            Event::InfrastructureFailure => Severity::Fatal,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
