//! Orchestrator
//!
//! Sequences one run as an explicit state machine:
//!
//! ```text
//! Seed -> Split(0) -> Settle(0) -> Verify(0) -> Split(1) -> ... -> Compare -> Done
//! ```
//!
//! The same case batch is verified under every layout. Splits only happen
//! between verification passes, never while a case is running.
//!
//! Infrastructure errors abort the run. Correctness violations either stop
//! it (`FailurePolicy::FailFast`) or are collected (`Accumulate`).

mod backend;
mod compare;
mod phase;
mod report;
mod runner;

pub use backend::open_backend;
pub use compare::compare_layouts;
pub use phase::Phase;
pub use report::{LayoutDivergence, PhaseReport, RunReport};
pub use runner::{synthesize_cases, Orchestrator};
