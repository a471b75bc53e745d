//! Case synthesis
//!
//! A case is one predicate shape plus optional sort and pagination. Cases
//! are a pure function of a seeded random source: they never look at the
//! live system or the ground truth, and one batch is reused across every
//! physical layout of a run.

mod case;
mod synthesizer;

pub use case::{Case, Pagination, Predicate, SortOrder};
pub use synthesizer::{CaseSynthesizer, SynthesisBounds};
