//! Run phases
//!
//! `Seed -> (Split -> Settle -> Verify) per layout -> Compare -> Done`.
//! Layouts are referenced by position in the configured list.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seed,
    Split(usize),
    Settle(usize),
    Verify(usize),
    Compare,
    Done,
}

impl Phase {
    /// Successor of a phase that completed normally
    pub fn next(self, layouts: usize) -> Phase {
        match self {
            Phase::Seed if layouts == 0 => Phase::Compare,
            Phase::Seed => Phase::Split(0),
            Phase::Split(i) => Phase::Settle(i),
            Phase::Settle(i) => Phase::Verify(i),
            Phase::Verify(i) if i + 1 < layouts => Phase::Split(i + 1),
            Phase::Verify(_) => Phase::Compare,
            Phase::Compare | Phase::Done => Phase::Done,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Seed => write!(f, "seed"),
            Phase::Split(i) => write!(f, "split[{}]", i),
            Phase::Settle(i) => write!(f, "settle[{}]", i),
            Phase::Verify(i) => write!(f, "verify[{}]", i),
            Phase::Compare => write!(f, "compare"),
            Phase::Done => write!(f, "done"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_layout_sequence() {
        let mut phase = Phase::Seed;
        let mut seen = vec![phase];
        while phase != Phase::Done {
            phase = phase.next(2);
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                Phase::Seed,
                Phase::Split(0),
                Phase::Settle(0),
                Phase::Verify(0),
                Phase::Split(1),
                Phase::Settle(1),
                Phase::Verify(1),
                Phase::Compare,
                Phase::Done,
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Phase::Verify(1).to_string(), "verify[1]");
    }
}
