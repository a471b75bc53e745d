//! Randomized case batches
//!
//! Each round draws one range start, one membership list and fresh
//! equality values, then emits every (shape, pagination) pair. Sort is
//! rotated so a single round already contains unsorted, ascending and
//! descending cases, and three rounds cover the full cross product.

use rand::Rng;

use super::case::{Case, Pagination, Predicate, SortOrder};

const SORTS: [Option<SortOrder>; 3] = [
    None,
    Some(SortOrder::Ascending),
    Some(SortOrder::Descending),
];

/// Value domains the synthesizer draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisBounds {
    /// `K`: indexed values live in `[1, K]`
    pub key_cardinality: i64,
    /// Equality targets reach `K + overshoot` so some buckets are empty
    pub equality_overshoot: i64,
    /// Range width is drawn from `[0, max_range_width)`
    pub max_range_width: i64,
    /// Membership lists hold `[1, max_membership_len]` values
    pub max_membership_len: usize,
    /// Consecutive membership values differ by `[1, max_membership_gap]`
    pub max_membership_gap: i64,
    /// Limits are drawn from `[1, max_limit]`
    pub max_limit: u64,
    /// Offsets are drawn from `[1, max_skip]`
    pub max_skip: u64,
}

impl SynthesisBounds {
    pub fn new(key_cardinality: i64) -> Self {
        Self {
            key_cardinality: key_cardinality.max(1),
            equality_overshoot: 10,
            max_range_width: 4,
            max_membership_len: 8,
            max_membership_gap: 4,
            max_limit: 128,
            max_skip: 64,
        }
    }
}

/// Produces fixed-size case batches from a random source
#[derive(Debug, Clone)]
pub struct CaseSynthesizer {
    bounds: SynthesisBounds,
}

impl CaseSynthesizer {
    pub fn new(bounds: SynthesisBounds) -> Self {
        Self { bounds }
    }

    /// Nine cases per round
    pub const CASES_PER_ROUND: usize = 9;

    /// Synthesizes `rounds` rounds of cases.
    pub fn synthesize<R: Rng + ?Sized>(&self, rng: &mut R, rounds: usize) -> Vec<Case> {
        let mut cases = Vec::with_capacity(rounds * Self::CASES_PER_ROUND);

        for round in 0..rounds {
            let range = self.range(rng);
            let membership = self.membership(rng);

            for shape in 0..3 {
                for page in 0..3 {
                    let predicate = match shape {
                        0 => Predicate::Equality(self.equality(rng)),
                        1 => range.clone(),
                        _ => membership.clone(),
                    };
                    let pagination = match page {
                        0 => Pagination::None,
                        1 => Pagination::Limit(self.limit(rng)),
                        _ => Pagination::LimitOffset {
                            limit: self.limit(rng),
                            skip: rng.gen_range(1..=self.bounds.max_skip),
                        },
                    };
                    let sort = SORTS[(round + shape + page) % SORTS.len()];
                    cases.push(Case::new(cases.len(), predicate, sort, pagination));
                }
            }
        }

        cases
    }

    fn equality<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        rng.gen_range(1..=self.bounds.key_cardinality + self.bounds.equality_overshoot)
    }

    fn limit<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.gen_range(1..=self.bounds.max_limit)
    }

    fn range<R: Rng + ?Sized>(&self, rng: &mut R) -> Predicate {
        let low = rng.gen_range(1..=self.bounds.key_cardinality);
        let width = rng.gen_range(0..self.bounds.max_range_width.max(1));
        Predicate::Range {
            low,
            high: low + width,
        }
    }

    // Sparse but strictly increasing; the first value may be 0, which
    // never holds rows.
    fn membership<R: Rng + ?Sized>(&self, rng: &mut R) -> Predicate {
        let len = rng.gen_range(1..=self.bounds.max_membership_len.max(1));
        let mut list = Vec::with_capacity(len);
        let mut current = rng.gen_range(0..self.bounds.key_cardinality);
        list.push(current);
        for _ in 1..len {
            current += rng.gen_range(1..=self.bounds.max_membership_gap.max(1));
            list.push(current);
        }
        Predicate::Membership(list)
    }
}
