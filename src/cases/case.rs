//! Case structures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Predicate on the indexed column `k`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// `k = value`
    Equality(i64),
    /// `k >= low AND k < high`
    Range { low: i64, high: i64 },
    /// `k IN (...)`; the synthesizer emits it strictly increasing
    Membership(Vec<i64>),
}

impl Predicate {
    /// True if a row with this `k` satisfies the predicate
    pub fn matches(&self, k: i64) -> bool {
        match self {
            Predicate::Equality(v) => k == *v,
            Predicate::Range { low, high } => k >= *low && k < *high,
            Predicate::Membership(list) => list.contains(&k),
        }
    }

    /// Shape name for logs
    pub fn shape(&self) -> &'static str {
        match self {
            Predicate::Equality(_) => "equality",
            Predicate::Range { .. } => "range",
            Predicate::Membership(_) => "membership",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equality(k) => write!(f, "k = {}", k),
            Predicate::Range { low, high } => write!(f, "k >= {} AND k < {}", low, high),
            Predicate::Membership(list) => {
                let items: Vec<String> = list.iter().map(i64::to_string).collect();
                write!(f, "k IN ({})", items.join(","))
            }
        }
    }
}

/// Sort direction on `k`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    /// True if `next` may follow `prev` under this order
    pub fn allows(&self, prev: i64, next: i64) -> bool {
        match self {
            SortOrder::Ascending => prev <= next,
            SortOrder::Descending => prev >= next,
        }
    }
}

/// Row-window applied after the predicate.
///
/// An offset only exists together with a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    #[default]
    None,
    Limit(u64),
    LimitOffset { limit: u64, skip: u64 },
}

impl Pagination {
    pub fn limit(&self) -> Option<u64> {
        match self {
            Pagination::None => None,
            Pagination::Limit(l) | Pagination::LimitOffset { limit: l, .. } => Some(*l),
        }
    }

    pub fn skip(&self) -> Option<u64> {
        match self {
            Pagination::LimitOffset { skip, .. } => Some(*skip),
            _ => None,
        }
    }

    /// Rows a correct engine returns when `matched` rows satisfy the predicate
    pub fn expected_count(&self, matched: usize) -> usize {
        let matched = matched as u64;
        let remaining = matched.saturating_sub(self.skip().unwrap_or(0));
        let count = match self.limit() {
            Some(limit) => remaining.min(limit),
            None => remaining,
        };
        count as usize
    }

    pub fn is_paginated(&self) -> bool {
        !matches!(self, Pagination::None)
    }
}

/// One randomized query specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    /// Stable identifier within a batch
    pub id: String,
    pub predicate: Predicate,
    pub sort: Option<SortOrder>,
    pub pagination: Pagination,
}

impl Case {
    pub fn new(
        index: usize,
        predicate: Predicate,
        sort: Option<SortOrder>,
        pagination: Pagination,
    ) -> Self {
        Self {
            id: format!("case-{:04}", index),
            predicate,
            sort,
            pagination,
        }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.predicate)?;
        if let Some(sort) = self.sort {
            write!(f, " sort={}", sort.as_str())?;
        }
        if let Some(limit) = self.pagination.limit() {
            write!(f, " limit={}", limit)?;
        }
        if let Some(skip) = self.pagination.skip() {
            write!(f, " skip={}", skip)?;
        }
        Ok(())
    }
}
