//! Rows and composite keys

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sql::SqlValue;

/// Primary key `(id, id2)` as a structured pair.
///
/// Identity is the pair itself; the `+` form is display only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompositeKey {
    pub id: i64,
    pub id2: String,
}

impl CompositeKey {
    pub fn new(id: i64, id2: impl Into<String>) -> Self {
        Self {
            id,
            id2: id2.into(),
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.id, self.id2)
    }
}

/// One row of the table under test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: i64,
    pub id2: String,
    /// Pushdown-indexed column
    pub k: i64,
    /// Unique-indexed column
    pub uk: i64,
    pub v1: i64,
    pub v2: String,
}

impl Row {
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(self.id, self.id2.clone())
    }

    /// Appends this row's insert arguments in column order
    pub fn push_args(&self, out: &mut Vec<SqlValue>) {
        out.push(SqlValue::Int(self.id));
        out.push(SqlValue::Text(self.id2.clone()));
        out.push(SqlValue::Int(self.k));
        out.push(SqlValue::Int(self.uk));
        out.push(SqlValue::Int(self.v1));
        out.push(SqlValue::Text(self.v2.clone()));
    }
}

/// Random letters from a 50-symbol alphabet: `A-Z` then `b-y`.
pub fn random_id2<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| {
            let mut r: u8 = rng.gen_range(0..50);
            if r >= 26 {
                r += 7;
            }
            (b'A' + r) as char
        })
        .collect()
}
