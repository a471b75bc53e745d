//! Case to SQL rendering
//!
//! `Equality(k)` renders as `k = <k>`, `Range(lo, hi)` as
//! `k >= <lo> AND k < <hi>`, `Membership(list)` as `k IN (<list>)`.
//! Every query carries the `use_index` hint for the pushdown index so the
//! optimizer cannot pick a plan that bypasses it.

use crate::cases::{Case, Pagination, SortOrder};
use crate::sql::statements::{COLUMNS, PUSHDOWN_INDEX};

/// Renders cases into statements for one table
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn select(table: &str, case: &Case) -> String {
        let mut sql = format!(
            "select /*+ use_index({}, {}) */ {} from {} where {}",
            table,
            PUSHDOWN_INDEX,
            COLUMNS.join(", "),
            table,
            case.predicate
        );

        match case.sort {
            Some(SortOrder::Ascending) => sql.push_str(" order by k"),
            Some(SortOrder::Descending) => sql.push_str(" order by k desc"),
            None => {}
        }

        match case.pagination {
            Pagination::None => {}
            Pagination::Limit(limit) => sql.push_str(&format!(" limit {}", limit)),
            Pagination::LimitOffset { limit, skip } => {
                sql.push_str(&format!(" limit {}, {}", skip, limit))
            }
        }
        sql
    }
}
