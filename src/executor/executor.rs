//! Runs cases against the system under test
//!
//! One connection is opened per executor and reused for every case, so all
//! verification queries of a phase share a single session.

use serde::Serialize;

use crate::cases::Case;
use crate::dataset::CompositeKey;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::sql::statements;
use crate::sql::{Connector, SqlConnection, SqlRow};

use super::errors::{ExecutorError, ExecutorResult};
use super::query::QueryBuilder;

/// One row exactly as the system under test returned it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveRow {
    pub key: CompositeKey,
    pub k: i64,
    pub uk: i64,
    pub v1: i64,
    pub v2: String,
}

impl LiveRow {
    /// Decodes a row projected in `COLUMNS` order
    pub fn decode(row: &SqlRow) -> crate::sql::SqlResult<Self> {
        Ok(Self {
            key: CompositeKey::new(row.int(0)?, row.text(1)?),
            k: row.int(2)?,
            uk: row.int(3)?,
            v1: row.int(4)?,
            v2: row.text(5)?,
        })
    }
}

/// Executes cases over a single reused session
pub struct QueryExecutor<'a> {
    conn: Box<dyn SqlConnection>,
    table: String,
    metrics: &'a MetricsRegistry,
}

impl<'a> QueryExecutor<'a> {
    /// Opens the session and applies the session alias, if any
    pub fn connect(
        connector: &dyn Connector,
        table: &str,
        session_alias: Option<&str>,
        metrics: &'a MetricsRegistry,
    ) -> ExecutorResult<Self> {
        let mut conn = connector.connect().map_err(ExecutorError::connect_failed)?;
        if let Some(alias) = session_alias {
            conn.execute(&statements::session_alias(alias), &[])
                .map_err(ExecutorError::connect_failed)?;
            metrics.increment_statements();
        }
        Ok(Self {
            conn,
            table: table.to_string(),
            metrics,
        })
    }

    /// Runs one case and returns its rows in received order
    pub fn run(&mut self, case: &Case) -> ExecutorResult<Vec<LiveRow>> {
        let sql = QueryBuilder::select(&self.table, case);
        let rows = self
            .conn
            .query(&sql, &[])
            .map_err(|e| ExecutorError::query_failed(&case.id, e))?;

        let live = rows
            .iter()
            .map(LiveRow::decode)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ExecutorError::decode_failed(&case.id, e))?;

        self.metrics.record_query(live.len() as u64);
        let returned = live.len().to_string();
        log_event_with_fields(
            Event::CaseExecuted,
            &[("case", case.id.as_str()), ("rows", returned.as_str()), ("sql", sql.as_str())],
        );
        Ok(live)
    }
}
