//! In-process reference engine
//!
//! A small region-partitioned store that answers the harness's dialect the
//! way a distributed engine with index lookup pushdown would: matches are
//! found through the `k` index, fanned out to the regions owning each key,
//! merged, sorted, and paginated. It lets the harness run end to end with
//! no external database, and its `FaultMode`s reproduce classic pushdown
//! defects so the verifier can be shown to catch them.
//!
//! # Invariants
//!
//! - With `FaultMode::None`, results never depend on region layout
//! - Batched inserts are atomic
//! - All sessions share one catalog behind a mutex

mod dialect;
mod table;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub use dialect::{Dialect, Select, Statement};
pub use table::{FaultMode, Table};

use crate::dataset::Row;
use crate::sql::statements::{PrimaryKey, COLUMNS, PUSHDOWN_INDEX};
use crate::sql::{Connector, SqlConnection, SqlError, SqlResult, SqlRow, SqlValue};

const KNOWN_INDEXES: [&str; 3] = ["PRIMARY", PUSHDOWN_INDEX, "idx_uk"];

struct Shared {
    dialect: Dialect,
    fault: FaultMode,
    tables: Mutex<HashMap<String, Table>>,
}

/// Connector for the in-process engine. Cloning shares the same data.
#[derive(Clone)]
pub struct MemoryEngine {
    shared: Arc<Shared>,
}

impl MemoryEngine {
    pub fn new(fault: FaultMode) -> SqlResult<Self> {
        Ok(Self {
            shared: Arc::new(Shared {
                dialect: Dialect::new()?,
                fault,
                tables: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn fault(&self) -> FaultMode {
        self.shared.fault
    }

    /// Number of rows in `table`, if it exists
    pub fn row_count(&self, table: &str) -> SqlResult<Option<usize>> {
        Ok(self.shared.lock()?.get(table).map(Table::len))
    }

    /// Primary-key shape `table` was created with, if it exists
    pub fn primary_key(&self, table: &str) -> SqlResult<Option<PrimaryKey>> {
        Ok(self.shared.lock()?.get(table).map(Table::primary_key))
    }

    /// Number of regions `table` is split into, if it exists
    pub fn region_count(&self, table: &str) -> SqlResult<Option<usize>> {
        Ok(self.shared.lock()?.get(table).map(Table::region_count))
    }
}

impl Shared {
    fn lock(&self) -> SqlResult<MutexGuard<'_, HashMap<String, Table>>> {
        self.tables.lock().map_err(|_| SqlError::Poisoned)
    }
}

impl Connector for MemoryEngine {
    fn connect(&self) -> SqlResult<Box<dyn SqlConnection>> {
        Ok(Box::new(MemoryConnection {
            shared: Arc::clone(&self.shared),
        }))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

struct MemoryConnection {
    shared: Arc<Shared>,
}

fn arg_int(value: &SqlValue, column: &str) -> Result<i64, String> {
    value
        .as_int()
        .ok_or_else(|| format!("Incorrect integer value {} for column '{}'", value, column))
}

fn arg_text(value: &SqlValue, column: &str) -> Result<String, String> {
    value
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| format!("Incorrect string value {} for column '{}'", value, column))
}

fn rows_from_args(columns: &[usize], rows: usize, args: &[SqlValue]) -> Result<Vec<Row>, String> {
    let mut out = Vec::with_capacity(rows);
    for chunk in args.chunks(columns.len()).take(rows) {
        let mut row = Row {
            id: 0,
            id2: String::new(),
            k: 0,
            uk: 0,
            v1: 0,
            v2: String::new(),
        };
        for (value, col) in chunk.iter().zip(columns) {
            let name = COLUMNS[*col];
            match col {
                0 => row.id = arg_int(value, name)?,
                1 => row.id2 = arg_text(value, name)?,
                2 => row.k = arg_int(value, name)?,
                3 => row.uk = arg_int(value, name)?,
                4 => row.v1 = arg_int(value, name)?,
                _ => row.v2 = arg_text(value, name)?,
            }
        }
        out.push(row);
    }
    Ok(out)
}

impl MemoryConnection {
    fn run(&mut self, sql: &str, args: &[SqlValue]) -> SqlResult<(u64, Vec<SqlRow>)> {
        let statement = self.shared.dialect.parse(sql, args.len())?;
        let mut tables = self.shared.lock()?;
        let fail = |message: String| SqlError::execution(sql, message);

        match statement {
            Statement::Set => Ok((0, Vec::new())),
            Statement::DropTable { table, if_exists } => {
                if tables.remove(&table).is_none() && !if_exists {
                    return Err(fail(format!("Unknown table '{}'", table)));
                }
                Ok((0, Vec::new()))
            }
            Statement::CreateTable { table, primary_key } => {
                if tables.contains_key(&table) {
                    return Err(fail(format!("Table '{}' already exists", table)));
                }
                tables.insert(table, Table::with_primary_key(primary_key));
                Ok((0, Vec::new()))
            }
            Statement::Insert {
                table,
                columns,
                rows,
            } => {
                let target = tables
                    .get_mut(&table)
                    .ok_or_else(|| fail(format!("Table '{}' doesn't exist", table)))?;
                let rows = rows_from_args(&columns, rows, args).map_err(fail)?;
                let affected = target.insert_all(rows).map_err(fail)?;
                Ok((affected, Vec::new()))
            }
            Statement::Split {
                table,
                lower,
                upper,
                regions,
            } => {
                let target = tables
                    .get_mut(&table)
                    .ok_or_else(|| fail(format!("Table '{}' doesn't exist", table)))?;
                let added = target.split(&lower, &upper, regions).map_err(fail)?;
                Ok((added, Vec::new()))
            }
            Statement::Select(select) => {
                let target = tables
                    .get(&select.table)
                    .ok_or_else(|| fail(format!("Table '{}' doesn't exist", select.table)))?;
                if let Some(hint) = &select.hint {
                    if !KNOWN_INDEXES.iter().any(|i| i.eq_ignore_ascii_case(hint)) {
                        return Err(fail(format!(
                            "Key '{}' doesn't exist in table '{}'",
                            hint, select.table
                        )));
                    }
                }
                let rows = target
                    .select(&select, self.shared.fault)
                    .into_iter()
                    .map(|(key, k, uk, v1, v2)| {
                        let full = [
                            SqlValue::Int(key.id),
                            SqlValue::Text(key.id2),
                            SqlValue::Int(k),
                            SqlValue::Int(uk),
                            SqlValue::Int(v1),
                            SqlValue::Text(v2),
                        ];
                        SqlRow::new(select.projection.iter().map(|i| full[*i].clone()).collect())
                    })
                    .collect::<Vec<_>>();
                Ok((rows.len() as u64, rows))
            }
        }
    }
}

impl SqlConnection for MemoryConnection {
    fn execute(&mut self, statement: &str, args: &[SqlValue]) -> SqlResult<u64> {
        self.run(statement, args).map(|(affected, _)| affected)
    }

    fn query(&mut self, statement: &str, args: &[SqlValue]) -> SqlResult<Vec<SqlRow>> {
        self.run(statement, args).map(|(_, rows)| rows)
    }
}
