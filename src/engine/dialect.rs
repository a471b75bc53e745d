//! The statement dialect the reference engine accepts
//!
//! Exactly what the harness emits and nothing more. Anything else is
//! rejected as unsupported rather than guessed at.

use regex::{Regex, RegexBuilder};

use crate::cases::{Predicate, SortOrder};
use crate::dataset::CompositeKey;
use crate::sql::statements::{PrimaryKey, COLUMNS};
use crate::sql::{SqlError, SqlResult};

/// Parsed statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Session variables; accepted and ignored
    Set,
    DropTable {
        table: String,
        if_exists: bool,
    },
    CreateTable {
        table: String,
        primary_key: PrimaryKey,
    },
    Insert {
        table: String,
        /// Column positions into `COLUMNS`, in statement order
        columns: Vec<usize>,
        rows: usize,
    },
    Split {
        table: String,
        lower: CompositeKey,
        upper: CompositeKey,
        regions: u32,
    },
    Select(Select),
}

/// Parsed SELECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub table: String,
    /// Index named by the `use_index` hint, if any
    pub hint: Option<String>,
    /// Column positions into `COLUMNS`
    pub projection: Vec<usize>,
    pub filter: Option<Predicate>,
    pub order: Option<SortOrder>,
    pub skip: u64,
    pub limit: Option<u64>,
}

/// Compiled patterns for every statement shape
#[derive(Debug)]
pub struct Dialect {
    set: Regex,
    drop: Regex,
    create: Regex,
    primary_key: Regex,
    insert: Regex,
    placeholder_group: Regex,
    split: Regex,
    select: Regex,
    eq: Regex,
    range: Regex,
    membership: Regex,
}

fn pattern(source: &str) -> SqlResult<Regex> {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| SqlError::Unsupported(format!("dialect pattern failed to compile: {}", e)))
}

fn parse_int(text: &str, what: &str) -> SqlResult<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| SqlError::Unsupported(format!("{} is not an integer: {}", what, text)))
}

fn column_positions(list: &str) -> SqlResult<Vec<usize>> {
    if list.trim() == "*" {
        return Ok((0..COLUMNS.len()).collect());
    }
    list.split(',')
        .map(|name| {
            let name = name.trim();
            COLUMNS
                .iter()
                .position(|c| c.eq_ignore_ascii_case(name))
                .ok_or_else(|| SqlError::Unsupported(format!("unknown column {}", name)))
        })
        .collect()
}

impl Dialect {
    pub fn new() -> SqlResult<Self> {
        Ok(Self {
            set: pattern(r"^\s*SET\s")?,
            drop: pattern(r"^\s*DROP\s+TABLE\s+(IF\s+EXISTS\s+)?(\w+)\s*$")?,
            create: pattern(r"^\s*CREATE\s+TABLE\s+(\w+)\s*\(")?,
            primary_key: pattern(r"PRIMARY\s+KEY\s*\(([^)]*)\)")?,
            insert: pattern(r"^\s*INSERT\s+INTO\s+(\w+)\s*\(([^)]*)\)\s*VALUES\s*(.*?)\s*$")?,
            placeholder_group: pattern(r"\(\s*\?(?:\s*,\s*\?)*\s*\)")?,
            split: pattern(concat!(
                r"^\s*SPLIT\s+TABLE\s+(\w+)\s+",
                r"BETWEEN\s*\(\s*(-?\d+)\s*(?:,\s*'([^']*)'\s*)?\)\s*",
                r"AND\s*\(\s*(-?\d+)\s*(?:,\s*'([^']*)'\s*)?\)\s*",
                r"REGIONS\s+(\d+)\s*$",
            ))?,
            // Groups: 1 hint, 2 projection, 3 table, 4 filter, 5 order clause,
            // 6 direction, 7 and 8 limit
            select: pattern(concat!(
                r"^\s*SELECT\s+(?:/\*\+\s*use_index\(\s*\w+\s*,\s*(\w+)\s*\)\s*\*/\s*)?",
                r"(.+?)\s+FROM\s+(\w+)",
                r"(?:\s+WHERE\s+(.+?))?",
                r"(\s+ORDER\s+BY\s+k(?:\s+(ASC|DESC))?)?",
                r"(?:\s+LIMIT\s+(\d+)(?:\s*,\s*(\d+))?)?\s*$",
            ))?,
            eq: pattern(r"^\s*k\s*=\s*(-?\d+)\s*$")?,
            range: pattern(r"^\s*k\s*>=\s*(-?\d+)\s+AND\s+k\s*<\s*(-?\d+)\s*$")?,
            membership: pattern(r"^\s*k\s+IN\s*\(([^)]*)\)\s*$")?,
        })
    }

    /// Parses one statement. `arg_count` is the number of bound arguments.
    pub fn parse(&self, sql: &str, arg_count: usize) -> SqlResult<Statement> {
        if self.set.is_match(sql) {
            return Ok(Statement::Set);
        }
        if let Some(c) = self.drop.captures(sql) {
            return Ok(Statement::DropTable {
                table: c[2].to_string(),
                if_exists: c.get(1).is_some(),
            });
        }
        if let Some(c) = self.create.captures(sql) {
            return Ok(Statement::CreateTable {
                table: c[1].to_string(),
                primary_key: self.parse_primary_key(sql)?,
            });
        }
        if let Some(c) = self.insert.captures(sql) {
            return self.parse_insert(&c[1], &c[2], &c[3], arg_count);
        }
        if let Some(c) = self.split.captures(sql) {
            let regions: u32 = c[6]
                .parse()
                .map_err(|_| SqlError::Unsupported(format!("bad region count {}", &c[6])))?;
            return Ok(Statement::Split {
                table: c[1].to_string(),
                // A single-column bound `(n)` sorts before every `(n, id2)`
                lower: CompositeKey::new(
                    parse_int(&c[2], "lower bound")?,
                    c.get(3).map_or("", |m| m.as_str()),
                ),
                upper: CompositeKey::new(
                    parse_int(&c[4], "upper bound")?,
                    c.get(5).map_or("", |m| m.as_str()),
                ),
                regions,
            });
        }
        if let Some(c) = self.select.captures(sql) {
            let filter = match c.get(4) {
                Some(m) => Some(self.parse_filter(m.as_str())?),
                None => None,
            };
            // A bare ORDER BY k is ascending
            let order = c.get(5).map(|_| match c.get(6) {
                Some(m) if m.as_str().eq_ignore_ascii_case("desc") => SortOrder::Descending,
                _ => SortOrder::Ascending,
            });
            // MySQL form: LIMIT <limit> or LIMIT <skip>, <limit>
            let (skip, limit) = match (c.get(7), c.get(8)) {
                (Some(a), Some(b)) => (
                    parse_int(a.as_str(), "offset")? as u64,
                    Some(parse_int(b.as_str(), "limit")? as u64),
                ),
                (Some(a), None) => (0, Some(parse_int(a.as_str(), "limit")? as u64)),
                _ => (0, None),
            };
            return Ok(Statement::Select(Select {
                table: c[3].to_string(),
                hint: c.get(1).map(|m| m.as_str().to_string()),
                projection: column_positions(&c[2])?,
                filter,
                order,
                skip,
                limit,
            }));
        }
        Err(SqlError::Unsupported(sql.chars().take(80).collect()))
    }

    fn parse_primary_key(&self, sql: &str) -> SqlResult<PrimaryKey> {
        let Some(c) = self.primary_key.captures(sql) else {
            return Err(SqlError::Unsupported("CREATE TABLE without a primary key".to_string()));
        };
        let columns = column_positions(&c[1])?;
        match columns.as_slice() {
            [0] => Ok(PrimaryKey::Single),
            [0, 1] => Ok(PrimaryKey::Composite),
            _ => Err(SqlError::Unsupported(format!("PRIMARY KEY ({})", &c[1]))),
        }
    }

    fn parse_insert(
        &self,
        table: &str,
        columns: &str,
        values: &str,
        arg_count: usize,
    ) -> SqlResult<Statement> {
        let columns = column_positions(columns)?;
        if columns.len() != COLUMNS.len() {
            return Err(SqlError::Unsupported(
                "INSERT must name every column".to_string(),
            ));
        }
        let groups = self.placeholder_group.find_iter(values).count();
        let stripped = self.placeholder_group.replace_all(values, "");
        if groups == 0 || stripped.chars().any(|c| c != ',' && !c.is_whitespace()) {
            return Err(SqlError::Unsupported(
                "INSERT values must be placeholder groups".to_string(),
            ));
        }
        if groups * columns.len() != arg_count {
            return Err(SqlError::Unsupported(format!(
                "INSERT expects {} arguments, got {}",
                groups * columns.len(),
                arg_count
            )));
        }
        Ok(Statement::Insert {
            table: table.to_string(),
            columns,
            rows: groups,
        })
    }

    fn parse_filter(&self, text: &str) -> SqlResult<Predicate> {
        if let Some(c) = self.eq.captures(text) {
            return Ok(Predicate::Equality(parse_int(&c[1], "k")?));
        }
        if let Some(c) = self.range.captures(text) {
            return Ok(Predicate::Range {
                low: parse_int(&c[1], "lower bound")?,
                high: parse_int(&c[2], "upper bound")?,
            });
        }
        if let Some(c) = self.membership.captures(text) {
            let mut list = c[1]
                .split(',')
                .map(|v| parse_int(v, "IN member"))
                .collect::<SqlResult<Vec<i64>>>()?;
            list.sort_unstable();
            list.dedup();
            return Ok(Predicate::Membership(list));
        }
        Err(SqlError::Unsupported(format!("WHERE {}", text)))
    }
}
