//! Statement text for everything the harness issues besides SELECT
//!
//! The schema is fixed apart from the clustered primary key, which is either
//! the two-column `(id, id2)` or `id` alone. The pushdown index `idx_k` is on
//! `k` and `uk` carries a unique index.

use serde::{Deserialize, Serialize};

/// Columns in insert and select-list order
pub const COLUMNS: [&str; 6] = ["id", "id2", "k", "uk", "v1", "v2"];

/// Name of the secondary index every query is hinted to use
pub const PUSHDOWN_INDEX: &str = "idx_k";

/// Shape of the clustered primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKey {
    /// `PRIMARY KEY (id, id2)`
    #[default]
    Composite,
    /// `PRIMARY KEY (id)`; `id2` is an ordinary column
    Single,
}

impl PrimaryKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryKey::Composite => "composite",
            PrimaryKey::Single => "single",
        }
    }

    /// Column list inside `PRIMARY KEY (...)`
    pub fn columns(&self) -> &'static str {
        match self {
            PrimaryKey::Composite => "id, id2",
            PrimaryKey::Single => "id",
        }
    }

    /// One split bound in this key's tuple form
    fn bound(&self, id: i64, id2: &str) -> String {
        match self {
            PrimaryKey::Composite => format!("({}, '{}')", id, id2.replace('\'', "''")),
            PrimaryKey::Single => format!("({})", id),
        }
    }
}

/// `DROP TABLE IF EXISTS <table>`
pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", table)
}

/// Full table definition
pub fn create_table(table: &str, primary_key: PrimaryKey) -> String {
    format!(
        "CREATE TABLE {} (\n\
         id bigint not null,\n\
         id2 varchar(64) COLLATE utf8mb4_general_ci not null,\n\
         k bigint,\n\
         uk bigint,\n\
         v1 bigint,\n\
         v2 varchar(255) not null,\n\
         PRIMARY KEY ({}) /*T![clustered_index] CLUSTERED */,\n\
         KEY {} (k),\n\
         UNIQUE KEY idx_uk (uk)\n\
         )",
        table,
        primary_key.columns(),
        PUSHDOWN_INDEX
    )
}

/// Multi-row insert with positional placeholders, six per row
pub fn insert_batch(table: &str, rows: usize) -> String {
    let mut sql = String::with_capacity(64 + rows * 22);
    sql.push_str("INSERT INTO ");
    sql.push_str(table);
    sql.push_str(" (");
    sql.push_str(&COLUMNS.join(", "));
    sql.push_str(") VALUES");
    for i in 0..rows {
        if i != 0 {
            sql.push(',');
        }
        sql.push_str(" (?, ?, ?, ?, ?, ?)");
    }
    sql
}

/// Region split directive over the primary key. A single-column key
/// ignores the `id2` half of each bound.
pub fn split_table(
    table: &str,
    primary_key: PrimaryKey,
    lower: (i64, &str),
    upper: (i64, &str),
    regions: u32,
) -> String {
    format!(
        "SPLIT TABLE {} BETWEEN {} AND {} REGIONS {}",
        table,
        primary_key.bound(lower.0, lower.1),
        primary_key.bound(upper.0, upper.1),
        regions
    )
}

/// Tags the session so its queries can be found in engine-side logs
pub fn session_alias(alias: &str) -> String {
    format!(
        "SET @@session.tidb_session_alias = '{}'",
        alias.replace('\'', "''")
    )
}
