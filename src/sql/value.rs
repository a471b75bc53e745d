//! Values and rows exchanged with the system under test

use std::fmt;

use super::errors::{SqlError, SqlResult};

/// A single column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Signed 64-bit integer
    Int(i64),
    /// Text
    Text(String),
}

impl SqlValue {
    /// Returns the integer, if this is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// One returned row, columns in select-list order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SqlRow {
    columns: Vec<SqlValue>,
}

impl SqlRow {
    /// Creates a row from its columns
    pub fn new(columns: Vec<SqlValue>) -> Self {
        Self { columns }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Raw column access
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.columns.get(index)
    }

    /// Integer column. Text that parses as an integer is accepted, since
    /// text-protocol drivers return every column as text.
    pub fn int(&self, index: usize) -> SqlResult<i64> {
        match self.columns.get(index) {
            Some(SqlValue::Int(v)) => Ok(*v),
            Some(SqlValue::Text(s)) => s.parse::<i64>().map_err(|_| {
                SqlError::Decode(format!("column {} is not an integer: {:?}", index, s))
            }),
            Some(SqlValue::Null) => Err(SqlError::Decode(format!("column {} is NULL", index))),
            None => Err(SqlError::Decode(format!("column {} missing", index))),
        }
    }

    /// Text column
    pub fn text(&self, index: usize) -> SqlResult<String> {
        match self.columns.get(index) {
            Some(SqlValue::Text(s)) => Ok(s.clone()),
            Some(SqlValue::Int(v)) => Ok(v.to_string()),
            Some(SqlValue::Null) => Err(SqlError::Decode(format!("column {} is NULL", index))),
            None => Err(SqlError::Decode(format!("column {} missing", index))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_accepts_numeric_text() {
        let row = SqlRow::new(vec![SqlValue::Text("42".into()), SqlValue::Int(7)]);
        assert_eq!(row.int(0).unwrap(), 42);
        assert_eq!(row.int(1).unwrap(), 7);
    }

    #[test]
    fn test_decode_failures() {
        let row = SqlRow::new(vec![SqlValue::Null, SqlValue::Text("abc".into())]);
        assert!(matches!(row.int(0), Err(SqlError::Decode(_))));
        assert!(matches!(row.int(1), Err(SqlError::Decode(_))));
        assert!(matches!(row.text(5), Err(SqlError::Decode(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(SqlValue::from(5).to_string(), "5");
        assert_eq!(SqlValue::from("ab").to_string(), "'ab'");
        assert_eq!(SqlValue::Null.to_string(), "NULL");
    }
}
