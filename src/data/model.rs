use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// RawRow – one un-typed input row
// ---------------------------------------------------------------------------

/// One input row as read from the source: column_name → raw cell text.
pub type RawRow = BTreeMap<String, String>;

/// A raw table: ordered header plus rows keyed by header name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Value – a single typed cell
// ---------------------------------------------------------------------------

/// A typed cell after normalization.
///
/// `Missing` is the explicit absent value of a nullable numeric column; it
/// never stands in for a value that failed to parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Missing,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Missing => write!(f, "<missing>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one normalized row
// ---------------------------------------------------------------------------

/// One normalized observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Position of the source row in the loaded table.
    pub row: usize,
    /// Typed fields: column_name → value.
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(row: usize, fields: BTreeMap<String, Value>) -> Self {
        Self { row, fields }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Numeric value of `column`; `None` when absent, missing or not a number.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        self.get(column).and_then(Value::as_date)
    }
}
