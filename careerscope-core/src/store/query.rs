//! Backend-neutral read queries.
//!
//! A [`Query`] names a table, a column projection and a conjunction of
//! filters. Backends translate it to a PostgREST URL or to SQL.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Tables the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Achievements,
    DailyWins,
    Profiles,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Achievements => "achievements",
            Table::DailyWins => "daily_wins",
            Table::Profiles => "profiles",
        }
    }
}

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
}

impl FilterOp {
    /// PostgREST operator prefix
    pub fn postgrest(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gte => "gte",
        }
    }

    /// SQL comparison operator
    pub fn sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gte => ">=",
        }
    }
}

/// Right-hand side of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl FilterValue {
    /// Canonical text form, shared by every backend.
    ///
    /// Timestamps are fixed-width RFC 3339 in UTC so that text comparison
    /// agrees with chronological order.
    pub fn to_text(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Timestamp(ts) => format_timestamp(ts),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(ts: DateTime<Utc>) -> Self {
        FilterValue::Timestamp(ts)
    }
}

/// Format a timestamp the way rows and filters store it.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// One `column <op> value` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

/// A read query against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: Table,
    /// Projected columns; empty means all columns
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    /// Ask the backend for an exact row count
    pub count: bool,
    /// Return the count only, without rows
    pub head: bool,
}

impl Query {
    /// Start a query selecting every column of `table`.
    pub fn table(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filters: Vec::new(),
            count: false,
            head: false,
        }
    }

    /// Project a comma-separated list of columns (`"*"` keeps all).
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "*")
            .map(str::to_string)
            .collect();
        self
    }

    pub fn eq(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(column, FilterOp::Eq, value.into())
    }

    pub fn gte(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(column, FilterOp::Gte, value.into())
    }

    /// Request an exact count alongside the rows.
    pub fn count_exact(mut self) -> Self {
        self.count = true;
        self
    }

    /// Request an exact count and no rows.
    pub fn head(mut self) -> Self {
        self.count = true;
        self.head = true;
        self
    }

    fn filter(mut self, column: &str, op: FilterOp, value: FilterValue) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op,
            value,
        });
        self
    }

    /// Projection as sent to the backend.
    pub fn projection(&self) -> String {
        if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        }
    }

    /// Reject column names that are not plain identifiers.
    pub fn validate(&self) -> Result<()> {
        let names = self
            .columns
            .iter()
            .chain(self.filters.iter().map(|f| &f.column));
        for name in names {
            if !is_identifier(name) {
                return Err(Error::Query(format!(
                    "'{}' is not a valid column name on {}",
                    name,
                    self.table.as_str()
                )));
            }
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Rows and optional count returned by a backend.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Each row is a JSON object keyed by column name
    pub rows: Vec<serde_json::Value>,
    /// Exact count, when requested
    pub count: Option<u64>,
}

impl QueryResult {
    /// Deserialize every row.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        self.rows
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(Error::from))
            .collect()
    }

    /// Requested count, or zero if the backend returned none.
    pub fn count_or_zero(&self) -> u64 {
        self.count.unwrap_or(0)
    }
}
