//! Statement execution
//!
//! The engine never talks to the network itself. It hands statement text and bound parameters to
//! a [`StatementExecutor`] connected to the cluster member that takes writes, and reads back plain
//! rows. Replication to the other members is the cluster's business.
//!
//! Implementations:
//! - [`InMemoryCluster`]: in-process account catalog understanding the statements this crate
//!   emits. Used for tests and previews without a server.
//! - [`SqlxExecutor`] (feature `mysql`): one live MySQL connection through sqlx.

pub mod errors;
pub mod in_memory;
#[cfg(feature = "mysql")]
pub mod mysql;

use std::fmt;

pub use errors::ExecutorError;
pub use in_memory::InMemoryCluster;
#[cfg(feature = "mysql")]
pub use mysql::SqlxExecutor;

/// A scalar exchanged with the executor, either as a bound parameter or a column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    UInt(u64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Non-negative integers, including numeric text as some drivers return it.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            Value::Int(n) => u64::try_from(*n).ok(),
            Value::Text(text) => text.trim().parse().ok(),
            Value::Null => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(n) => write!(f, "{n}"),
            Value::UInt(n) => write!(f, "{n}"),
            Value::Text(text) => write!(f, "{text:?}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

static NULL: Value = Value::Null;

/// One result row, columns in select-list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Column by position; `Null` when out of range.
    pub fn get(&self, index: usize) -> &Value {
        self.0.get(index).unwrap_or(&NULL)
    }

    /// Text column by position, if it holds text.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.get(index).as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// Synchronous request/response access to one cluster member.
///
/// Reads pass their values as `params` (`?` placeholders). Account management statements arrive
/// fully rendered with `params` empty, since the server does not accept placeholders there.
/// Calls block the caller until the server answers; there is no timeout beyond the connection's
/// own.
pub trait StatementExecutor {
    /// Execute one statement and return its rows (empty for statements without a result set).
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ExecutorError>;
}

impl<T: StatementExecutor + ?Sized> StatementExecutor for &T {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ExecutorError> {
        (**self).execute(sql, params)
    }
}

impl<T: StatementExecutor + ?Sized> StatementExecutor for Box<T> {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ExecutorError> {
        (**self).execute(sql, params)
    }
}
