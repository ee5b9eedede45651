//! Row handles and field values
//!
//! A row is a cheap cloneable snapshot of one table record; the plan stores
//! one directly when a `WaitObject` header pins the wait condition to a
//! single object.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

/// A single field value of a row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Double(f64),
    Text(String),
    List(Vec<String>),
}

impl Value {
    /// Numeric view of the value, as fed to aggregation accumulators.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            Self::Text(_) | Self::List(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

/// A shared, immutable table record
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    key: String,
    fields: Arc<BTreeMap<String, Value>>,
}

impl Row {
    pub fn new(key: impl Into<String>, fields: BTreeMap<String, Value>) -> Self {
        Self {
            key: key.into(),
            fields: Arc::new(fields),
        }
    }

    /// The primary-key string that selects this row.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }
}
