//! Evidence
//!
//! Named input values a rule is evaluated against. An [`EvidenceContext`]
//! is built once per evaluation request and never mutated afterwards.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};

/// A single evidence value.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceValue {
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Text(String),
}

impl EvidenceValue {
    /// Convert a JSON scalar. Null, arrays and objects are rejected.
    pub fn from_json(field: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(EvidenceValue::Boolean(*b)),
            Value::String(s) => Ok(EvidenceValue::Text(s.clone())),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(EvidenceValue::Integer(i)),
                None => n.as_f64().map(EvidenceValue::Decimal).ok_or_else(|| {
                    Error::InvalidEvidenceValue {
                        field: field.to_string(),
                        value: value.to_string(),
                    }
                }),
            },
            Value::Null | Value::Array(_) | Value::Object(_) => Err(Error::InvalidEvidenceValue {
                field: field.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EvidenceValue::Integer(i) => Some(*i as f64),
            EvidenceValue::Decimal(d) => Some(*d),
            EvidenceValue::Boolean(_) | EvidenceValue::Text(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            EvidenceValue::Integer(_) => "integer",
            EvidenceValue::Decimal(_) => "decimal",
            EvidenceValue::Boolean(_) => "boolean",
            EvidenceValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for EvidenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvidenceValue::Integer(i) => write!(f, "{i}"),
            EvidenceValue::Decimal(d) => write!(f, "{d}"),
            EvidenceValue::Boolean(b) => write!(f, "{b}"),
            EvidenceValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for EvidenceValue {
    fn from(v: i64) -> Self {
        EvidenceValue::Integer(v)
    }
}

impl From<i32> for EvidenceValue {
    fn from(v: i32) -> Self {
        EvidenceValue::Integer(v.into())
    }
}

impl From<f64> for EvidenceValue {
    fn from(v: f64) -> Self {
        EvidenceValue::Decimal(v)
    }
}

impl From<bool> for EvidenceValue {
    fn from(v: bool) -> Self {
        EvidenceValue::Boolean(v)
    }
}

impl From<&str> for EvidenceValue {
    fn from(v: &str) -> Self {
        EvidenceValue::Text(v.to_string())
    }
}

impl From<String> for EvidenceValue {
    fn from(v: String) -> Self {
        EvidenceValue::Text(v)
    }
}

/// Where rules read their inputs from.
pub trait EvidenceSource {
    fn get(&self, field: &str) -> Option<&EvidenceValue>;
}

/// Immutable evidence snapshot for one evaluation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceContext {
    values: HashMap<String, EvidenceValue>,
}

impl EvidenceContext {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a JSON object of scalar values.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| Error::InvalidEvidenceValue {
            field: "<root>".to_string(),
            value: value.to_string(),
        })?;
        object
            .iter()
            .map(|(field, value)| EvidenceValue::from_json(field, value).map(|v| (field.clone(), v)))
            .collect()
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|source| Error::InvalidEntry {
            path: "<evidence>".to_string(),
            source,
        })?;
        Self::from_json(&value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }
}

impl EvidenceSource for EvidenceContext {
    fn get(&self, field: &str) -> Option<&EvidenceValue> {
        self.values.get(field)
    }
}

impl<K: Into<String>, V: Into<EvidenceValue>> FromIterator<(K, V)> for EvidenceContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
