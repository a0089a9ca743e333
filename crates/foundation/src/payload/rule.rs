//! Rule payload

use std::fmt;

use serde::{Deserialize, Serialize};

/// The literal a rule compares evidence against.
///
/// Serialized as the bare JSON scalar. Integral JSON numbers decode as
/// [`RuleValue::Integer`], everything else numeric as [`RuleValue::Decimal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl RuleValue {
    /// Convert a JSON scalar. Returns `None` for null, arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(RuleValue::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(RuleValue::Integer(i)),
                None => n.as_f64().map(RuleValue::Decimal),
            },
            serde_json::Value::String(s) => Some(RuleValue::Text(s.clone())),
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }

    /// Numeric view, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RuleValue::Integer(i) => Some(*i as f64),
            RuleValue::Decimal(d) => Some(*d),
            RuleValue::Boolean(_) | RuleValue::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleValue::Boolean(b) => write!(f, "{b}"),
            RuleValue::Integer(i) => write!(f, "{i}"),
            RuleValue::Decimal(d) => write!(f, "{d}"),
            RuleValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Compiled rule: `evidence[input] <operator> value`.
///
/// The operator is kept as written; the runtime decides which operators it
/// supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRule {
    pub input: String,
    pub operator: String,
    pub value: RuleValue,
    pub rule_type: String,
}
