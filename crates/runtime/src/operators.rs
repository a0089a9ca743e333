//! Rule comparison operators
//!
//! `>`, `<`, `>=`, `<=` compare numerically; both sides must be numbers.
//! `==` and `!=` compare by value: numbers numerically across integer and
//! decimal, strings and booleans exactly, anything else as unequal.

use banyan_foundation::RuleValue;

use crate::error::{Error, Result};
use crate::evidence::EvidenceValue;

/// The operators the runtime evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl Operator {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Ge),
            "<=" => Ok(Operator::Le),
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            other => Err(Error::UnsupportedOperator(other.to_string())),
        }
    }

    /// Apply `actual <op> expected` for evidence field `field`.
    pub fn apply(self, field: &str, actual: &EvidenceValue, expected: &RuleValue) -> Result<bool> {
        match self {
            Operator::Eq => Ok(values_equal(actual, expected)),
            Operator::Ne => Ok(!values_equal(actual, expected)),
            Operator::Gt | Operator::Lt | Operator::Ge | Operator::Le => {
                let (a, b) = numeric_pair(field, actual, expected)?;
                Ok(match self {
                    Operator::Gt => a > b,
                    Operator::Lt => a < b,
                    Operator::Ge => a >= b,
                    _ => a <= b,
                })
            }
        }
    }
}

fn numeric_pair(field: &str, actual: &EvidenceValue, expected: &RuleValue) -> Result<(f64, f64)> {
    let a = actual.as_f64().ok_or_else(|| Error::InvalidEvidenceType {
        field: field.to_string(),
        message: format!("expected a number, got {} {actual}", actual.type_name()),
    })?;
    let b = expected.as_f64().ok_or_else(|| Error::InvalidEvidenceType {
        field: field.to_string(),
        message: format!("rule compares against non-numeric {expected}"),
    })?;
    Ok((a, b))
}

fn values_equal(actual: &EvidenceValue, expected: &RuleValue) -> bool {
    match (actual, expected) {
        (EvidenceValue::Integer(a), RuleValue::Integer(b)) => a == b,
        (EvidenceValue::Text(a), RuleValue::Text(b)) => a == b,
        (EvidenceValue::Boolean(a), RuleValue::Boolean(b)) => a == b,
        _ => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}
