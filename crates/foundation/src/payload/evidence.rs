//! Evidence type payload

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Value types an evidence field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvidenceValueType {
    Boolean,
    Integer,
    Decimal,
    String,
    Duration,
}

impl EvidenceValueType {
    pub const ALL: [EvidenceValueType; 5] = [
        EvidenceValueType::Boolean,
        EvidenceValueType::Integer,
        EvidenceValueType::Decimal,
        EvidenceValueType::String,
        EvidenceValueType::Duration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceValueType::Boolean => "BOOLEAN",
            EvidenceValueType::Integer => "INTEGER",
            EvidenceValueType::Decimal => "DECIMAL",
            EvidenceValueType::String => "STRING",
            EvidenceValueType::Duration => "DURATION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_str() == s)
    }
}

impl fmt::Display for EvidenceValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared field of an evidence type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceField {
    pub name: String,
    pub value_type: EvidenceValueType,
    pub required: bool,
}

/// Compiled evidence type: fields in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledEvidenceType {
    pub fields: IndexMap<String, EvidenceField>,
}

impl CompiledEvidenceType {
    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&EvidenceField> {
        self.fields.get(name)
    }

    /// Names of the required fields, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .values()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }
}
