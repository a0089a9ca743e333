//! Ruleset payload: a boolean expression tree over rule references

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::VersionedId;

/// Logical connectives allowed in a ruleset expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AND" => Some(LogicalOperator::And),
            "OR" => Some(LogicalOperator::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("AND"),
            LogicalOperator::Or => f.write_str("OR"),
        }
    }
}

/// A ruleset expression node.
///
/// The tree is finite by construction: the compiler only ever recurses into
/// strictly nested sub-documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "camelCase")]
pub enum RulesetExpression {
    /// Leaf: a reference to a compiled rule.
    #[serde(rename_all = "camelCase")]
    RuleRef { rule_id: String, version: u32 },
    /// Internal node: an operator over a non-empty ordered operand list.
    Logical {
        operator: LogicalOperator,
        operands: Vec<RulesetExpression>,
    },
}

impl RulesetExpression {
    pub fn rule_ref(rule_id: impl Into<String>, version: u32) -> Self {
        RulesetExpression::RuleRef {
            rule_id: rule_id.into(),
            version,
        }
    }

    pub fn logical(operator: LogicalOperator, operands: Vec<RulesetExpression>) -> Self {
        RulesetExpression::Logical { operator, operands }
    }

    /// Every rule referenced by the tree, distinct, in first-seen
    /// depth-first order.
    pub fn rule_refs(&self) -> Vec<VersionedId> {
        let mut refs = Vec::new();
        self.collect_rule_refs(&mut refs);
        refs
    }

    fn collect_rule_refs(&self, out: &mut Vec<VersionedId>) {
        match self {
            RulesetExpression::RuleRef { rule_id, version } => {
                let reference = VersionedId::new(rule_id.clone(), *version);
                if !out.contains(&reference) {
                    out.push(reference);
                }
            }
            RulesetExpression::Logical { operands, .. } => {
                for operand in operands {
                    operand.collect_rule_refs(out);
                }
            }
        }
    }
}

/// Compiled ruleset: a single expression root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRuleset {
    pub root: RulesetExpression,
}
