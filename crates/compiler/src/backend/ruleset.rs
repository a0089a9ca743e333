//! Ruleset compiler
//!
//! Parses the expression tree from either an explicit `expression`
//! sub-document or the single-rule `ruleRef` shorthand:
//!
//! ```json
//! { "ruleRef": "r1" }
//! { "ruleRef": { "id": "r1", "version": 2 } }
//! { "expression": { "operator": "AND", "operands": [ { "ruleRef": "r1" }, { "ruleRef": "r2" } ] } }
//! ```
//!
//! Recursion only descends into strictly nested sub-documents, so the
//! resulting tree is finite.

use banyan_foundation::{
    ArtifactKind, ArtifactPayload, ArtifactReference, CompiledArtifact, CompiledRuleset,
    LogicalOperator, RulesetExpression, validate_id,
};
use serde_json::{Map, Value};

use super::{BackendCompiler, build_artifact, read_header, read_ref_version};
use crate::context::CompilationContext;
use crate::error::{CompilationError, Result};

const KIND: ArtifactKind = ArtifactKind::Ruleset;

pub struct RulesetCompiler;

impl BackendCompiler for RulesetCompiler {
    fn kind(&self) -> ArtifactKind {
        KIND
    }

    fn compile(&self, source: &Value, _ctx: &CompilationContext) -> Result<CompiledArtifact> {
        let header = read_header(KIND, source)?;
        let id = header.id;

        let root = match header.spec.get("expression") {
            Some(expression) => parse_expression(id, expression)?,
            None if header.spec.contains_key("ruleRef") => parse_node(id, header.spec)?,
            None => {
                return Err(invalid(id, "expected `expression` or `ruleRef`"));
            }
        };

        let dependencies = root
            .rule_refs()
            .into_iter()
            .map(|rule| ArtifactReference::new(ArtifactKind::Rule, rule.id, rule.version))
            .collect();

        let payload = ArtifactPayload::Ruleset(CompiledRuleset { root });
        Ok(build_artifact(source, &header, dependencies, payload))
    }
}

fn invalid(id: &str, message: impl Into<String>) -> CompilationError {
    CompilationError::InvalidExpression {
        id: id.to_string(),
        message: message.into(),
    }
}

fn parse_expression(id: &str, value: &Value) -> Result<RulesetExpression> {
    let node = value
        .as_object()
        .ok_or_else(|| invalid(id, format!("expression node must be an object, got {value}")))?;
    parse_node(id, node)
}

fn parse_node(id: &str, node: &Map<String, Value>) -> Result<RulesetExpression> {
    if let Some(reference) = node.get("ruleRef") {
        return parse_rule_ref(id, reference, node.get("version"));
    }

    let operator = node
        .get("operator")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(id, "node must be a `ruleRef` or an `operator`/`operands` pair"))?;
    let operator = LogicalOperator::parse(operator)
        .ok_or_else(|| invalid(id, format!("unknown logical operator `{operator}`")))?;

    let operands = node
        .get("operands")
        .and_then(Value::as_array)
        .filter(|operands| !operands.is_empty())
        .ok_or_else(|| invalid(id, format!("{operator} needs a non-empty `operands` array")))?;

    let operands = operands
        .iter()
        .map(|operand| parse_expression(id, operand))
        .collect::<Result<Vec<_>>>()?;

    Ok(RulesetExpression::logical(operator, operands))
}

/// `"r1"` (with an optional sibling `version`) or `{id, version}`.
fn parse_rule_ref(
    id: &str,
    reference: &Value,
    sibling_version: Option<&Value>,
) -> Result<RulesetExpression> {
    match reference {
        Value::String(rule_id) if !rule_id.is_empty() => {
            validate_id(rule_id).map_err(|err| invalid(id, format!("`ruleRef`: {err}")))?;
            let version = read_ref_version(KIND, id, "ruleRef", sibling_version)?;
            Ok(RulesetExpression::rule_ref(rule_id.clone(), version))
        }
        Value::Object(object) => {
            let rule_id = object
                .get("id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| invalid(id, "`ruleRef.id` must be a non-empty string"))?;
            validate_id(rule_id).map_err(|err| invalid(id, format!("`ruleRef.id`: {err}")))?;
            let version = read_ref_version(KIND, id, "ruleRef", object.get("version"))?;
            Ok(RulesetExpression::rule_ref(rule_id, version))
        }
        other => Err(invalid(id, format!("unsupported `ruleRef` {other}"))),
    }
}
