//! Per-kind semantic rules.

use std::collections::HashSet;

use banyan_foundation::{ActionTrigger, EvidenceValueType, LogicalOperator, TaskResultType};
use serde_json::{Map, Value};

use super::Validator;
use crate::source::SourceUnit;

const RULE_TYPES: [&str; 3] = ["THRESHOLD", "EQUALITY", "RANGE"];
const NUMERIC_OPERATORS: [&str; 6] = ["<", "<=", ">", ">=", "==", "!="];
const EQUALITY_OPERATORS: [&str; 2] = ["==", "!="];

/// The `spec` object, or the single message explaining why there is none.
fn spec_of(unit: &SourceUnit) -> Result<&Map<String, Value>, Vec<String>> {
    match unit.content.get("spec") {
        Some(Value::Object(spec)) if !spec.is_empty() => Ok(spec),
        _ => Err(vec!["`spec` must be a non-empty object".to_string()]),
    }
}

pub struct EvidenceTypeValidator;

impl Validator for EvidenceTypeValidator {
    fn validate(&self, unit: &SourceUnit) -> Vec<String> {
        let spec = match spec_of(unit) {
            Ok(spec) => spec,
            Err(errors) => return errors,
        };
        let Some(fields) = spec.get("fields").and_then(Value::as_array) else {
            return vec!["`fields` must be an array".to_string()];
        };

        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        let mut any_required = false;
        for field in fields {
            let name = field.get("name").and_then(Value::as_str).unwrap_or_default();
            if name.is_empty() {
                errors.push("every field needs a non-empty `name`".to_string());
            } else if !seen.insert(name) {
                errors.push(format!("duplicate field `{name}`"));
            }

            match field.get("type").and_then(Value::as_str) {
                Some(ty) if EvidenceValueType::parse(ty).is_some() => {}
                Some(ty) => errors.push(format!("field `{name}` has unknown type `{ty}`")),
                None => errors.push(format!("field `{name}` is missing `type`")),
            }

            any_required |= field.get("required").and_then(Value::as_bool).unwrap_or(false);
        }
        if !any_required {
            errors.push("at least one field must be required".to_string());
        }
        errors
    }
}

pub struct RuleValidator;

impl Validator for RuleValidator {
    fn validate(&self, unit: &SourceUnit) -> Vec<String> {
        let spec = match spec_of(unit) {
            Ok(spec) => spec,
            Err(errors) => return errors,
        };
        let mut errors = Vec::new();

        match spec.get("type").and_then(Value::as_str) {
            Some(ty) if RULE_TYPES.contains(&ty) => {}
            Some(ty) => errors.push(format!("unknown rule type `{ty}`")),
            None => errors.push("`type` is required".to_string()),
        }

        if spec
            .get("input")
            .and_then(Value::as_str)
            .is_none_or(str::is_empty)
        {
            errors.push("`input` must be a non-empty string".to_string());
        }

        let Some(operator) = spec.get("operator").and_then(Value::as_str) else {
            errors.push("`operator` is required".to_string());
            return errors;
        };

        match spec.get("value") {
            Some(Value::Number(_)) => {
                if !NUMERIC_OPERATORS.contains(&operator) {
                    errors.push(format!("operator `{operator}` cannot compare numbers"));
                }
            }
            Some(Value::String(_)) | Some(Value::Bool(_)) => {
                if !EQUALITY_OPERATORS.contains(&operator) {
                    errors.push(format!(
                        "operator `{operator}` is not allowed for string or boolean values"
                    ));
                }
            }
            _ => errors.push("`value` must be a number, string or boolean".to_string()),
        }
        errors
    }
}

pub struct RulesetValidator;

impl RulesetValidator {
    fn check_node(node: &Value, errors: &mut Vec<String>) {
        let Some(node) = node.as_object() else {
            errors.push("expression nodes must be objects".to_string());
            return;
        };
        if node.contains_key("ruleRef") {
            return;
        }

        match node.get("operator").and_then(Value::as_str) {
            Some(op) if LogicalOperator::parse(op).is_some() => {}
            Some(op) => errors.push(format!("unknown logical operator `{op}`")),
            None => {
                errors.push("node must be a `ruleRef` or an `operator`/`operands` pair".to_string());
                return;
            }
        }

        match node.get("operands").and_then(Value::as_array) {
            Some(operands) => {
                if operands.len() < 2 {
                    errors.push("logical nodes need at least two operands".to_string());
                }
                for operand in operands {
                    Self::check_node(operand, errors);
                }
            }
            None => errors.push("`operands` must be an array".to_string()),
        }
    }
}

impl Validator for RulesetValidator {
    fn validate(&self, unit: &SourceUnit) -> Vec<String> {
        let spec = match spec_of(unit) {
            Ok(spec) => spec,
            Err(errors) => return errors,
        };
        let mut errors = Vec::new();
        match (spec.get("expression"), spec.get("ruleRef")) {
            (Some(expression), _) => Self::check_node(expression, &mut errors),
            (None, Some(_)) => {}
            (None, None) => errors.push("either `expression` or `ruleRef` is required".to_string()),
        }
        errors
    }
}

pub struct TaskValidator;

impl Validator for TaskValidator {
    fn validate(&self, unit: &SourceUnit) -> Vec<String> {
        let spec = match spec_of(unit) {
            Ok(spec) => spec,
            Err(errors) => return errors,
        };
        let mut errors = Vec::new();

        match spec.get("rulesetRef").and_then(Value::as_object) {
            Some(reference) if reference.get("id").and_then(Value::as_str).is_some() => {}
            Some(_) => errors.push("`rulesetRef.id` is required".to_string()),
            None => errors.push("`rulesetRef` must be an object".to_string()),
        }

        match spec.get("resultType").and_then(Value::as_str) {
            Some(ty) if TaskResultType::parse(ty).is_some() => {}
            Some(ty) => errors.push(format!("unknown result type `{ty}`")),
            None => errors.push("`resultType` is required".to_string()),
        }

        match spec.get("actions") {
            None => {}
            Some(Value::Array(actions)) => {
                for action in actions {
                    check_action(action, &mut errors);
                }
            }
            Some(_) => errors.push("`actions` must be an array".to_string()),
        }
        errors
    }
}

fn check_action(action: &Value, errors: &mut Vec<String>) {
    let Some(action) = action.as_object() else {
        errors.push("actions must be objects".to_string());
        return;
    };
    if let Some(extra) = action.keys().find(|k| *k != "on" && *k != "emit") {
        errors.push(format!("unexpected action field `{extra}`"));
    }
    match action.get("on").and_then(Value::as_str) {
        Some(on) if ActionTrigger::parse(on).is_some() => {}
        Some(on) => errors.push(format!("unknown action trigger `{on}`")),
        None => errors.push("action `on` is required".to_string()),
    }
    if !action.get("emit").is_some_and(Value::is_string) {
        errors.push("action `emit` must be a string".to_string());
    }
}

pub struct ChallengeValidator;

impl Validator for ChallengeValidator {
    fn validate(&self, unit: &SourceUnit) -> Vec<String> {
        let spec = match spec_of(unit) {
            Ok(spec) => spec,
            Err(errors) => return errors,
        };
        let mut errors = Vec::new();

        for forbidden in ["actions", "operator", "expression"] {
            if spec.contains_key(forbidden) {
                errors.push(format!("`{forbidden}` is not allowed in a challenge"));
            }
        }

        let tasks = match spec.get("tasks").and_then(Value::as_array) {
            Some(tasks) if !tasks.is_empty() => tasks,
            _ => {
                errors.push("at least one task is required".to_string());
                return errors;
            }
        };

        let mut seen = HashSet::new();
        for task in tasks {
            let Some(task) = task.as_object() else {
                errors.push("task references must be objects".to_string());
                continue;
            };
            match task.get("id").and_then(Value::as_str) {
                Some(id) if !seen.insert(id) => errors.push(format!("duplicate task `{id}`")),
                Some(_) => {}
                None => errors.push("task references need an `id`".to_string()),
            }
            if let Some(version) = task.get("version")
                && version.as_u64().is_none_or(|v| v < 1)
            {
                errors.push(format!("task version {version} must be >= 1"));
            }
        }
        errors
    }
}
