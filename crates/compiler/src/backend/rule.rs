//! Rule compiler

use banyan_foundation::{
    ArtifactKind, ArtifactPayload, ArtifactReference, CompiledArtifact, CompiledRule, RuleValue,
};
use serde_json::Value;

use super::{BackendCompiler, build_artifact, read_header, read_versioned_ref, required_str};
use crate::context::CompilationContext;
use crate::error::{CompilationError, Result};

const KIND: ArtifactKind = ArtifactKind::Rule;

/// `spec: {input, operator, value, type, evidenceTypeRef?}` → [`CompiledRule`].
pub struct RuleCompiler;

impl BackendCompiler for RuleCompiler {
    fn kind(&self) -> ArtifactKind {
        KIND
    }

    fn compile(&self, source: &Value, _ctx: &CompilationContext) -> Result<CompiledArtifact> {
        let header = read_header(KIND, source)?;
        let id = header.id;
        let spec = header.spec;

        let input = required_str(KIND, id, spec, "input")?;
        let operator = required_str(KIND, id, spec, "operator")?;
        let rule_type = required_str(KIND, id, spec, "type")?;

        let raw_value = spec.get("value").unwrap_or(&Value::Null);
        let value = RuleValue::from_json(raw_value).ok_or_else(|| {
            CompilationError::UnsupportedRuleValue {
                id: id.to_string(),
                value: raw_value.to_string(),
            }
        })?;

        let mut dependencies = Vec::new();
        if spec.contains_key("evidenceTypeRef") {
            let evidence =
                read_versioned_ref(KIND, id, "evidenceTypeRef", spec.get("evidenceTypeRef"))?;
            dependencies.push(ArtifactReference::new(
                ArtifactKind::EvidenceType,
                evidence.id,
                evidence.version,
            ));
        }

        let payload = ArtifactPayload::Rule(CompiledRule {
            input: input.to_string(),
            operator: operator.to_string(),
            value,
            rule_type: rule_type.to_string(),
        });
        Ok(build_artifact(source, &header, dependencies, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompilationErrorCode;
    use serde_json::json;

    fn rule_source(value: Value) -> Value {
        json!({
            "kind": "Rule",
            "id": "r1",
            "version": 1,
            "spec": {"input": "count", "operator": ">", "value": value, "type": "THRESHOLD"}
        })
    }

    #[test]
    fn compiles_scalar_values() {
        let ctx = CompilationContext::new();
        let cases = [
            (json!(3), RuleValue::Integer(3)),
            (json!(9_000_000_000_i64), RuleValue::Integer(9_000_000_000)),
            (json!(2.5), RuleValue::Decimal(2.5)),
            (json!(false), RuleValue::Boolean(false)),
            (json!("LOCKED"), RuleValue::Text("LOCKED".into())),
        ];
        for (raw, expected) in cases {
            let artifact = RuleCompiler.compile(&rule_source(raw), &ctx).unwrap();
            let rule = artifact.payload().as_rule().unwrap();
            assert_eq!(rule.value, expected);
            assert_eq!(rule.rule_type, "THRESHOLD");
            assert!(artifact.dependencies().is_empty());
        }
    }

    #[test]
    fn non_scalar_value_is_unsupported() {
        let ctx = CompilationContext::new();
        for raw in [json!(null), json!([3]), json!({"v": 3})] {
            let err = RuleCompiler.compile(&rule_source(raw), &ctx).unwrap_err();
            assert!(matches!(err, CompilationError::UnsupportedRuleValue { .. }));
            assert_eq!(err.code(), CompilationErrorCode::AstBuildFailed);
        }
    }

    #[test]
    fn evidence_type_ref_becomes_dependency() {
        let mut source = rule_source(json!(3));
        source["spec"]["evidenceTypeRef"] = json!({"id": "LOGIN_ATTEMPT", "version": 1});
        let artifact = RuleCompiler
            .compile(&source, &CompilationContext::new())
            .unwrap();
        assert_eq!(
            artifact.dependencies(),
            [ArtifactReference::new(ArtifactKind::EvidenceType, "LOGIN_ATTEMPT", 1)]
        );
    }
}
