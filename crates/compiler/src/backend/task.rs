//! Task compiler

use banyan_foundation::{
    ActionTrigger, ArtifactKind, ArtifactPayload, ArtifactReference, CompiledArtifact,
    CompiledTask, TaskAction, TaskResultType,
};
use serde_json::Value;

use super::{BackendCompiler, build_artifact, read_header, read_versioned_ref, required_str};
use crate::context::CompilationContext;
use crate::error::{CompilationError, Result};

const KIND: ArtifactKind = ArtifactKind::Task;

/// `spec: {rulesetRef, resultType, actions?, description?}` → [`CompiledTask`].
pub struct TaskCompiler;

impl BackendCompiler for TaskCompiler {
    fn kind(&self) -> ArtifactKind {
        KIND
    }

    fn compile(&self, source: &Value, _ctx: &CompilationContext) -> Result<CompiledArtifact> {
        let header = read_header(KIND, source)?;
        let id = header.id;
        let spec = header.spec;

        let ruleset_ref = read_versioned_ref(KIND, id, "rulesetRef", spec.get("rulesetRef"))?;

        let result_type = required_str(KIND, id, spec, "resultType")?;
        let result_type = TaskResultType::parse(result_type).ok_or_else(|| {
            CompilationError::malformed(KIND, id, format!("unknown result type `{result_type}`"))
        })?;

        let actions = match spec.get("actions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(actions)) => actions
                .iter()
                .map(|action| parse_action(id, action))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => return Err(CompilationError::malformed(KIND, id, "`actions` must be an array")),
        };

        let description = spec
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let dependencies = vec![ArtifactReference::new(
            ArtifactKind::Ruleset,
            ruleset_ref.id.clone(),
            ruleset_ref.version,
        )];

        let payload = ArtifactPayload::Task(CompiledTask {
            ruleset_ref,
            result_type,
            actions,
            description,
        });
        Ok(build_artifact(source, &header, dependencies, payload))
    }
}

fn parse_action(id: &str, action: &Value) -> Result<TaskAction> {
    let action = action
        .as_object()
        .ok_or_else(|| CompilationError::malformed(KIND, id, "action must be an object"))?;
    let on = required_str(KIND, id, action, "on")?;
    let on = ActionTrigger::parse(on).ok_or_else(|| {
        CompilationError::malformed(KIND, id, format!("unknown action trigger `{on}`"))
    })?;
    let emit = required_str(KIND, id, action, "emit")?;
    Ok(TaskAction {
        on,
        emit: emit.to_string(),
    })
}
