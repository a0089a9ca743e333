//! Challenge compiler

use banyan_foundation::{
    ArtifactKind, ArtifactPayload, ArtifactReference, CompiledArtifact, CompiledChallenge,
};
use serde_json::Value;
use tracing::debug;

use super::{BackendCompiler, build_artifact, read_header, read_versioned_ref};
use crate::context::CompilationContext;
use crate::error::{CompilationError, Result};

const KIND: ArtifactKind = ArtifactKind::Challenge;

/// `spec.tasks: [{id, version}]` → [`CompiledChallenge`].
///
/// Every task must already be registered in the context. A single missing
/// task fails the whole challenge.
pub struct ChallengeCompiler;

impl BackendCompiler for ChallengeCompiler {
    fn kind(&self) -> ArtifactKind {
        KIND
    }

    fn compile(&self, source: &Value, ctx: &CompilationContext) -> Result<CompiledArtifact> {
        let header = read_header(KIND, source)?;
        let id = header.id;

        let entries = header
            .spec
            .get("tasks")
            .and_then(Value::as_array)
            .ok_or_else(|| CompilationError::malformed(KIND, id, "`tasks` must be an array"))?;

        let mut tasks = Vec::with_capacity(entries.len());
        let mut dependencies = Vec::with_capacity(entries.len());
        for entry in entries {
            let task = read_versioned_ref(KIND, id, "tasks[]", Some(entry))?;
            ctx.resolve(ArtifactKind::Task, &task.id, task.version)?;
            debug!(challenge = %id, task = %task, "task reference resolved");

            dependencies.push(ArtifactReference::new(
                ArtifactKind::Task,
                task.id.clone(),
                task.version,
            ));
            tasks.push(task);
        }

        let payload = ArtifactPayload::Challenge(CompiledChallenge { tasks });
        Ok(build_artifact(source, &header, dependencies, payload))
    }
}
