//! Backend compilers
//!
//! One compiler per artifact kind. Each reads a validated source document
//! (`{kind, id, version, spec}`), builds the typed payload and the explicit
//! dependency list, and returns an immutable [`CompiledArtifact`]. Compilers
//! may consult the context for hard dependency checks; registration is the
//! caller's job.

mod challenge;
mod evidence;
mod rule;
mod ruleset;
mod task;

pub use challenge::ChallengeCompiler;
pub use evidence::EvidenceTypeCompiler;
pub use rule::RuleCompiler;
pub use ruleset::RulesetCompiler;
pub use task::TaskCompiler;

use std::time::{SystemTime, UNIX_EPOCH};

use banyan_foundation::content_hash::content_hash;
use banyan_foundation::{
    ArtifactKind, ArtifactPayload, ArtifactReference, CompilationMetadata, CompiledArtifact,
    VersionedId, validate_id,
};
use serde_json::{Map, Value};

use crate::context::CompilationContext;
use crate::error::{CompilationError, Result};

/// Identifier written into every artifact's metadata.
pub const COMPILER_VERSION: &str = concat!("banyan-compiler-", env!("CARGO_PKG_VERSION"));

/// A per-kind compiler from source JSON to a compiled artifact.
pub trait BackendCompiler: Send + Sync {
    /// The kind this compiler produces.
    fn kind(&self) -> ArtifactKind;

    /// Compile one source document.
    fn compile(&self, source: &Value, ctx: &CompilationContext) -> Result<CompiledArtifact>;
}

/// The compiler responsible for `kind`.
pub fn backend_for(kind: ArtifactKind) -> &'static dyn BackendCompiler {
    match kind {
        ArtifactKind::EvidenceType => &EvidenceTypeCompiler,
        ArtifactKind::Rule => &RuleCompiler,
        ArtifactKind::Ruleset => &RulesetCompiler,
        ArtifactKind::Task => &TaskCompiler,
        ArtifactKind::Challenge => &ChallengeCompiler,
    }
}

/// The envelope fields common to every source document.
pub(crate) struct SourceHeader<'a> {
    pub id: &'a str,
    pub version: u32,
    pub spec: &'a Map<String, Value>,
}

pub(crate) fn read_header(kind: ArtifactKind, source: &Value) -> Result<SourceHeader<'_>> {
    let id = source
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CompilationError::malformed(kind, "", "`id` must be a non-empty string"))?;
    validate_id(id).map_err(|err| CompilationError::malformed(kind, id, err.to_string()))?;

    let version = source
        .get("version")
        .and_then(Value::as_u64)
        .filter(|v| *v >= 1)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            CompilationError::malformed(kind, id, "`version` must be a positive integer")
        })?;

    let spec = match source.get("spec") {
        Some(Value::Object(spec)) if !spec.is_empty() => spec,
        Some(Value::Object(_)) | None | Some(Value::Null) => {
            return Err(CompilationError::EmptySpec {
                kind,
                id: id.to_string(),
            });
        }
        Some(_) => return Err(CompilationError::malformed(kind, id, "`spec` must be an object")),
    };

    Ok(SourceHeader { id, version, spec })
}

/// Assemble the artifact with fresh metadata for `source`.
pub(crate) fn build_artifact(
    source: &Value,
    header: &SourceHeader<'_>,
    dependencies: Vec<ArtifactReference>,
    payload: ArtifactPayload,
) -> CompiledArtifact {
    let metadata = CompilationMetadata {
        compiler_version: COMPILER_VERSION.to_string(),
        compiled_at_epoch_millis: now_millis(),
        content_hash: content_hash(source),
    };
    CompiledArtifact::new(header.id, header.version, metadata, dependencies, payload)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub(crate) fn required_str<'a>(
    kind: ArtifactKind,
    id: &str,
    object: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a str> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| CompilationError::malformed(kind, id, format!("`{field}` must be a string")))
}

/// Read a `{id, version}` reference object. A missing version means 1.
pub(crate) fn read_versioned_ref(
    kind: ArtifactKind,
    id: &str,
    field: &str,
    value: Option<&Value>,
) -> Result<VersionedId> {
    let object = value.and_then(Value::as_object).ok_or_else(|| {
        CompilationError::malformed(kind, id, format!("`{field}` must be an object"))
    })?;
    let ref_id = object
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            CompilationError::malformed(kind, id, format!("`{field}.id` must be a non-empty string"))
        })?;
    validate_id(ref_id)
        .map_err(|err| CompilationError::malformed(kind, id, format!("`{field}.id`: {err}")))?;
    let version = read_ref_version(kind, id, field, object.get("version"))?;
    Ok(VersionedId::new(ref_id, version))
}

pub(crate) fn read_ref_version(
    kind: ArtifactKind,
    id: &str,
    field: &str,
    value: Option<&Value>,
) -> Result<u32> {
    match value {
        None => Ok(1),
        Some(v) => v
            .as_u64()
            .filter(|v| *v >= 1)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                CompilationError::malformed(
                    kind,
                    id,
                    format!("`{field}.version` must be a positive integer"),
                )
            }),
    }
}
