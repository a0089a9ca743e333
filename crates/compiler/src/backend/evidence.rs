//! Evidence type compiler

use banyan_foundation::{
    ArtifactKind, ArtifactPayload, CompiledArtifact, CompiledEvidenceType, EvidenceField,
    EvidenceValueType,
};
use indexmap::IndexMap;
use serde_json::Value;

use super::{BackendCompiler, build_artifact, read_header, required_str};
use crate::context::CompilationContext;
use crate::error::{CompilationError, Result};

const KIND: ArtifactKind = ArtifactKind::EvidenceType;

/// `spec.fields: [{name, type, required}]` → ordered field map.
pub struct EvidenceTypeCompiler;

impl BackendCompiler for EvidenceTypeCompiler {
    fn kind(&self) -> ArtifactKind {
        KIND
    }

    fn compile(&self, source: &Value, _ctx: &CompilationContext) -> Result<CompiledArtifact> {
        let header = read_header(KIND, source)?;
        let id = header.id;

        let entries = header
            .spec
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| CompilationError::malformed(KIND, id, "`fields` must be an array"))?;

        let mut fields = IndexMap::with_capacity(entries.len());
        for entry in entries {
            let entry = entry
                .as_object()
                .ok_or_else(|| CompilationError::malformed(KIND, id, "field must be an object"))?;
            let name = required_str(KIND, id, entry, "name")?;
            let type_name = required_str(KIND, id, entry, "type")?;
            let value_type = EvidenceValueType::parse(type_name).ok_or_else(|| {
                CompilationError::malformed(KIND, id, format!("unknown value type `{type_name}`"))
            })?;
            let required = entry.get("required").and_then(Value::as_bool).unwrap_or(false);

            let field = EvidenceField {
                name: name.to_string(),
                value_type,
                required,
            };
            if fields.insert(name.to_string(), field).is_some() {
                return Err(CompilationError::malformed(
                    KIND,
                    id,
                    format!("duplicate field `{name}`"),
                ));
            }
        }

        let payload = ArtifactPayload::EvidenceType(CompiledEvidenceType { fields });
        Ok(build_artifact(source, &header, Vec::new(), payload))
    }
}
