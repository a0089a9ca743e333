//! The compiled artifact envelope
//!
//! Every backend compiler produces a [`CompiledArtifact`]: identity, build
//! metadata, declared dependencies and the kind-specific payload. The JSON
//! form of the envelope is the unit stored in a DAR archive:
//!
//! ```json
//! {
//!   "id": "r1",
//!   "version": 1,
//!   "kind": "Rule",
//!   "metadata": { "compilerVersion": "...", "compiledAtEpochMillis": 0, "contentHash": "..." },
//!   "dependencies": [],
//!   "payload": { "input": "count", "operator": ">", "value": 3, "ruleType": "THRESHOLD" }
//! }
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ids::{ArtifactKind, ArtifactReference};
use crate::payload::ArtifactPayload;

/// Build provenance attached to every artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationMetadata {
    pub compiler_version: String,
    pub compiled_at_epoch_millis: u64,
    /// Hex SHA-256 of the canonical source document.
    pub content_hash: String,
}

/// A compiled, versioned unit of one DSL kind. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArtifact {
    id: String,
    version: u32,
    metadata: CompilationMetadata,
    dependencies: Vec<ArtifactReference>,
    payload: ArtifactPayload,
}

impl CompiledArtifact {
    /// Build an artifact. The kind is taken from the payload.
    pub fn new(
        id: impl Into<String>,
        version: u32,
        metadata: CompilationMetadata,
        dependencies: Vec<ArtifactReference>,
        payload: ArtifactPayload,
    ) -> Self {
        Self {
            id: id.into(),
            version,
            metadata,
            dependencies,
            payload,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn kind(&self) -> ArtifactKind {
        self.payload.kind()
    }

    pub fn metadata(&self) -> &CompilationMetadata {
        &self.metadata
    }

    /// Declared hard dependencies, in declaration order.
    pub fn dependencies(&self) -> &[ArtifactReference] {
        &self.dependencies
    }

    pub fn payload(&self) -> &ArtifactPayload {
        &self.payload
    }

    /// The `(kind, id, version)` that identifies this artifact.
    pub fn reference(&self) -> ArtifactReference {
        ArtifactReference::new(self.kind(), self.id.clone(), self.version)
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    id: &'a str,
    version: u32,
    kind: ArtifactKind,
    metadata: &'a CompilationMetadata,
    dependencies: &'a [ArtifactReference],
    payload: &'a ArtifactPayload,
}

#[derive(Deserialize)]
struct RawEnvelope {
    id: String,
    version: u32,
    kind: ArtifactKind,
    metadata: CompilationMetadata,
    #[serde(default)]
    dependencies: Vec<ArtifactReference>,
    payload: serde_json::Value,
}

impl Serialize for CompiledArtifact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EnvelopeRef {
            id: &self.id,
            version: self.version,
            kind: self.kind(),
            metadata: &self.metadata,
            dependencies: &self.dependencies,
            payload: &self.payload,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CompiledArtifact {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::deserialize(deserializer)?;
        let payload = ArtifactPayload::from_json(raw.kind, raw.payload).map_err(D::Error::custom)?;
        Ok(CompiledArtifact {
            id: raw.id,
            version: raw.version,
            metadata: raw.metadata,
            dependencies: raw.dependencies,
            payload,
        })
    }
}
