//! Banyan Foundation
//!
//! The artifact model shared by the compiler and the runtime: artifact
//! kinds and references, the compiled envelope and its payloads, canonical
//! content hashing, and the DAR archive layout. The DAR format is the
//! contract between the two halves, so both depend on this crate and
//! nothing else of each other.

pub mod artifact;
pub mod content_hash;
pub mod dar;
pub mod error;
pub mod ids;
pub mod payload;

pub use artifact::{CompilationMetadata, CompiledArtifact};
pub use error::FoundationError;
pub use ids::{ArtifactKind, ArtifactReference, VersionedId, validate_id};
pub use payload::{
    ActionTrigger, ArtifactPayload, CompiledChallenge, CompiledEvidenceType, CompiledRule,
    CompiledRuleset, CompiledTask, EvidenceField, EvidenceValueType, LogicalOperator, RuleValue,
    RulesetExpression, TaskAction, TaskResultType,
};
