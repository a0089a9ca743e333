//! Kind-specific artifact payloads

mod evidence;
mod rule;
mod ruleset;
mod task;

pub use evidence::{CompiledEvidenceType, EvidenceField, EvidenceValueType};
pub use rule::{CompiledRule, RuleValue};
pub use ruleset::{CompiledRuleset, LogicalOperator, RulesetExpression};
pub use task::{
    ActionTrigger, CompiledChallenge, CompiledTask, TaskAction, TaskResultType,
};

use serde::Serialize;

use crate::error::FoundationError;
use crate::ids::ArtifactKind;

/// The payload of a compiled artifact, one variant per kind.
///
/// Serialized untagged; the enclosing envelope carries the kind tag and
/// drives decoding through [`ArtifactPayload::from_json`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArtifactPayload {
    EvidenceType(CompiledEvidenceType),
    Rule(CompiledRule),
    Ruleset(CompiledRuleset),
    Task(CompiledTask),
    Challenge(CompiledChallenge),
}

impl ArtifactPayload {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactPayload::EvidenceType(_) => ArtifactKind::EvidenceType,
            ArtifactPayload::Rule(_) => ArtifactKind::Rule,
            ArtifactPayload::Ruleset(_) => ArtifactKind::Ruleset,
            ArtifactPayload::Task(_) => ArtifactKind::Task,
            ArtifactPayload::Challenge(_) => ArtifactKind::Challenge,
        }
    }

    /// Decode a payload whose kind is already known.
    pub fn from_json(kind: ArtifactKind, value: serde_json::Value) -> Result<Self, FoundationError> {
        let wrap = |source| FoundationError::InvalidPayload { kind, source };
        let payload = match kind {
            ArtifactKind::EvidenceType => {
                ArtifactPayload::EvidenceType(serde_json::from_value(value).map_err(wrap)?)
            }
            ArtifactKind::Rule => ArtifactPayload::Rule(serde_json::from_value(value).map_err(wrap)?),
            ArtifactKind::Ruleset => {
                ArtifactPayload::Ruleset(serde_json::from_value(value).map_err(wrap)?)
            }
            ArtifactKind::Task => ArtifactPayload::Task(serde_json::from_value(value).map_err(wrap)?),
            ArtifactKind::Challenge => {
                ArtifactPayload::Challenge(serde_json::from_value(value).map_err(wrap)?)
            }
        };
        Ok(payload)
    }

    pub fn as_evidence_type(&self) -> Option<&CompiledEvidenceType> {
        match self {
            ArtifactPayload::EvidenceType(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_rule(&self) -> Option<&CompiledRule> {
        match self {
            ArtifactPayload::Rule(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_ruleset(&self) -> Option<&CompiledRuleset> {
        match self {
            ArtifactPayload::Ruleset(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_task(&self) -> Option<&CompiledTask> {
        match self {
            ArtifactPayload::Task(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_challenge(&self) -> Option<&CompiledChallenge> {
        match self {
            ArtifactPayload::Challenge(p) => Some(p),
            _ => None,
        }
    }
}
