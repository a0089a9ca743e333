//! Identifiers for compiled artifacts
//!
//! Every artifact is addressed by its kind, a string id and a positive
//! version. These types are used as dependency edges, symbol-table keys and
//! archive path components.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FoundationError;

/// The closed set of DSL artifact kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKind {
    EvidenceType,
    Rule,
    Ruleset,
    Task,
    Challenge,
}

impl ArtifactKind {
    /// Backend compilation order. A kind may only reference kinds that
    /// appear before it.
    pub const COMPILATION_ORDER: [ArtifactKind; 5] = [
        ArtifactKind::EvidenceType,
        ArtifactKind::Rule,
        ArtifactKind::Ruleset,
        ArtifactKind::Task,
        ArtifactKind::Challenge,
    ];

    /// The tag used in source documents, envelopes and archive paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::EvidenceType => "EvidenceType",
            ArtifactKind::Rule => "Rule",
            ArtifactKind::Ruleset => "Ruleset",
            ArtifactKind::Task => "Task",
            ArtifactKind::Challenge => "Challenge",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = FoundationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactKind::COMPILATION_ORDER
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FoundationError::UnknownKind(s.to_string()))
    }
}

/// Check that `id` can be used as the last component of an archive path.
///
/// Ids must be non-empty and must not be `.` or `..`. Path separators
/// and control characters are rejected anywhere in the id.
pub fn validate_id(id: &str) -> Result<(), FoundationError> {
    let reason = if id.is_empty() {
        "must not be empty"
    } else if id.contains(['/', '\\']) {
        "must not contain a path separator"
    } else if id == "." || id == ".." {
        "must not be a relative path segment"
    } else if id.chars().any(char::is_control) {
        "must not contain control characters"
    } else {
        return Ok(());
    };
    Err(FoundationError::InvalidId {
        id: id.to_string(),
        reason,
    })
}

/// A dependency edge: `(kind, id, version)`.
///
/// Also the key of the compilation symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub kind: ArtifactKind,
    pub id: String,
    pub version: u32,
}

impl ArtifactReference {
    pub fn new(kind: ArtifactKind, id: impl Into<String>, version: u32) -> Self {
        Self {
            kind,
            id: id.into(),
            version,
        }
    }

    /// The kind-less part of the reference.
    pub fn versioned_id(&self) -> VersionedId {
        VersionedId::new(self.id.clone(), self.version)
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.id, self.version)
    }
}

/// An `(id, version)` pair whose kind is implied by where it appears.
///
/// Payloads use this shape for their outgoing references (a task's
/// ruleset, a challenge's tasks, a ruleset's rules).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionedId {
    pub id: String,
    pub version: u32,
}

impl VersionedId {
    pub fn new(id: impl Into<String>, version: u32) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Qualify this pair with a kind.
    pub fn with_kind(&self, kind: ArtifactKind) -> ArtifactReference {
        ArtifactReference::new(kind, self.id.clone(), self.version)
    }
}

impl fmt::Display for VersionedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}
