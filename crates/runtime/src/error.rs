//! Runtime errors

use std::path::PathBuf;

use banyan_foundation::ArtifactKind;
use thiserror::Error;

use crate::store::DarId;

/// Runtime result type
pub type Result<T> = std::result::Result<T, Error>;

/// Runtime errors
#[derive(Debug, Error)]
pub enum Error {
    /// A rule's input field is absent from the evidence. Absorbed by any
    /// enclosing logical node.
    #[error("missing evidence field: {0}")]
    MissingEvidence(String),

    #[error("invalid evidence type for {field}: {message}")]
    InvalidEvidenceType { field: String, message: String },

    #[error("invalid evidence value for {field}: {value}")]
    InvalidEvidenceValue { field: String, value: String },

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("{kind} {id}@{version} not found in runtime context")]
    ArtifactNotFound {
        kind: ArtifactKind,
        id: String,
        version: u32,
    },

    #[error("DAR not loaded: {0}")]
    DarNotLoaded(DarId),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive has no manifest")]
    MissingManifest,

    #[error("invalid JSON in archive entry {path}: {source}")]
    InvalidEntry {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unroutable archive entry: {0}")]
    UnroutableEntry(String),

    #[error("archive entry {path} holds {found}")]
    EntryMismatch { path: String, found: String },

    #[error("manifest lists {0} but the archive does not contain it")]
    MissingEntry(String),

    #[error("archive entry {0} is not listed in the manifest")]
    UnlistedEntry(String),

    #[error("manifest root challenge {0} is not in the archive")]
    MissingRoot(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn is_missing_evidence(&self) -> bool {
        matches!(self, Error::MissingEvidence(_))
    }
}
