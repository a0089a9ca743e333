//! Foundation errors

use thiserror::Error;

use crate::ids::ArtifactKind;

/// Errors raised while decoding the shared artifact model.
#[derive(Debug, Error)]
pub enum FoundationError {
    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),

    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: ArtifactKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid artifact id {id:?}: {reason}")]
    InvalidId { id: String, reason: &'static str },

    #[error("malformed archive path: {0}")]
    MalformedEntryPath(String),
}
