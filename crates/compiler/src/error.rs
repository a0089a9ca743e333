//! Compiler errors

use banyan_foundation::{ArtifactKind, ArtifactReference};
use serde::Serialize;
use thiserror::Error;

/// Compiler result type
pub type Result<T> = std::result::Result<T, CompilationError>;

/// Stable classification of compiler failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompilationErrorCode {
    // Dependency errors
    MissingDependency,
    VersionNotFound,
    TypeMismatch,

    // Structural errors
    InvalidGraph,
    CyclicDependency,

    // Backend failures
    AstBuildFailed,
    ContextCorrupted,
    ContextFrozen,

    InternalCompilerError,
}

/// Compiler errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    #[error("missing dependency: {0}")]
    MissingDependency(ArtifactReference),

    #[error("compilation context is frozen, cannot register {0}")]
    ContextFrozen(ArtifactReference),

    #[error("compilation context must be frozen before {operation}")]
    ContextNotFrozen { operation: &'static str },

    #[error("{kind} {id:?}: {message}")]
    MalformedSource {
        kind: ArtifactKind,
        id: String,
        message: String,
    },

    #[error("{kind} {id:?}: spec is missing or empty")]
    EmptySpec { kind: ArtifactKind, id: String },

    #[error("rule {id:?}: unsupported rule value {value}")]
    UnsupportedRuleValue { id: String, value: String },

    #[error("ruleset {id:?}: invalid expression: {message}")]
    InvalidExpression { id: String, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl CompilationError {
    pub fn code(&self) -> CompilationErrorCode {
        match self {
            CompilationError::MissingDependency(_) => CompilationErrorCode::MissingDependency,
            CompilationError::ContextFrozen(_) => CompilationErrorCode::ContextFrozen,
            CompilationError::ContextNotFrozen { .. } => CompilationErrorCode::ContextCorrupted,
            CompilationError::MalformedSource { .. }
            | CompilationError::EmptySpec { .. }
            | CompilationError::UnsupportedRuleValue { .. }
            | CompilationError::InvalidExpression { .. } => CompilationErrorCode::AstBuildFailed,
            CompilationError::InvalidConfig(_) | CompilationError::Internal(_) => {
                CompilationErrorCode::InternalCompilerError
            }
        }
    }

    pub(crate) fn malformed(kind: ArtifactKind, id: &str, message: impl Into<String>) -> Self {
        CompilationError::MalformedSource {
            kind,
            id: id.to_string(),
            message: message.into(),
        }
    }
}
