//! Banyan Compiler
//!
//! Compiles JSON DSL documents into versioned artifacts and packages the
//! closure of a chosen root into a DAR archive.
//!
//! Pipeline (see [`orchestrator::Orchestrator`]):
//! 1. **Validate**: per-kind semantic checks over every source, in parallel.
//! 2. **Compile**: backend compilers run in [`ArtifactKind::COMPILATION_ORDER`]
//!    and register into a [`CompilationContext`].
//! 3. **Freeze**: the context becomes read-only.
//! 4. **Close**: [`OutcomeBuilder`] computes the reachable set from the root.
//! 5. **Emit**: [`DarEmitter`] writes the archive.
//!
//! [`ArtifactKind::COMPILATION_ORDER`]: banyan_foundation::ArtifactKind::COMPILATION_ORDER

pub mod backend;
pub mod config;
pub mod context;
pub mod emitter;
pub mod error;
pub mod frontend;
pub mod orchestrator;
pub mod outcome;
pub mod source;

use std::fmt;

pub use config::CompilerConfig;
pub use context::{CompilationContext, ContextState};
pub use emitter::{DarEmitter, EmitError};
pub use error::{CompilationError, CompilationErrorCode};
pub use orchestrator::{CompilationReport, CompilationState, Orchestrator};
pub use outcome::{CompilationOutcome, CompilationRoot, OutcomeBuilder};
pub use source::{SourceError, SourceLibrary, SourceUnit};

/// A diagnostic message from any phase of the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Human-readable message.
    pub message: String,
    /// Where the offending source came from, if known.
    pub origin: Option<String>,
    pub severity: Severity,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin: None,
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin: None,
            severity: Severity::Warning,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.origin {
            Some(origin) => write!(f, "{label}: {origin}: {}", self.message),
            None => write!(f, "{label}: {}", self.message),
        }
    }
}
