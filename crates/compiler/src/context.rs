//! Compilation context
//!
//! The symbol table of one compilation run. Backend compilers register
//! artifacts while the context is running and use it for hard dependency
//! checks; once frozen it is read-only and feeds the outcome builder.
//!
//! A context is owned by exactly one run. It offers no per-key locking, so
//! there is one writer at a time by construction (`&mut self`).

use std::collections::HashMap;

use banyan_foundation::{ArtifactKind, ArtifactReference, CompiledArtifact};
use tracing::{debug, trace, warn};

use crate::error::{CompilationError, Result};

/// Lifecycle of a [`CompilationContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Accepting registrations.
    Running,
    /// Read-only. Terminal.
    Frozen,
}

/// Symbol table keyed by `(kind, id, version)`.
#[derive(Debug)]
pub struct CompilationContext {
    symbols: HashMap<ArtifactReference, CompiledArtifact>,
    state: ContextState,
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilationContext {
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            state: ContextState::Running,
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_frozen(&self) -> bool {
        self.state == ContextState::Frozen
    }

    /// Insert an artifact.
    ///
    /// A second registration under the same key replaces the first.
    pub fn register(&mut self, artifact: CompiledArtifact) -> Result<()> {
        let key = artifact.reference();
        if self.is_frozen() {
            return Err(CompilationError::ContextFrozen(key));
        }

        trace!(artifact = %key, "registering artifact");
        if self.symbols.insert(key.clone(), artifact).is_some() {
            warn!(artifact = %key, "artifact registered twice, keeping the latest");
        }
        Ok(())
    }

    /// Look up a registered artifact.
    pub fn resolve(&self, kind: ArtifactKind, id: &str, version: u32) -> Result<&CompiledArtifact> {
        self.resolve_reference(&ArtifactReference::new(kind, id, version))
    }

    pub fn resolve_reference(&self, reference: &ArtifactReference) -> Result<&CompiledArtifact> {
        self.symbols
            .get(reference)
            .ok_or_else(|| CompilationError::MissingDependency(reference.clone()))
    }

    pub fn contains(&self, reference: &ArtifactReference) -> bool {
        self.symbols.contains_key(reference)
    }

    /// Stop accepting registrations. Irreversible.
    pub fn freeze(&mut self) {
        if !self.is_frozen() {
            debug!(artifacts = self.symbols.len(), "compilation context frozen");
        }
        self.state = ContextState::Frozen;
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Registered artifacts, in no particular order.
    pub fn artifacts(&self) -> impl Iterator<Item = &CompiledArtifact> {
        self.symbols.values()
    }
}
