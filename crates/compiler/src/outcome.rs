//! Dependency closure
//!
//! Computes the set of artifacts reachable from a compilation root through
//! declared dependencies. Traversal is breadth-first over the frozen
//! context. It never fails as a whole: unresolvable nodes become entries in
//! the outcome's error list and are not expanded, while their siblings are.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use banyan_foundation::{ArtifactKind, ArtifactReference, CompiledArtifact};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::Diagnostic;
use crate::context::CompilationContext;
use crate::error::CompilationError;

/// The artifact a closure is rooted at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompilationRoot {
    pub kind: ArtifactKind,
    pub id: String,
    pub version: u32,
}

impl CompilationRoot {
    pub fn new(kind: ArtifactKind, id: impl Into<String>, version: u32) -> Self {
        Self {
            kind,
            id: id.into(),
            version,
        }
    }

    pub fn reference(&self) -> ArtifactReference {
        ArtifactReference::new(self.kind, self.id.clone(), self.version)
    }
}

impl fmt::Display for CompilationRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.id, self.version)
    }
}

/// Result of a closure computation.
///
/// Borrows the artifacts from the context it was built from.
#[derive(Debug)]
pub struct CompilationOutcome<'ctx> {
    root: CompilationRoot,
    reachable: IndexMap<ArtifactReference, &'ctx CompiledArtifact>,
    errors: Vec<CompilationError>,
}

impl<'ctx> CompilationOutcome<'ctx> {
    pub fn root(&self) -> &CompilationRoot {
        &self.root
    }

    /// Success iff no error was recorded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Reachable artifacts in discovery (breadth-first) order.
    pub fn reachable_artifacts(&self) -> impl Iterator<Item = &'ctx CompiledArtifact> + '_ {
        self.reachable.values().copied()
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable.len()
    }

    pub fn contains(&self, reference: &ArtifactReference) -> bool {
        self.reachable.contains_key(reference)
    }

    pub fn get(&self, reference: &ArtifactReference) -> Option<&'ctx CompiledArtifact> {
        self.reachable.get(reference).copied()
    }

    pub fn errors(&self) -> &[CompilationError] {
        &self.errors
    }

    /// Errors rendered as diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors
            .iter()
            .map(|err| Diagnostic::error(err.to_string()))
            .collect()
    }
}

/// Builds a [`CompilationOutcome`] from a frozen context.
pub struct OutcomeBuilder<'ctx> {
    context: &'ctx CompilationContext,
    root: CompilationRoot,
}

impl<'ctx> OutcomeBuilder<'ctx> {
    pub fn new(context: &'ctx CompilationContext, root: CompilationRoot) -> Self {
        Self { context, root }
    }

    pub fn build(&self) -> CompilationOutcome<'ctx> {
        let mut outcome = CompilationOutcome {
            root: self.root.clone(),
            reachable: IndexMap::new(),
            errors: Vec::new(),
        };

        if !self.context.is_frozen() {
            outcome.errors.push(CompilationError::ContextNotFrozen {
                operation: "building the dependency closure",
            });
            return outcome;
        }

        let mut visited: HashSet<ArtifactReference> = HashSet::new();
        let mut queue: VecDeque<ArtifactReference> = VecDeque::new();
        queue.push_back(self.root.reference());

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }

            let artifact = match self.context.resolve_reference(&current) {
                Ok(artifact) => artifact,
                Err(err) => {
                    debug!(node = %current, "unresolved node in closure");
                    outcome.errors.push(err);
                    continue;
                }
            };

            trace!(node = %current, deps = artifact.dependencies().len(), "reached");
            for dependency in artifact.dependencies() {
                if !visited.contains(dependency) {
                    queue.push_back(dependency.clone());
                }
            }
            outcome.reachable.insert(current, artifact);
        }

        debug!(
            root = %self.root,
            reachable = outcome.reachable.len(),
            errors = outcome.errors.len(),
            "dependency closure built"
        );
        outcome
    }
}
