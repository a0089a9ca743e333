//! Frontend validation
//!
//! Per-kind semantic checks run before any backend compiler sees a
//! document. Units are independent, so the library is validated in
//! parallel; diagnostics come back in library order regardless of
//! scheduling.

mod semantics;

pub use semantics::{
    ChallengeValidator, EvidenceTypeValidator, RuleValidator, RulesetValidator, TaskValidator,
};

use banyan_foundation::{ArtifactKind, validate_id};
use rayon::prelude::*;
use tracing::debug;

use crate::Diagnostic;
use crate::source::{SourceLibrary, SourceUnit};

/// A semantic validator for one kind of source document.
pub trait Validator: Send + Sync {
    /// Human-readable problems with `unit`. Empty when valid.
    fn validate(&self, unit: &SourceUnit) -> Vec<String>;
}

/// The validator responsible for `kind`.
pub fn validator_for(kind: ArtifactKind) -> &'static dyn Validator {
    match kind {
        ArtifactKind::EvidenceType => &EvidenceTypeValidator,
        ArtifactKind::Rule => &RuleValidator,
        ArtifactKind::Ruleset => &RulesetValidator,
        ArtifactKind::Task => &TaskValidator,
        ArtifactKind::Challenge => &ChallengeValidator,
    }
}

/// Validate one unit, attributing every message to its origin.
///
/// The id is checked for every kind before the per-kind validator runs.
pub fn validate_unit(unit: &SourceUnit) -> Vec<Diagnostic> {
    let identity = validate_id(&unit.id).err().map(|err| err.to_string());
    identity
        .into_iter()
        .chain(validator_for(unit.kind).validate(unit))
        .map(|message| {
            Diagnostic::error(format!("{} {:?}: {message}", unit.kind, unit.id))
                .with_origin(unit.origin.clone())
        })
        .collect()
}

/// Validate every unit of the library in parallel.
pub fn validate_library(library: &SourceLibrary) -> Vec<Diagnostic> {
    let units: Vec<&SourceUnit> = library.units().collect();
    let per_unit: Vec<Vec<Diagnostic>> = units.par_iter().map(|unit| validate_unit(unit)).collect();

    let diagnostics: Vec<Diagnostic> = per_unit.into_iter().flatten().collect();
    debug!(
        units = units.len(),
        diagnostics = diagnostics.len(),
        "frontend validation finished"
    );
    diagnostics
}
