//! Compilation orchestrator
//!
//! Drives one run end to end and summarises it in a [`CompilationReport`].
//! Each run owns a fresh [`CompilationContext`]; nothing outlives it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use banyan_foundation::ArtifactKind;
use tracing::{debug, error, info, warn};

use crate::Diagnostic;
use crate::backend::backend_for;
use crate::config::CompilerConfig;
use crate::context::CompilationContext;
use crate::emitter::DarEmitter;
use crate::frontend::validate_library;
use crate::outcome::{CompilationRoot, OutcomeBuilder};
use crate::source::SourceLibrary;

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilationState {
    Running,
    Failed,
    Completed,
}

/// Wall-clock time spent in each phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    pub validation: Duration,
    pub backend: Duration,
    pub closure: Duration,
    pub emission: Duration,
}

impl PhaseTimings {
    pub fn total(&self) -> Duration {
        self.validation + self.backend + self.closure + self.emission
    }
}

/// Summary of one compilation run.
#[derive(Debug, Clone)]
pub struct CompilationReport {
    pub root: CompilationRoot,
    pub state: CompilationState,
    pub diagnostics: Vec<Diagnostic>,
    /// Source documents per kind.
    pub source_counts: BTreeMap<ArtifactKind, usize>,
    /// Successfully compiled artifacts per kind.
    pub compiled_counts: BTreeMap<ArtifactKind, usize>,
    pub reachable_count: usize,
    pub timings: PhaseTimings,
    /// The emitted DAR, when one was produced.
    pub archive: Option<PathBuf>,
}

impl CompilationReport {
    fn new(root: CompilationRoot, library: &SourceLibrary) -> Self {
        Self {
            root,
            state: CompilationState::Running,
            diagnostics: Vec::new(),
            source_counts: library.counts(),
            compiled_counts: BTreeMap::new(),
            reachable_count: 0,
            timings: PhaseTimings::default(),
            archive: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == CompilationState::Completed
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn compiled_total(&self) -> usize {
        self.compiled_counts.values().sum()
    }

    /// Diagnostics one per line.
    pub fn format_diagnostics(&self) -> String {
        self.diagnostics
            .iter()
            .map(|d| format!("{d}\n"))
            .collect()
    }

    fn fail(mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
        self.diagnostics.extend(diagnostics);
        self.state = CompilationState::Failed;
        error!(root = %self.root, errors = self.errors().count(), "compilation failed");
        self
    }
}

/// Run every backend compiler over the library, in compilation order.
///
/// A document that fails to compile is reported as a warning and skipped;
/// whatever was registered before it stays registered. Whether the failure
/// matters is decided later by the closure: a skipped artifact that is
/// reachable from the root surfaces as a missing dependency.
pub fn compile_library(
    library: &SourceLibrary,
    ctx: &mut CompilationContext,
) -> (BTreeMap<ArtifactKind, usize>, Vec<Diagnostic>) {
    let mut compiled = BTreeMap::new();
    let mut diagnostics = Vec::new();

    for kind in ArtifactKind::COMPILATION_ORDER {
        let backend = backend_for(kind);
        for unit in library.of_kind(kind) {
            let result = backend
                .compile(&unit.content, ctx)
                .and_then(|artifact| ctx.register(artifact));
            match result {
                Ok(()) => *compiled.entry(kind).or_insert(0) += 1,
                Err(err) => {
                    warn!(kind = %kind, id = %unit.id, error = %err, "backend compilation failed");
                    diagnostics.push(Diagnostic::warning(err.to_string()).with_origin(unit.origin.clone()));
                }
            }
        }
        debug!(kind = %kind, compiled = compiled.get(&kind).copied().unwrap_or(0), "kind compiled");
    }

    (compiled, diagnostics)
}

/// Entry point for a full compilation run.
pub struct Orchestrator;

impl Orchestrator {
    /// Validate, compile, close over `root` and emit a DAR.
    pub fn run(
        library: &SourceLibrary,
        root: CompilationRoot,
        config: &CompilerConfig,
    ) -> CompilationReport {
        let mut report = CompilationReport::new(root.clone(), library);
        info!(root = %root, sources = library.len(), "compilation started");

        if let Err(err) = config.validate() {
            return report.fail([Diagnostic::error(err.to_string())]);
        }

        let started = Instant::now();
        let validation = validate_library(library);
        report.timings.validation = started.elapsed();
        if validation.iter().any(Diagnostic::is_error) {
            return report.fail(validation);
        }
        report.diagnostics.extend(validation);

        let started = Instant::now();
        let mut ctx = CompilationContext::new();
        let (compiled, backend_diagnostics) = compile_library(library, &mut ctx);
        report.compiled_counts = compiled;
        report.diagnostics.extend(backend_diagnostics);
        ctx.freeze();
        report.timings.backend = started.elapsed();

        let started = Instant::now();
        let outcome = OutcomeBuilder::new(&ctx, root).build();
        report.timings.closure = started.elapsed();
        report.reachable_count = outcome.reachable_count();
        if !outcome.is_success() {
            return report.fail(outcome.diagnostics());
        }

        let started = Instant::now();
        let emitted = DarEmitter::new(&config.output_dir).emit(&outcome);
        report.timings.emission = started.elapsed();
        match emitted {
            Ok(path) => report.archive = Some(path),
            Err(err) => return report.fail([Diagnostic::error(err.to_string())]),
        }

        report.state = CompilationState::Completed;
        info!(
            root = %report.root,
            compiled = report.compiled_total(),
            reachable = report.reachable_count,
            elapsed_ms = report.timings.total().as_millis() as u64,
            "compilation completed"
        );
        report
    }
}
