//! Integration test harness for Banyan.
//!
//! This crate provides utilities for end-to-end testing of the full
//! pipeline: Sources → Compile → Emit DAR → Load → Evaluate.

use std::path::Path;
use std::sync::Arc;

use banyan_compiler::{CompilationReport, CompilationRoot, CompilerConfig, Orchestrator, SourceLibrary};
use banyan_foundation::ArtifactKind;
use banyan_runtime::{
    ChallengeKey, ChallengeOutcome, DarLoader, DarRuntimeContext, Evaluator, EvidenceContext,
    RulesetKey,
};
use tempfile::TempDir;

/// Source documents of the login scenario.
pub mod fixtures {
    pub const LOGIN_ATTEMPT: &str = r#"{
        "kind": "EvidenceType", "id": "LOGIN_ATTEMPT", "version": 1,
        "spec": {"fields": [{"name": "count", "type": "INTEGER", "required": true}]}
    }"#;

    pub const RULE_R1: &str = r#"{
        "kind": "Rule", "id": "r1", "version": 1,
        "spec": {"input": "count", "operator": ">", "value": 3, "type": "THRESHOLD"}
    }"#;

    /// `r1` with a declared evidence type, closing the chain down to `LOGIN_ATTEMPT`.
    pub const RULE_R1_TYPED: &str = r#"{
        "kind": "Rule", "id": "r1", "version": 1,
        "spec": {
            "input": "count", "operator": ">", "value": 3, "type": "THRESHOLD",
            "evidenceTypeRef": {"id": "LOGIN_ATTEMPT", "version": 1}
        }
    }"#;

    pub const RULESET_RS1: &str = r#"{
        "kind": "Ruleset", "id": "rs1", "version": 1,
        "spec": {"ruleRef": "r1"}
    }"#;

    pub const TASK_T1: &str = r#"{
        "kind": "Task", "id": "t1", "version": 1,
        "spec": {
            "rulesetRef": {"id": "rs1", "version": 1},
            "resultType": "BOOLEAN",
            "actions": [{"on": "SUCCESS", "emit": "LOCK_ACCOUNT"}, {"on": "ALWAYS", "emit": "AUDIT"}]
        }
    }"#;

    pub const CHALLENGE_C1: &str = r#"{
        "kind": "Challenge", "id": "c1", "version": 1,
        "spec": {"tasks": [{"id": "t1", "version": 1}]}
    }"#;

    /// The five documents of the login scenario, named by origin.
    pub fn login_scenario() -> Vec<(&'static str, &'static str)> {
        vec![
            ("evidence/login_attempt.json", LOGIN_ATTEMPT),
            ("rules/r1.json", RULE_R1),
            ("rulesets/rs1.json", RULESET_RS1),
            ("tasks/t1.json", TASK_T1),
            ("challenges/c1.json", CHALLENGE_C1),
        ]
    }
}

/// The root every fixture scenario compiles towards.
pub fn challenge_root(id: &str) -> CompilationRoot {
    CompilationRoot::new(ArtifactKind::Challenge, id, 1)
}

/// Compile sources into a fresh temporary directory.
///
/// The directory is returned so the archive outlives the call.
pub fn compile(sources: &[(&str, &str)], root: CompilationRoot) -> (TempDir, CompilationReport) {
    let library = SourceLibrary::from_sources(sources.iter().copied())
        .unwrap_or_else(|e| panic!("invalid source document: {e}"));
    let out = tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
    let report = Orchestrator::run(&library, root, &CompilerConfig::with_output_dir(out.path()));
    (out, report)
}

/// Test harness holding a compiled and reloaded DAR.
pub struct TestHarness {
    // Keeps the archive on disk for the harness lifetime.
    _out: TempDir,
    report: CompilationReport,
    evaluator: Evaluator,
}

impl TestHarness {
    /// Compile `sources` towards `root`, then load the emitted archive.
    ///
    /// # Panics
    ///
    /// Panics if compilation fails or the archive cannot be loaded.
    pub fn from_sources(sources: &[(&str, &str)], root: CompilationRoot) -> Self {
        let (out, report) = compile(sources, root);
        if !report.is_success() {
            panic!("Compilation failed:\n{}", report.format_diagnostics());
        }
        let archive = report
            .archive
            .clone()
            .unwrap_or_else(|| panic!("no archive despite a successful compilation"));
        let context =
            DarLoader::load(&archive).unwrap_or_else(|e| panic!("failed to load DAR: {e}"));

        Self {
            _out: out,
            report,
            evaluator: Evaluator::new(Arc::new(context)),
        }
    }

    /// The login scenario compiled towards `c1`.
    pub fn login() -> Self {
        Self::from_sources(&fixtures::login_scenario(), challenge_root("c1"))
    }

    pub fn report(&self) -> &CompilationReport {
        &self.report
    }

    /// Path of the emitted archive.
    pub fn archive(&self) -> &Path {
        self.report
            .archive
            .as_deref()
            .unwrap_or_else(|| panic!("harness always holds an archive"))
    }

    pub fn context(&self) -> &DarRuntimeContext {
        self.evaluator.context()
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Evaluate ruleset `id` version 1 against JSON evidence.
    pub fn evaluate(&self, id: &str, evidence: serde_json::Value) -> banyan_runtime::Result<bool> {
        let evidence = EvidenceContext::from_json(&evidence)?;
        self.evaluator.evaluate(&RulesetKey::new(id, 1), &evidence)
    }

    /// Evaluate challenge `id` version 1 against JSON evidence.
    pub fn evaluate_challenge(
        &self,
        id: &str,
        evidence: serde_json::Value,
    ) -> banyan_runtime::Result<ChallengeOutcome> {
        let evidence = EvidenceContext::from_json(&evidence)?;
        self.evaluator
            .evaluate_challenge(&ChallengeKey::new(id, 1), &evidence)
    }
}
