//! Integration tests for end-to-end Banyan compilation and evaluation.
//!
//! These tests verify the full pipeline:
//! Sources → Compile → Close → Emit DAR → Load → Evaluate

use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use banyan_compiler::orchestrator::compile_library;
use banyan_compiler::{
    CompilationContext, CompilationState, DarEmitter, OutcomeBuilder, SourceLibrary,
};
use banyan_foundation::dar::MANIFEST_FILE;
use banyan_foundation::ArtifactKind;
use banyan_runtime::{
    DarId, DarLoader, DarRuntimeStore, Error, EvidenceTypeKey, RulesetKey, StoreConfig,
};
use banyan_tests::{challenge_root, compile, fixtures, TestHarness};
use serde_json::json;

/// Login scenario: compile bottom-up, close over `c1`, load, evaluate `rs1`.
#[test]
fn test_login_scenario_end_to_end() {
    let harness = TestHarness::login();

    let report = harness.report();
    assert_eq!(report.state, CompilationState::Completed);
    assert_eq!(report.compiled_total(), 5);
    // The evidence type is compiled but nothing reachable references it.
    assert_eq!(report.reachable_count, 4);
    assert_eq!(harness.context().len(), 4);

    assert!(harness.evaluate("rs1", json!({"count": 5})).unwrap());
    assert!(!harness.evaluate("rs1", json!({"count": 2})).unwrap());
    match harness.evaluate("rs1", json!({})) {
        Err(Error::MissingEvidence(field)) => assert_eq!(field, "count"),
        other => panic!("expected missing evidence, got {other:?}"),
    }
}

/// Every reachable artifact survives emit + load unchanged.
#[test]
fn test_archive_round_trip() {
    let sources = [
        ("e", fixtures::LOGIN_ATTEMPT),
        ("r1", fixtures::RULE_R1_TYPED),
        ("rs1", fixtures::RULESET_RS1),
        ("t1", fixtures::TASK_T1),
        ("c1", fixtures::CHALLENGE_C1),
    ];
    let library = SourceLibrary::from_sources(sources).unwrap();
    let mut ctx = CompilationContext::new();
    let (_, diagnostics) = compile_library(&library, &mut ctx);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    ctx.freeze();

    let outcome = OutcomeBuilder::new(&ctx, challenge_root("c1")).build();
    assert!(outcome.is_success());

    let out = tempfile::tempdir().unwrap();
    let archive = DarEmitter::new(out.path()).emit(&outcome).unwrap();
    let loaded = DarLoader::load(&archive).unwrap();

    assert_eq!(loaded.len(), outcome.reachable_count());
    for original in outcome.reachable_artifacts() {
        let copy = loaded
            .artifact(original.kind(), original.id(), original.version())
            .unwrap_or_else(|| panic!("{} missing after load", original.reference()));
        assert_eq!(copy.id(), original.id());
        assert_eq!(copy.version(), original.version());
        assert_eq!(copy.kind(), original.kind());
        assert_eq!(copy.metadata(), original.metadata());
        assert_eq!(copy.payload(), original.payload());
        assert_eq!(copy.dependencies(), original.dependencies());
    }
    assert_eq!(loaded.header().root_id, "c1");
    assert_eq!(loaded.header().root_version, 1);
}

/// Challenge → Task → Ruleset → Rule → EvidenceType closes over all five.
#[test]
fn test_five_node_chain_closure() {
    let sources = [
        ("c1", fixtures::CHALLENGE_C1),
        ("t1", fixtures::TASK_T1),
        ("rs1", fixtures::RULESET_RS1),
        ("r1", fixtures::RULE_R1_TYPED),
        ("e", fixtures::LOGIN_ATTEMPT),
    ];
    let library = SourceLibrary::from_sources(sources).unwrap();
    let mut ctx = CompilationContext::new();
    compile_library(&library, &mut ctx);
    ctx.freeze();

    let builder = OutcomeBuilder::new(&ctx, challenge_root("c1"));
    let first = builder.build();
    let second = builder.build();

    assert!(first.is_success());
    assert_eq!(first.reachable_count(), 5);
    let order = |outcome: &banyan_compiler::CompilationOutcome<'_>| {
        outcome
            .reachable_artifacts()
            .map(|a| a.reference())
            .collect::<Vec<_>>()
    };
    assert_eq!(order(&first), order(&second));

    let harness = TestHarness::from_sources(&sources, challenge_root("c1"));
    assert_eq!(harness.report().reachable_count, 5);
    let evidence = harness
        .context()
        .evidence_type(&EvidenceTypeKey::new("LOGIN_ATTEMPT", 1))
        .unwrap();
    assert_eq!(evidence.required_fields().collect::<Vec<_>>(), ["count"]);
}

/// The archive holds one entry per reachable artifact plus the manifest.
#[test]
fn test_archive_layout() {
    let harness = TestHarness::login();
    let mut archive = zip::ZipArchive::new(File::open(harness.archive()).unwrap()).unwrap();

    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .filter(|name| !name.ends_with('/'))
        .collect();
    names.sort();

    assert_eq!(
        names,
        [
            "Challenge/1/c1.json",
            "Rule/1/r1.json",
            "Ruleset/1/rs1.json",
            "Task/1/t1.json",
            MANIFEST_FILE,
        ]
    );
}

/// A reachable artifact whose source is absent fails the run, and no archive
/// is written.
#[test]
fn test_missing_dependency_prevents_emission() {
    let sources = [
        ("t1", fixtures::TASK_T1),
        ("c1", fixtures::CHALLENGE_C1),
        ("r1", fixtures::RULE_R1),
    ];
    let (out, report) = compile(&sources, challenge_root("c1"));

    assert_eq!(report.state, CompilationState::Failed);
    assert!(report.archive.is_none());
    assert!(!out.path().join("compilation_package.dar").exists());
    assert!(
        report
            .errors()
            .any(|d| d.message.contains("Ruleset:rs1:1")),
        "{}",
        report.format_diagnostics()
    );
}

/// Ids that would act as paths never reach the archive.
#[test]
fn test_path_like_id_fails_compilation() {
    let escaping_rule = r#"{
        "kind": "Rule", "id": "x/../../y", "version": 1,
        "spec": {"input": "count", "operator": ">", "value": 3, "type": "THRESHOLD"}
    }"#;
    let challenge =
        r#"{"kind": "Challenge", "id": "x/../../y", "version": 1, "spec": {"tasks": []}}"#;
    let cases = [
        (ArtifactKind::Rule, escaping_rule),
        (ArtifactKind::Challenge, challenge),
    ];
    for (kind, text) in cases {
        let root = banyan_compiler::CompilationRoot::new(kind, "x/../../y", 1);
        let (out, report) = compile(&[("escape.json", text)], root);

        assert_eq!(report.state, CompilationState::Failed, "{kind}");
        assert!(report.archive.is_none());
        assert!(!out.path().join("compilation_package.dar").exists());
        assert!(
            report.errors().any(|d| d.message.contains("path separator")),
            "{}",
            report.format_diagnostics()
        );
    }

    // Without the frontend, the backend refuses the id and nothing is registered.
    let library = SourceLibrary::from_sources([("rule", escaping_rule)]).unwrap();
    let mut ctx = CompilationContext::new();
    let (_, diagnostics) = compile_library(&library, &mut ctx);
    assert!(ctx.is_empty());
    assert!(
        diagnostics.iter().any(|d| d.message.contains("x/../../y")),
        "{diagnostics:?}"
    );
}

/// Task actions fire on the ruleset result; the challenge lists every task.
#[test]
fn test_challenge_evaluation() {
    let harness = TestHarness::login();

    let outcome = harness.evaluate_challenge("c1", json!({"count": 5})).unwrap();
    assert!(outcome.passed());
    assert_eq!(outcome.tasks.len(), 1);
    assert_eq!(outcome.tasks[0].emitted, ["LOCK_ACCOUNT", "AUDIT"]);

    let outcome = harness.evaluate_challenge("c1", json!({"count": 2})).unwrap();
    assert!(!outcome.passed());
    assert_eq!(outcome.tasks[0].emitted, ["AUDIT"]);
}

/// Logical rulesets absorb missing evidence after a compile + load.
#[test]
fn test_logical_ruleset_absorbs_missing_evidence() {
    let rule_r2 = r#"{
        "kind": "Rule", "id": "r2", "version": 1,
        "spec": {"input": "status", "operator": "==", "value": "LOCKED", "type": "EQUALITY"}
    }"#;
    let ruleset_any = r#"{
        "kind": "Ruleset", "id": "rs1", "version": 1,
        "spec": {"expression": {"operator": "OR", "operands": [{"ruleRef": "r2"}, {"ruleRef": "r1"}]}}
    }"#;
    let ruleset_all = r#"{
        "kind": "Ruleset", "id": "rs2", "version": 1,
        "spec": {"expression": {"operator": "AND", "operands": [{"ruleRef": "r2"}, {"ruleRef": "r1"}]}}
    }"#;
    let task_t2 = r#"{
        "kind": "Task", "id": "t2", "version": 1,
        "spec": {"rulesetRef": {"id": "rs2", "version": 1}, "resultType": "BOOLEAN"}
    }"#;
    let challenge = r#"{
        "kind": "Challenge", "id": "c1", "version": 1,
        "spec": {"tasks": [{"id": "t1", "version": 1}, {"id": "t2", "version": 1}]}
    }"#;
    let sources = [
        ("r1", fixtures::RULE_R1),
        ("r2", rule_r2),
        ("rs1", ruleset_any),
        ("rs2", ruleset_all),
        ("t1", fixtures::TASK_T1),
        ("t2", task_t2),
        ("c1", challenge),
    ];
    let harness = TestHarness::from_sources(&sources, challenge_root("c1"));

    // OR: missing `status` is skipped, `count` decides.
    assert!(harness.evaluate("rs1", json!({"count": 5})).unwrap());
    assert!(!harness.evaluate("rs1", json!({"count": 1})).unwrap());
    // AND: missing `status` defeats the conjunction.
    assert!(!harness.evaluate("rs2", json!({"count": 5})).unwrap());
    assert!(harness
        .evaluate("rs2", json!({"count": 5, "status": "LOCKED"}))
        .unwrap());
    // A type error is never absorbed.
    assert!(matches!(
        harness.evaluate("rs1", json!({"count": "five"})),
        Err(Error::InvalidEvidenceType { .. })
    ));
}

/// Loaded archives are shared through the runtime store.
#[test]
fn test_runtime_store_serves_loaded_archives() {
    let harness = TestHarness::login();
    let store = DarRuntimeStore::new(StoreConfig {
        max_entries: 1,
        time_to_idle: Duration::from_secs(60),
    })
    .unwrap();

    let login = DarId::new("login", 1);
    store.load(login.clone(), harness.archive()).unwrap();
    let context = store.get(&login).unwrap();
    assert_eq!(context.root_key().id, "c1");

    let evaluator = banyan_runtime::Evaluator::new(Arc::clone(&context));
    let evidence = banyan_runtime::EvidenceContext::from_json(&json!({"count": 4})).unwrap();
    assert!(evaluator
        .evaluate(&RulesetKey::new("rs1", 1), &evidence)
        .unwrap());

    // A second archive pushes the first out of a single-entry store.
    let other = DarId::new("other", 1);
    store.load(other.clone(), harness.archive()).unwrap();
    assert!(matches!(store.get(&login), Err(Error::DarNotLoaded(id)) if id == login));
    assert!(store.get(&other).is_ok());

    assert!(store.unload(&other));
    assert!(store.is_empty());
}

/// Compiling from a directory on disk gives the same result as from memory.
#[test]
fn test_compile_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in fixtures::login_scenario() {
        let path = dir.path().join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }
    let library = SourceLibrary::from_dir(dir.path()).unwrap();
    assert_eq!(library.len(), 5);
    assert_eq!(library.of_kind(ArtifactKind::EvidenceType).len(), 1);

    let out = tempfile::tempdir().unwrap();
    let report = banyan_compiler::Orchestrator::run(
        &library,
        challenge_root("c1"),
        &banyan_compiler::CompilerConfig::with_output_dir(out.path()),
    );
    assert!(report.is_success(), "{}", report.format_diagnostics());
    assert_eq!(report.reachable_count, 4);
}
