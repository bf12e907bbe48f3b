#![allow(clippy::unwrap_used)]

mod support;

use exterm_cache::ResponseCache;
use exterm_core::*;
use exterm_memory::{Role, DIRECTORY_KEY, FILES_KEY};
use serde_json::json;
use std::sync::Arc;
use support::{entries, Harness};

#[tokio::test]
async fn test_list_files_is_executed_and_cached() {
    let harness = Harness::new(&[]);
    harness.oracle.push_decision(vec![Directive::execute("ls")]);
    harness.shell.push_success("a.txt\nb.txt\n");
    let mut engine = harness.engine();

    let report = engine.handle_turn("list files").await.unwrap();

    assert_eq!(report.source, DecisionSource::Oracle);
    assert!(report.dispatch.completed());

    let messages = engine.context().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "list files");
    assert_eq!(messages[2].role, Role::Assistant);
    assert!(messages[2].content.contains("a.txt\nb.txt\n"));

    assert_eq!(engine.cache().len().unwrap(), 1);
    let cached: Decision = engine.cache().get("list files").unwrap().unwrap();
    assert_eq!(cached.directives, vec![Directive::execute("ls")]);
}

#[tokio::test]
async fn test_cache_hit_skips_oracle() {
    let harness = Harness::new(&[]);
    harness.oracle.push_decision(vec![Directive::execute("ls")]);
    let mut engine = harness.engine();

    engine.handle_turn("list files").await.unwrap();
    let report = engine.handle_turn("  LIST Files ").await.unwrap();

    assert_eq!(report.source, DecisionSource::Cache);
    assert_eq!(harness.oracle.decide_calls(), 1);
    assert_eq!(harness.shell.commands(), vec!["ls", "ls"]);
}

#[tokio::test]
async fn test_cached_decision_replays_even_when_stale() {
    let harness = Harness::new(&[]);
    harness
        .oracle
        .push_decision(vec![Directive::answer("there are no files")]);
    let mut engine = harness.engine();

    engine.handle_turn("how many files").await.unwrap();
    std::fs::write(harness.cwd.path().join("new.txt"), "").unwrap();
    let report = engine.handle_turn("how many files").await.unwrap();

    assert_eq!(report.source, DecisionSource::Cache);
    assert_eq!(
        report.decision.directives,
        vec![Directive::answer("there are no files")]
    );
    assert_eq!(engine.context().world_model()[FILES_KEY], json!(["new.txt"]));
}

#[tokio::test]
async fn test_no_cache_forces_oracle_and_refreshes_entry() {
    let harness = Harness::new(&[]);
    harness.oracle.push_decision(vec![Directive::execute("ls")]);
    harness.oracle.push_decision(vec![Directive::execute("ls -la")]);
    let mut engine = harness.engine();

    engine.handle_turn("list files").await.unwrap();
    let report = engine.handle_turn("list files --no-cache").await.unwrap();

    assert_eq!(report.source, DecisionSource::Oracle);
    assert_eq!(
        harness.oracle.decide_inputs.lock().unwrap().clone(),
        vec!["list files", "list files"]
    );
    assert_eq!(engine.context().messages()[3].content, "list files");

    let cached: Decision = engine.cache().get("list files").unwrap().unwrap();
    assert_eq!(cached.directives, vec![Directive::execute("ls -la")]);
    assert_eq!(engine.cache().len().unwrap(), 1);
}

#[tokio::test]
async fn test_unreadable_cache_entry_is_a_miss() {
    let harness = Harness::new(&[]);
    let cache = Arc::new(ResponseCache::in_memory().unwrap());
    cache
        .put("list files", &json!({"commands": ["MAYBE: ls"]}))
        .unwrap();
    harness.oracle.push_decision(vec![Directive::execute("ls")]);
    let mut engine = harness.engine_with_cache(cache);

    let report = engine.handle_turn("list files").await.unwrap();

    assert_eq!(report.source, DecisionSource::Oracle);
    let cached: Decision = engine.cache().get("list files").unwrap().unwrap();
    assert_eq!(cached.directives, vec![Directive::execute("ls")]);
}

#[tokio::test]
async fn test_delete_everything_declined() {
    let harness = Harness::new(&["n"]);
    harness
        .oracle
        .push_decision(vec![Directive::execute_confirm("rm -rf .")]);
    let mut engine = harness.engine();

    let report = engine.handle_turn("delete everything").await.unwrap();

    assert!(harness.shell.commands().is_empty());
    assert_eq!(report.dispatch.state(0), DirectiveState::Skipped);
    assert_eq!(engine.context().last().content, "SKIPPED: rm -rf .");
}

#[tokio::test]
async fn test_typo_is_repaired_in_flight() {
    let harness = Harness::new(&["y"]);
    harness
        .oracle
        .push_decision(vec![Directive::execute("catt file.txt")]);
    harness.oracle.push_patch(vec![Directive::execute("cat file.txt")]);
    harness.shell.push_failure(127, "catt: command not found");
    harness.shell.push_success("file contents\n");
    let mut engine = harness.engine();

    let report = engine.handle_turn("show file.txt").await.unwrap();

    assert!(report.dispatch.completed());
    assert_eq!(
        entries(engine.context()),
        vec![
            "show file.txt".to_string(),
            "COMMAND: cat file.txt\nOUTPUT: file contents\n".to_string(),
        ]
    );

    let requests = harness.oracle.repair_requests.lock().unwrap();
    assert_eq!(requests[0].last_entry.content, "show file.txt");

    // The cache keeps the oracle's first decision, not the patch.
    let cached: Decision = engine.cache().get("show file.txt").unwrap().unwrap();
    assert_eq!(cached.directives, vec![Directive::execute("catt file.txt")]);
}

#[tokio::test]
async fn test_oracle_failure_aborts_turn() {
    let harness = Harness::new(&[]);
    harness
        .oracle
        .push_decision_result(Err(OracleError::Schema("expected value".into())));
    let mut engine = harness.engine();

    let result = engine.handle_turn("do something").await;

    assert!(matches!(
        result,
        Err(EngineError::Oracle(OracleError::Schema(_)))
    ));
    assert!(harness.shell.commands().is_empty());
    assert!(engine.cache().is_empty().unwrap());
    assert_eq!(engine.context().last().content, "do something");
}

#[tokio::test]
async fn test_world_model_injection_and_merge() {
    let harness = Harness::new(&[]);
    std::fs::write(harness.cwd.path().join("b.txt"), "").unwrap();
    std::fs::write(harness.cwd.path().join("a.txt"), "").unwrap();
    let delta = json!({"project": "exterminal"}).as_object().cloned().unwrap();
    let decision = Decision::new(vec![Directive::answer("ok")]).with_world_model_delta(delta);
    harness.oracle.push_decision_result(Ok(decision));
    let mut engine = harness.engine();

    engine.handle_turn("remember the project").await.unwrap();

    let world = engine.context().world_model();
    assert_eq!(
        world[DIRECTORY_KEY],
        json!(harness.cwd.path().to_string_lossy())
    );
    assert_eq!(world[FILES_KEY], json!(["a.txt", "b.txt"]));
    assert_eq!(world["project"], json!("exterminal"));

    engine.reset();
    assert!(engine.context().is_empty());
    assert!(engine.context().world_model().is_empty());
}

#[tokio::test]
async fn test_transcript_stays_within_budget() {
    let harness = Harness::new(&[]);
    for _ in 0..5 {
        harness
            .oracle
            .push_decision(vec![Directive::answer("x".repeat(200))]);
    }
    let budget = SYSTEM_PROMPT.len() + 600;
    let mut engine = harness.engine().with_context_budget(budget);

    for i in 0..5 {
        engine
            .handle_turn(&format!("question number {}", i))
            .await
            .unwrap();
    }

    let context = engine.context();
    assert_eq!(context.messages()[0].role, Role::System);
    assert_eq!(context.messages()[0].content, SYSTEM_PROMPT);
    // The newest question made it in before trimming.
    assert!(entries(context).contains(&"question number 4".to_string()));
    assert!(!entries(context).contains(&"question number 0".to_string()));
}

#[tokio::test]
async fn test_modifier_only_input_is_ignored() {
    let harness = Harness::new(&[]);
    harness.oracle.push_decision(vec![Directive::NoInfo]);
    let mut engine = harness.engine();

    let result = engine.handle_turn("  --no-cache ").await;

    assert!(matches!(result, Err(EngineError::EmptyInput)));
    assert_eq!(harness.oracle.decide_calls(), 0);
    assert!(engine.context().is_empty());
    assert!(engine.context().world_model().is_empty());
    assert!(engine.cache().is_empty().unwrap());
}
