//! Batch lifecycle: reset clears transient state and keeps the compiled network

use trine_core::*;

fn engine_with_rules() -> ReteEngine {
    let mut engine = ReteEngine::new();
    engine
        .compile_all(&[
            RuleDefinition::new("colleague")
                .with_condition(Condition::vars("?x", "knows", "?y"))
                .with_condition(Condition::with_constant("?y", "worksAt", "acme"))
                .with_select(["?x"]),
            RuleDefinition::new("resident")
                .with_condition(Condition::vars("?p", "livesIn", "?city"))
                .with_select(["?p", "?city"]),
        ])
        .unwrap();
    engine
}

#[test]
fn test_reset_empties_touched_memories() {
    let mut engine = engine_with_rules();
    engine
        .evaluate([Fact::new("alice", "knows", "bob"), Fact::new("bob", "worksAt", "acme")])
        .unwrap();
    let production = engine.production_node("colleague").unwrap();
    assert_eq!(engine.tokens_in(production).unwrap().len(), 1);
    let nodes_before = engine.network().nodes().len();

    engine.evaluate(Vec::new()).unwrap();

    assert!(engine.satisfied_rule_names().is_empty());
    assert!(engine.alpha_memory("knows").unwrap().is_empty());
    assert!(engine.alpha_memory("worksAt acme").unwrap().is_empty());
    assert!(engine.tokens_in(production).unwrap().is_empty());
    assert_eq!(engine.network().nodes().len(), nodes_before);
    assert_eq!(engine.registered_rule_count(), 2);
}

#[test]
fn test_consecutive_batches_are_independent() {
    let mut engine = engine_with_rules();

    let first = engine
        .evaluate([Fact::new("alice", "knows", "bob"), Fact::new("bob", "worksAt", "acme")])
        .unwrap();
    assert_eq!(first.rule_names().into_iter().collect::<Vec<_>>(), vec!["colleague"]);

    let second = engine.evaluate([Fact::new("carol", "livesIn", "paris")]).unwrap();
    assert_eq!(second.rule_names().into_iter().collect::<Vec<_>>(), vec!["resident"]);
    assert_eq!(engine.bindings_for("colleague").unwrap(), None);

    // facts of the first batch are forgotten, not carried over
    let third = engine.evaluate([Fact::new("bob", "worksAt", "acme")]).unwrap();
    assert!(third.is_empty());
}

#[test]
fn test_duplicate_dedup_is_per_batch() {
    let mut engine = engine_with_rules();
    engine.evaluate([Fact::new("carol", "livesIn", "paris")]).unwrap();

    let again = engine.evaluate([Fact::new("carol", "livesIn", "paris")]).unwrap();
    assert!(again.is_satisfied("resident"));
}

#[test]
fn test_unknown_rule_query() {
    let mut engine = engine_with_rules();
    engine.evaluate([Fact::new("carol", "livesIn", "paris")]).unwrap();

    assert_eq!(
        engine.bindings_for("nobody").unwrap_err(),
        ReteError::UnknownRule { rule_name: "nobody".to_string() }
    );
    assert!(!engine.is_rule_registered("nobody"));
    assert!(engine.is_rule_registered("resident"));
}

#[test]
fn test_stats_track_current_batch() {
    let mut engine = engine_with_rules();
    engine
        .evaluate([
            Fact::new("alice", "knows", "bob"),
            Fact::new("bob", "worksAt", "acme"),
            Fact::new("carol", "livesIn", "paris"),
        ])
        .unwrap();

    let stats = engine.stats();
    assert_eq!(stats.facts, 3);
    assert_eq!(stats.satisfied_rules, 2);
    assert_eq!(stats.tokens, 3);
    assert!(stats.to_string().contains("Satisfied: 2"));
}
