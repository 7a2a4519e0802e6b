//! Most-specific rule selection across satisfied rules

use trine_core::*;

fn knows() -> Condition {
    Condition::vars("?x", "knows", "?y")
}

fn works_at_acme() -> Condition {
    Condition::with_constant("?y", "worksAt", "acme")
}

#[test]
fn test_more_matched_conditions_wins() {
    let mut engine = ReteEngine::new();
    engine.compile(&RuleDefinition::new("general").with_condition(knows())).unwrap();
    engine
        .compile(
            &RuleDefinition::new("specific")
                .with_condition(knows())
                .with_condition(works_at_acme()),
        )
        .unwrap();

    engine
        .evaluate([Fact::new("alice", "knows", "bob"), Fact::new("bob", "worksAt", "acme")])
        .unwrap();

    assert_eq!(engine.satisfied_rule_names().len(), 2);
    assert_eq!(engine.most_specific_rule_name().unwrap(), Some("specific".to_string()));
    let scores = engine.rule_scores().unwrap();
    assert_eq!(scores[0], RuleScore { rule_name: "specific".to_string(), score: 1 });
    assert_eq!(scores[1], RuleScore { rule_name: "general".to_string(), score: 0 });
}

#[test]
fn test_equal_specificity_is_ambiguous() {
    let mut engine = ReteEngine::new();
    engine
        .compile(
            &RuleDefinition::new("acme")
                .with_condition(knows())
                .with_condition(works_at_acme()),
        )
        .unwrap();
    engine
        .compile(
            &RuleDefinition::new("paris")
                .with_condition(knows())
                .with_condition(Condition::with_constant("?y", "livesIn", "paris")),
        )
        .unwrap();

    engine
        .evaluate([
            Fact::new("alice", "knows", "bob"),
            Fact::new("bob", "worksAt", "acme"),
            Fact::new("bob", "livesIn", "paris"),
        ])
        .unwrap();

    let err = engine.most_specific_rule_name().unwrap_err();
    assert_eq!(
        err,
        ReteError::AmbiguousConflict {
            rules: vec!["acme".to_string(), "paris".to_string()],
            score: 1
        }
    );
    assert!(err.is_recoverable());
    // the match itself stays inspectable
    assert_eq!(engine.satisfied_rule_names().len(), 2);
    assert!(engine.bindings_for("acme").unwrap().is_some());
}

#[test]
fn test_single_satisfied_rule_is_most_specific() {
    let mut engine = ReteEngine::new();
    engine.compile(&RuleDefinition::new("general").with_condition(knows())).unwrap();
    engine
        .compile(
            &RuleDefinition::new("specific")
                .with_condition(knows())
                .with_condition(works_at_acme()),
        )
        .unwrap();

    engine.evaluate([Fact::new("alice", "knows", "bob")]).unwrap();
    assert_eq!(engine.most_specific_rule_name().unwrap(), Some("general".to_string()));
}

#[test]
fn test_nothing_satisfied() {
    let mut engine = ReteEngine::new();
    engine.compile(&RuleDefinition::new("general").with_condition(knows())).unwrap();
    engine.evaluate(Vec::new()).unwrap();

    assert_eq!(engine.most_specific_rule_name().unwrap(), None);
    assert!(engine.rule_scores().unwrap().is_empty());
}
