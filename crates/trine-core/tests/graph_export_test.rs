//! Diagnostic export of the compiled network

use trine_core::*;

#[test]
fn test_export_graph_and_legend() {
    let mut engine = ReteEngine::new();
    engine
        .compile(
            &RuleDefinition::new("colleague")
                .with_condition(Condition::vars("?x", "knows", "?y"))
                .with_condition(Condition::with_constant("?y", "worksAt", "acme")),
        )
        .unwrap();
    engine
        .compile(
            &RuleDefinition::new("quoted \"name\"")
                .with_condition(Condition::vars("?x", "knows", "?y")),
        )
        .unwrap();

    let mut graph = Vec::new();
    let mut legend = Vec::new();
    engine.export_graph(&mut graph, &mut legend).unwrap();

    let graph = String::from_utf8(graph).unwrap();
    let legend = String::from_utf8(legend).unwrap();

    assert!(graph.starts_with("digraph ReteNetwork {"));
    assert!(graph.trim_end().ends_with('}'));
    assert!(graph.contains("P quoted \\\"name\\\""));
    assert_eq!(graph.matches(" -> ").count(), 5 + 2);

    let node_lines = legend.lines().filter(|line| line.trim_start().starts_with('n')).count();
    assert_eq!(node_lines, engine.network().nodes().len());
    assert!(legend.contains("Alpha memories"));
    assert!(legend.contains("\"worksAt acme\""));
}

#[test]
fn test_export_does_not_disturb_batch_state() {
    let mut engine = ReteEngine::new();
    engine
        .compile(&RuleDefinition::new("R1").with_condition(Condition::vars("?x", "knows", "?y")))
        .unwrap();
    engine.evaluate([Fact::new("alice", "knows", "bob")]).unwrap();
    let before = engine.stats();

    let mut graph = Vec::new();
    let mut legend = Vec::new();
    engine.export_graph(&mut graph, &mut legend).unwrap();

    assert_eq!(engine.stats(), before);
    assert!(String::from_utf8(legend).unwrap().contains("facts=1"));
}
