//! Network visualization
//!
//! Renders the compiled network as a Graphviz DOT graph plus a plain-text legend. Node
//! vertices are named `n<id>` after their arena index and alpha memories `a<id>`, so the
//! legend and the `NodeId`s reported elsewhere line up.
//!
//! Export only reads the network; it is diagnostic tooling and plays no part in matching.

use crate::rete_network::ReteNetwork;
use crate::rete_nodes::{ReteNode, TokenMemory};
use anyhow::Context;
use std::fmt::Write as _;
use std::io;
use tracing::{debug, instrument};

/// Escape a label for use inside a double-quoted DOT string
fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Generate the Graphviz description of the network
pub fn render_graph(network: &ReteNetwork) -> anyhow::Result<String> {
    let mut dot = String::new();

    writeln!(dot, "digraph ReteNetwork {{")?;
    writeln!(dot, "  rankdir=TB;")?;
    writeln!(dot, "  node [shape=box, style=rounded];")?;

    for memory in network.pattern_index().iter() {
        writeln!(
            dot,
            "  a{} [label=\"α {}\", shape=ellipse, fillcolor=lightyellow, style=filled];",
            memory.id,
            escape(&memory.pattern)
        )?;
    }

    for (id, node) in network.nodes().iter().enumerate() {
        let (label, color) = match node {
            ReteNode::DummyTop(_) => ("top".to_string(), "lightgray"),
            ReteNode::Join(join) => (format!("join {}", join.condition), "lightblue"),
            ReteNode::BetaMemory(_) => ("β".to_string(), "lightgreen"),
            ReteNode::Production(production) => {
                (format!("P {}", production.rule_name), "orange")
            }
        };
        writeln!(
            dot,
            "  n{id} [label=\"{id}: {}\", fillcolor={color}, style=\"rounded,filled\"];",
            escape(&label)
        )?;
    }

    for (id, node) in network.nodes().iter().enumerate() {
        for child in node.children() {
            writeln!(dot, "  n{id} -> n{child};")?;
        }
    }

    for memory in network.pattern_index().iter() {
        for join in &memory.successors {
            writeln!(dot, "  a{} -> n{join} [style=dashed];", memory.id)?;
        }
    }

    writeln!(dot, "}}")?;
    Ok(dot)
}

/// Generate the plain-text legend, one line per node and alpha memory
pub fn render_legend(network: &ReteNetwork) -> anyhow::Result<String> {
    let mut legend = String::new();

    writeln!(legend, "Nodes")?;
    for (id, node) in network.nodes().iter().enumerate() {
        write!(legend, "  n{id} {}", node.kind_name())?;
        match node {
            ReteNode::DummyTop(_) => {}
            ReteNode::Join(join) => {
                write!(legend, " {} via a{}", join.condition, join.alpha_memory)?;
                if !join.tests.is_empty() {
                    let tests: Vec<String> = join.tests.iter().map(ToString::to_string).collect();
                    write!(legend, " tests [{}]", tests.join(", "))?;
                }
            }
            ReteNode::BetaMemory(memory) => {
                write!(legend, " tokens={}", memory.token_list().len())?;
            }
            ReteNode::Production(production) => {
                write!(
                    legend,
                    " rule={} conditions={} select=[{}]",
                    production.rule_name,
                    production.condition_count,
                    production.select.join(", ")
                )?;
            }
        }
        writeln!(legend)?;
    }

    writeln!(legend, "Alpha memories")?;
    for memory in network.pattern_index().iter() {
        write!(legend, "  a{} \"{}\" facts={}", memory.id, memory.pattern, memory.len())?;
        if !memory.excluded_objects.is_empty() {
            let excluded: Vec<String> =
                memory.excluded_objects.iter().map(ToString::to_string).collect();
            write!(legend, " excluding [{}]", excluded.join(", "))?;
        }
        writeln!(legend)?;
    }

    Ok(legend)
}

/// Write the graph and legend to two caller-supplied sinks
#[instrument(skip_all)]
pub fn export_graph(
    network: &ReteNetwork,
    graph_sink: &mut dyn io::Write,
    legend_sink: &mut dyn io::Write,
) -> anyhow::Result<()> {
    let graph = render_graph(network)?;
    let legend = render_legend(network)?;

    graph_sink.write_all(graph.as_bytes()).context("Failed to write network graph")?;
    graph_sink.flush().context("Failed to flush network graph")?;
    legend_sink.write_all(legend.as_bytes()).context("Failed to write network legend")?;
    legend_sink.flush().context("Failed to flush network legend")?;

    debug!(graph_bytes = graph.len(), legend_bytes = legend.len(), "Exported network graph");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Condition, PatternTerm, RuleDefinition};

    fn sample_network() -> ReteNetwork {
        let mut network = ReteNetwork::new();
        network
            .add_rule_definition(
                &RuleDefinition::new("R2")
                    .with_condition(Condition::vars("?x", "knows", "?y"))
                    .with_condition(Condition::with_constant("?y", "worksAt", "acme"))
                    .with_not_same_term(PatternTerm::var("?y"), PatternTerm::constant("bob"))
                    .with_select(["?x"]),
            )
            .unwrap();
        network
    }

    #[test]
    fn test_graph_has_every_node_and_edge() {
        let dot = render_graph(&sample_network()).unwrap();
        assert!(dot.starts_with("digraph ReteNetwork {"));
        for vertex in ["n0 [", "n1 [", "n2 [", "n3 [", "n4 [", "a0 [", "a1 ["] {
            assert!(dot.contains(vertex), "missing {vertex} in {dot}");
        }
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.contains("n3 -> n4;"));
        assert!(dot.contains("a0 -> n1 [style=dashed];"));
        assert!(dot.contains("a1 -> n3 [style=dashed];"));
        assert!(dot.contains("P R2"));
    }

    #[test]
    fn test_labels_are_escaped() {
        assert_eq!(escape("worksAt \"acme\""), "worksAt \\\"acme\\\"");
    }

    #[test]
    fn test_legend_describes_tests_and_exclusions() {
        let legend = render_legend(&sample_network()).unwrap();
        assert!(legend.contains("n3 join (?y worksAt acme) via a1 tests [?y: subject = object^1]"));
        assert!(legend.contains("n4 production rule=R2 conditions=2 select=[?x]"));
        assert!(legend.contains("a0 \"knows\" facts=0 excluding [bob]"));
    }

    #[test]
    fn test_export_writes_both_sinks() {
        let network = sample_network();
        let mut graph = Vec::new();
        let mut legend = Vec::new();
        export_graph(&network, &mut graph, &mut legend).unwrap();

        assert!(String::from_utf8(graph).unwrap().contains("digraph"));
        assert!(String::from_utf8(legend).unwrap().starts_with("Nodes"));
    }
}
