use crate::alpha_memory::AlphaMemory;
use crate::config::ReteConfig;
use crate::conflict_resolution::RuleScore;
use crate::error::{ReteError, ReteResult};
use crate::rete_network::{Bindings, NetworkStats, ReteNetwork};
use crate::rule_visualization;
use crate::types::{Fact, NodeId, RuleDefinition, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use tracing::{debug, info, instrument};

/// Bindings of every rule satisfied by one batch, keyed by rule name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub rules: HashMap<String, Bindings>,
}

impl MatchResult {
    pub fn is_satisfied(&self, rule_name: &str) -> bool {
        self.rules.contains_key(rule_name)
    }

    pub fn bindings_for(&self, rule_name: &str) -> Option<&Bindings> {
        self.rules.get(rule_name)
    }

    /// Satisfied rule names in sorted order
    pub fn rule_names(&self) -> BTreeSet<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Compiles rules once and evaluates many fact batches against them
///
/// One batch at a time: `evaluate` takes `&mut self`, and post-evaluation queries read the
/// state it left behind until the next call.
#[derive(Debug)]
pub struct ReteEngine {
    network: ReteNetwork,
    config: ReteConfig,
}

impl Default for ReteEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReteEngine {
    /// Create an engine with default limits
    pub fn new() -> Self {
        info!("Creating new Trine engine");
        Self { network: ReteNetwork::new(), config: ReteConfig::default() }
    }

    /// Create an engine with explicit limits
    #[instrument]
    pub fn with_config(config: ReteConfig) -> ReteResult<Self> {
        config.validate()?;
        info!("Creating Trine engine with custom configuration");

        let mut network = ReteNetwork::new();
        network.set_log_duplicate_facts(config.log_duplicate_facts);
        Ok(Self { network, config })
    }

    pub fn config(&self) -> &ReteConfig {
        &self.config
    }

    /// Compile one rule into the network
    ///
    /// Compiling the same name twice builds a second production path; name-based queries
    /// then resolve to the newer one.
    #[instrument(skip(self, rule), fields(rule = %rule.name))]
    pub fn compile(&mut self, rule: &RuleDefinition) -> ReteResult<NodeId> {
        if rule.name.len() > self.config.max_rule_name_length {
            return Err(ReteError::limit(
                format!("rule name of {} is too long", rule.name),
                self.config.max_rule_name_length,
                rule.name.len(),
            ));
        }
        if rule.conditions.len() > self.config.max_conditions_per_rule {
            return Err(ReteError::limit(
                format!("rule {} has too many conditions", rule.name),
                self.config.max_conditions_per_rule,
                rule.conditions.len(),
            ));
        }

        self.network.add_rule_definition(rule)
    }

    /// Compile several rules, stopping at the first rejected one
    #[instrument(skip(self, rules))]
    pub fn compile_all<'a, I>(&mut self, rules: I) -> ReteResult<()>
    where
        I: IntoIterator<Item = &'a RuleDefinition>,
    {
        let mut compiled = 0usize;
        for rule in rules {
            self.compile(rule)?;
            compiled += 1;
        }
        info!(rule_count = compiled, "Compiled rule set");
        Ok(())
    }

    /// Reset per-batch state, insert every fact, and collect bindings of satisfied rules
    ///
    /// A batch over the configured limit is rejected before any state is touched, so the
    /// previous batch's results stay queryable.
    #[instrument(skip(self, facts))]
    pub fn evaluate<I>(&mut self, facts: I) -> ReteResult<MatchResult>
    where
        I: IntoIterator<Item = Fact>,
    {
        let facts: Vec<Fact> = facts.into_iter().collect();
        if facts.len() > self.config.max_facts_per_batch {
            return Err(ReteError::limit(
                "fact batch is too large",
                self.config.max_facts_per_batch,
                facts.len(),
            ));
        }

        self.network.reset();

        let submitted = facts.len();
        let mut inserted = 0usize;
        for fact in facts {
            if self.network.add_fact(fact)? {
                inserted += 1;
            }
        }

        let mut result = MatchResult::default();
        for rule_name in self.network.satisfied_rule_names() {
            if let Some(bindings) = self.network.bindings(&rule_name)? {
                result.rules.insert(rule_name, bindings);
            }
        }

        debug!(stats = %self.network.stats(), "Batch state after evaluation");
        info!(
            facts_submitted = submitted,
            facts_inserted = inserted,
            rules_satisfied = result.len(),
            "Completed fact batch"
        );
        Ok(result)
    }

    // ------------------------------------------------------------------------
    // Post-evaluation queries, valid until the next `evaluate`
    // ------------------------------------------------------------------------

    pub fn satisfied_rule_names(&self) -> BTreeSet<String> {
        self.network.satisfied_rule_names()
    }

    /// Strictly most specific satisfied rule; a tie is an ambiguous-conflict error
    pub fn most_specific_rule_name(&self) -> ReteResult<Option<String>> {
        self.network.most_specific_rule_name()
    }

    pub fn rule_scores(&self) -> ReteResult<Vec<RuleScore>> {
        self.network.rule_scores()
    }

    /// Bindings of a rule in the current batch; `Ok(None)` when it is not satisfied
    pub fn bindings_for(&self, rule_name: &str) -> ReteResult<Option<Bindings>> {
        self.network.bindings(rule_name)
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    pub fn is_rule_registered(&self, rule_name: &str) -> bool {
        self.network.is_rule_registered(rule_name)
    }

    pub fn registered_rule_count(&self) -> usize {
        self.network.registered_rule_count()
    }

    pub fn alpha_memory(&self, pattern: &str) -> Option<&AlphaMemory> {
        self.network.pattern_index().lookup(pattern)
    }

    pub fn production_node(&self, rule_name: &str) -> Option<NodeId> {
        self.network.production_node(rule_name)
    }

    pub fn children_of(&self, node: NodeId) -> ReteResult<&[NodeId]> {
        self.network.children_of(node)
    }

    pub fn tokens_in(&self, node: NodeId) -> ReteResult<Vec<TokenId>> {
        self.network.tokens_in(node)
    }

    pub fn stats(&self) -> NetworkStats {
        self.network.stats()
    }

    pub fn network(&self) -> &ReteNetwork {
        &self.network
    }

    /// Write a Graphviz description of the network and a plain-text legend
    #[instrument(skip_all)]
    pub fn export_graph(
        &self,
        graph_sink: &mut dyn Write,
        legend_sink: &mut dyn Write,
    ) -> anyhow::Result<()> {
        rule_visualization::export_graph(&self.network, graph_sink, legend_sink)
    }
}
