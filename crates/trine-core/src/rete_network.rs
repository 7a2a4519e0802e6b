//! RETE Network Construction and Execution
//!
//! The network owns every node, alpha memory, token and per-batch fact in arenas addressed
//! by integer handles. All mutation of transient state (matched facts, tokens, satisfied
//! rules) happens here, through the activation functions, so that [`ReteNetwork::reset`]
//! knows exactly which memories a batch touched.
//!
//! ## Activation
//!
//! ```text
//! Fact ─► PatternIndex ─► AlphaMemory ─► Right(join, fact)
//!                                            │ tests pass for each left token
//!                                            ▼
//!                           new Token ─► BetaMemory ─► Left(memory, token)
//!                                    └─► Production (rule satisfied)
//! ```
//!
//! Activations are queued and drained iteratively. A token is stored in its memory as soon
//! as it is created, before its own left activation runs, so every (token, fact) pair meets
//! at least once: whichever of the two arrives last performs the join.

use crate::alpha_memory::PatternIndex;
use crate::beta_network::{DUMMY_TOKEN, TokenArena};
use crate::error::{ReteError, ReteResult};
use crate::node_sharing::{self, NodeSharingStats};
use crate::rete_nodes::{
    BetaMemoryNode, DummyTopNode, FieldType, JoinNode, ProductionNode, ReteNode, TestAtJoinNode,
    TokenMemory,
};
use crate::types::{
    AlphaMemoryId, Condition, Fact, FactId, NodeId, RuleDefinition, Term, TokenId,
};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info, instrument, trace, warn};

/// Handle of the dummy top node
pub const DUMMY_TOP: NodeId = 0;

/// Variable name to bound value for one satisfied rule
pub type Bindings = HashMap<String, Term>;

#[derive(Debug, Clone, Copy)]
enum Activation {
    /// A fact entered the alpha memory of a join node
    Right { join: NodeId, fact: FactId },
    /// A token entered a beta memory
    Left { memory: NodeId, token: TokenId },
}

/// Validated compilation plan for one rule
#[derive(Debug)]
struct RulePlan {
    tests: Vec<Vec<TestAtJoinNode>>,
    exclusions: BTreeMap<String, BTreeSet<Term>>,
}

/// Snapshot of network size and per-batch state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub alpha_memories: usize,
    pub join_nodes: usize,
    pub beta_memories: usize,
    pub production_nodes: usize,
    pub tokens: usize,
    pub facts: usize,
    pub satisfied_rules: usize,
    pub sharing: NodeSharingStats,
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Nodes: α:{} J:{} β:{} P:{}, Tokens: {}, Facts: {}, Satisfied: {}",
            self.alpha_memories,
            self.join_nodes,
            self.beta_memories,
            self.production_nodes,
            self.tokens,
            self.facts,
            self.satisfied_rules
        )
    }
}

/// Compiled discrimination network with its per-batch matching state
#[derive(Debug)]
pub struct ReteNetwork {
    /// Node arena; slot 0 is the dummy top node
    nodes: Vec<ReteNode>,
    /// Alpha layer
    pattern_index: PatternIndex,
    /// Tokens of the current batch
    tokens: TokenArena,
    /// Facts of the current batch, in insertion order
    working_memory: Vec<Fact>,
    /// Per-batch deduplication of facts
    seen_facts: AHashMap<Fact, FactId>,
    /// Per-batch deduplication of tokens by (memory, parent token, fact)
    token_index: AHashSet<(NodeId, TokenId, FactId)>,
    /// Production nodes in compilation order
    productions: Vec<NodeId>,
    /// Most recently compiled production for each rule name
    rules_by_name: AHashMap<String, NodeId>,
    /// Rules satisfied in the current batch
    satisfied: AHashMap<String, NodeId>,
    /// Alpha memories that received facts since the last reset
    mutated_alpha_memories: AHashSet<AlphaMemoryId>,
    /// Beta memories and production nodes that received tokens since the last reset
    mutated_token_memories: AHashSet<NodeId>,
    /// Pending activations
    pending: Vec<Activation>,
    sharing: NodeSharingStats,
    log_duplicate_facts: bool,
}

impl Default for ReteNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl ReteNetwork {
    pub fn new() -> Self {
        Self {
            nodes: vec![ReteNode::DummyTop(DummyTopNode::default())],
            pattern_index: PatternIndex::new(),
            tokens: TokenArena::new(),
            working_memory: Vec::new(),
            seen_facts: AHashMap::new(),
            token_index: AHashSet::new(),
            productions: Vec::new(),
            rules_by_name: AHashMap::new(),
            satisfied: AHashMap::new(),
            mutated_alpha_memories: AHashSet::new(),
            mutated_token_memories: AHashSet::new(),
            pending: Vec::new(),
            sharing: NodeSharingStats::default(),
            log_duplicate_facts: true,
        }
    }

    /// Control whether ignored duplicate facts emit a debug event
    pub fn set_log_duplicate_facts(&mut self, enabled: bool) {
        self.log_duplicate_facts = enabled;
    }

    // ========================================================================
    // NETWORK COMPILATION
    // ========================================================================

    /// Compile a rule into the network, sharing every node an earlier rule already built
    ///
    /// The rule is validated completely before any node is created, so a rejected rule
    /// leaves the network untouched. Returns the new production node.
    #[instrument(skip(self, rule), fields(rule = %rule.name))]
    pub fn add_rule_definition(&mut self, rule: &RuleDefinition) -> ReteResult<NodeId> {
        let plan = Self::plan_rule(rule)?;

        if self.rules_by_name.contains_key(&rule.name) {
            warn!(rule = %rule.name, "Rule name already registered; the new definition shadows it");
        }

        let mut current = DUMMY_TOP;
        for (index, (condition, tests)) in rule.conditions.iter().zip(plan.tests).enumerate() {
            if index > 0 {
                current = self.build_or_share_beta_memory(current)?;
            }

            let exclusions = condition
                .object_variable()
                .and_then(|variable| plan.exclusions.get(variable))
                .cloned()
                .unwrap_or_default();
            let alpha_memory = self.build_or_share_alpha_memory(condition, exclusions);
            current = self.build_or_share_join(current, alpha_memory, tests, condition)?;
        }

        let production = self.push_node(ReteNode::Production(ProductionNode::new(
            current,
            rule.name.clone(),
            rule.select.clone(),
            rule.conditions.len(),
        )));
        self.attach_child(current, production)?;
        self.productions.push(production);
        self.rules_by_name.insert(rule.name.clone(), production);

        info!(
            rule = %rule.name,
            conditions = rule.conditions.len(),
            production = production,
            "Rule compiled into network"
        );
        Ok(production)
    }

    /// Validate a rule and derive its join tests and object exclusions
    fn plan_rule(rule: &RuleDefinition) -> ReteResult<RulePlan> {
        if rule.name.is_empty() {
            return Err(ReteError::RuleDefinition {
                message: "rule name must not be empty".to_string(),
                rule_name: None,
                condition_index: None,
            });
        }
        if rule.conditions.is_empty() {
            return Err(ReteError::rule_definition(&rule.name, "rule has no conditions"));
        }
        for (index, condition) in rule.conditions.iter().enumerate() {
            if !condition.subject.is_variable() {
                return Err(ReteError::condition(
                    &rule.name,
                    index,
                    format!("subject of {condition} must be a variable"),
                ));
            }
        }

        let is_bound = |variable: &str| rule.conditions.iter().any(|c| c.binds(variable));

        let mut exclusions: BTreeMap<String, BTreeSet<Term>> = BTreeMap::new();
        for constraint in &rule.not_same_terms {
            let (variable, term) = constraint.variable_and_constant().ok_or_else(|| {
                ReteError::rule_definition(
                    &rule.name,
                    format!("{constraint} must pair a variable with a constant term"),
                )
            })?;
            if !is_bound(variable) {
                return Err(ReteError::rule_definition(
                    &rule.name,
                    format!("{constraint} constrains {variable}, which no condition binds"),
                ));
            }
            if !rule.conditions.iter().any(|c| c.object_variable() == Some(variable)) {
                warn!(
                    rule = %rule.name,
                    variable = %variable,
                    "Exclusion on a variable that never appears as an object has no effect"
                );
            }
            exclusions.entry(variable.to_string()).or_default().insert(term.clone());
        }

        for variable in &rule.select {
            if !is_bound(variable) {
                return Err(ReteError::rule_definition(
                    &rule.name,
                    format!("selected variable {variable} is not bound by any condition"),
                ));
            }
        }

        let tests = (0..rule.conditions.len())
            .map(|index| Self::join_tests(&rule.conditions, index))
            .collect::<ReteResult<Vec<_>>>()
            .map_err(|e| match e {
                ReteError::RuleDefinition { message, .. } => {
                    ReteError::rule_definition(&rule.name, message)
                }
                other => other,
            })?;

        Ok(RulePlan { tests, exclusions })
    }

    /// Join tests for condition `index` against the nearest earlier binder of each variable
    fn join_tests(conditions: &[Condition], index: usize) -> ReteResult<Vec<TestAtJoinNode>> {
        let condition = &conditions[index];
        let candidates = [
            (condition.subject_variable(), FieldType::Subject),
            (condition.object_variable(), FieldType::Object),
        ];

        let mut tests = Vec::new();
        for (variable, arg1_field) in candidates {
            let Some(variable) = variable else { continue };
            if let Some((levels_up, arg2_field)) = Self::nearest_binder(conditions, index, variable)
            {
                tests.push(TestAtJoinNode::new(variable, arg1_field, levels_up, arg2_field)?);
            }
        }
        Ok(tests)
    }

    fn nearest_binder(
        conditions: &[Condition],
        index: usize,
        variable: &str,
    ) -> Option<(usize, FieldType)> {
        conditions[..index].iter().rev().enumerate().find_map(|(distance, earlier)| {
            if earlier.subject_variable() == Some(variable) {
                Some((distance + 1, FieldType::Subject))
            } else if earlier.object_variable() == Some(variable) {
                Some((distance + 1, FieldType::Object))
            } else {
                None
            }
        })
    }

    fn build_or_share_alpha_memory(
        &mut self,
        condition: &Condition,
        exclusions: BTreeSet<Term>,
    ) -> AlphaMemoryId {
        let before = self.pattern_index.len();
        let id =
            self.pattern_index.build_or_share(&condition.predicate, &condition.object, exclusions);
        if self.pattern_index.len() > before {
            self.sharing.alpha_memories_created += 1;
        } else {
            self.sharing.alpha_shares_found += 1;
        }
        id
    }

    fn build_or_share_join(
        &mut self,
        parent: NodeId,
        alpha_memory: AlphaMemoryId,
        tests: Vec<TestAtJoinNode>,
        condition: &Condition,
    ) -> ReteResult<NodeId> {
        if let Some(existing) =
            node_sharing::find_shared_join(&self.nodes, parent, alpha_memory, &tests, condition)
        {
            self.sharing.join_shares_found += 1;
            debug!(join = existing, condition = %condition, "Sharing join node");
            return Ok(existing);
        }

        let id = self.push_node(ReteNode::Join(JoinNode {
            alpha_memory,
            tests,
            condition: condition.clone(),
            parent,
            children: Vec::new(),
        }));
        self.attach_child(parent, id)?;
        self.pattern_index
            .get_mut(alpha_memory)
            .ok_or_else(|| ReteError::network(id, "join node refers to a missing alpha memory"))?
            .add_successor(id);
        self.sharing.join_nodes_created += 1;
        debug!(join = id, parent = parent, condition = %condition, "Created join node");
        Ok(id)
    }

    fn build_or_share_beta_memory(&mut self, parent: NodeId) -> ReteResult<NodeId> {
        if let Some(existing) = node_sharing::find_beta_memory_child(&self.nodes, parent) {
            self.sharing.beta_shares_found += 1;
            debug!(beta_memory = existing, "Sharing beta memory");
            return Ok(existing);
        }

        let id = self.push_node(ReteNode::BetaMemory(BetaMemoryNode::new(parent)));
        self.attach_child(parent, id)?;
        self.sharing.beta_memories_created += 1;
        debug!(beta_memory = id, parent = parent, "Created beta memory");
        Ok(id)
    }

    fn push_node(&mut self, node: ReteNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    fn attach_child(&mut self, parent: NodeId, child: NodeId) -> ReteResult<()> {
        self.nodes
            .get_mut(parent)
            .and_then(ReteNode::children_mut)
            .ok_or_else(|| ReteError::network(parent, "node cannot have children"))?
            .push(child);
        Ok(())
    }

    // ========================================================================
    // FACT INSERTION AND ACTIVATION
    // ========================================================================

    /// Insert a fact into the current batch and propagate it through the network
    ///
    /// Returns `false` when the fact was already inserted in this batch; the duplicate is
    /// ignored.
    pub fn add_fact(&mut self, fact: Fact) -> ReteResult<bool> {
        if self.seen_facts.contains_key(&fact) {
            if self.log_duplicate_facts {
                debug!(fact = %fact, "Ignoring duplicate fact");
            }
            return Ok(false);
        }

        let fact_id = self.working_memory.len();
        let memories: Vec<AlphaMemoryId> = self.pattern_index.matching_memories(&fact).collect();
        self.seen_facts.insert(fact.clone(), fact_id);
        self.working_memory.push(fact);

        if memories.is_empty() {
            trace!(fact = fact_id, "Fact matches no pattern");
            return Ok(true);
        }

        for id in memories {
            let memory = self
                .pattern_index
                .get_mut(id)
                .ok_or_else(|| ReteError::network(id, "pattern index returned a missing memory"))?;
            memory.push_fact(fact_id);
            self.mutated_alpha_memories.insert(id);
            for &join in &memory.successors {
                self.pending.push(Activation::Right { join, fact: fact_id });
            }
        }

        self.drain_activations()?;
        Ok(true)
    }

    fn drain_activations(&mut self) -> ReteResult<()> {
        while let Some(activation) = self.pending.pop() {
            trace!(?activation, "Activating");
            match activation {
                Activation::Right { join, fact } => self.right_activate(join, fact)?,
                Activation::Left { memory, token } => self.left_activate(memory, token)?,
            }
        }
        Ok(())
    }

    /// New fact against every token held by the join's left input
    fn right_activate(&mut self, join_id: NodeId, fact: FactId) -> ReteResult<()> {
        let matching: Vec<TokenId> = {
            let join = self.join_node(join_id)?;
            let left_tokens: Vec<TokenId> = match self.node(join.parent)? {
                ReteNode::DummyTop(_) => vec![DUMMY_TOKEN],
                ReteNode::BetaMemory(memory) => memory.token_list().to_vec(),
                _ => {
                    return Err(ReteError::network(
                        join.parent,
                        "join node parent is neither the network root nor a beta memory",
                    ));
                }
            };
            left_tokens
                .into_iter()
                .filter(|&token| self.perform_join_tests(&join.tests, token, fact))
                .collect()
        };

        for token in matching {
            self.emit_token(join_id, token, fact)?;
        }
        Ok(())
    }

    /// New token in a beta memory against the facts of every child join's alpha memory
    fn left_activate(&mut self, memory_id: NodeId, token: TokenId) -> ReteResult<()> {
        let children = self.node(memory_id)?.children().to_vec();
        for join_id in children {
            let matching: Vec<FactId> = {
                let join = self.join_node(join_id)?;
                let alpha_memory = self.pattern_index.get(join.alpha_memory).ok_or_else(|| {
                    ReteError::network(join_id, "join node refers to a missing alpha memory")
                })?;
                alpha_memory
                    .statements()
                    .filter(|&fact| self.perform_join_tests(&join.tests, token, fact))
                    .collect()
            };

            for fact in matching {
                self.emit_token(join_id, token, fact)?;
            }
        }
        Ok(())
    }

    /// Evaluate join tests for a left token and a candidate fact
    ///
    /// The dummy token passes trivially. A test whose binding site is the dummy token (or
    /// lies beyond the chain) is unconstrained and passes as well.
    fn perform_join_tests(&self, tests: &[TestAtJoinNode], token: TokenId, fact: FactId) -> bool {
        let Some(left) = self.tokens.get(token) else { return false };
        if left.is_dummy() {
            return true;
        }
        let Some(new_fact) = self.working_memory.get(fact) else { return false };

        tests.iter().all(|test| {
            let arg1 = test.arg1_field.of(new_fact);
            // the left token is already one level up from the token being built
            let bound = self
                .tokens
                .ancestor(token, test.levels_up.saturating_sub(1))
                .and_then(|id| self.tokens.get(id))
                .and_then(|ancestor| ancestor.fact)
                .and_then(|id| self.working_memory.get(id));
            match bound {
                Some(bound) => arg1 == test.arg2_field.of(bound),
                None => true,
            }
        })
    }

    /// Hand a successful (token, fact) join to every token memory below the join node
    fn emit_token(&mut self, join_id: NodeId, parent: TokenId, fact: FactId) -> ReteResult<()> {
        let (children, subject_variable, object_variable) = {
            let join = self.join_node(join_id)?;
            (
                join.children.clone(),
                join.condition.subject_variable().map(str::to_string),
                join.condition.object_variable().map(str::to_string),
            )
        };

        for child in children {
            if !self.token_index.insert((child, parent, fact)) {
                trace!(memory = child, parent, fact, "Redundant token ignored");
                continue;
            }

            let token =
                self.tokens.push(parent, fact, subject_variable.clone(), object_variable.clone());
            self.nodes
                .get_mut(child)
                .and_then(ReteNode::as_token_memory_mut)
                .ok_or_else(|| ReteError::network(child, "join child is not a token memory"))?
                .token_list_mut()
                .push(token);
            self.mutated_token_memories.insert(child);

            match &self.nodes[child] {
                ReteNode::Production(production) => {
                    debug!(rule = %production.rule_name, token, "Rule satisfied");
                    self.tokens.mark_satisfaction_chain(token);
                    self.satisfied.insert(production.rule_name.clone(), child);
                }
                _ => self.pending.push(Activation::Left { memory: child, token }),
            }
        }
        Ok(())
    }

    // ========================================================================
    // BATCH LIFECYCLE
    // ========================================================================

    /// Clear per-batch state touched since the previous reset
    ///
    /// The compiled structure is never torn down; only matched facts, tokens, satisfied
    /// rules and the fact deduplication set are cleared.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        debug!(
            alpha_memories = self.mutated_alpha_memories.len(),
            token_memories = self.mutated_token_memories.len(),
            "Resetting batch state"
        );

        self.satisfied.clear();
        for id in self.mutated_alpha_memories.drain() {
            if let Some(memory) = self.pattern_index.get_mut(id) {
                memory.clear();
            }
        }
        for id in self.mutated_token_memories.drain() {
            if let Some(memory) = self.nodes.get_mut(id).and_then(ReteNode::as_token_memory_mut) {
                memory.token_list_mut().clear();
            }
        }
        self.tokens.clear();
        self.token_index.clear();
        self.seen_facts.clear();
        self.working_memory.clear();
        self.pending.clear();
    }

    // ========================================================================
    // RESULTS
    // ========================================================================

    /// Names of the rules satisfied in the current batch
    pub fn satisfied_rule_names(&self) -> BTreeSet<String> {
        self.satisfied.keys().cloned().collect()
    }

    /// Satisfied rules with their production nodes
    pub fn satisfied_productions(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.satisfied.iter().map(|(name, &id)| (name.as_str(), id))
    }

    /// Bindings of one satisfying token chain, restricted to the rule's select list
    ///
    /// Returns `Ok(None)` when the rule is registered but not satisfied. When several chains
    /// satisfy the rule, the one whose facts in condition order sort first is reported, so the
    /// result does not depend on insertion order. When a variable is bound more than once
    /// along the chain, the most recent binding wins.
    pub fn bindings(&self, rule_name: &str) -> ReteResult<Option<Bindings>> {
        let production_id = self
            .satisfied
            .get(rule_name)
            .or_else(|| self.rules_by_name.get(rule_name))
            .copied()
            .ok_or_else(|| ReteError::UnknownRule { rule_name: rule_name.to_string() })?;
        let production = self.production(production_id)?;
        let Some(token) = production
            .tokens()
            .map(|token| (token, self.chain_facts(token)))
            .min_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(token, _)| token)
        else {
            return Ok(None);
        };

        let mut bindings = Bindings::new();
        for (_, link) in self.tokens.chain(token) {
            let Some(fact) = link.fact.and_then(|id| self.working_memory.get(id)) else {
                continue;
            };
            let positions = [
                (link.subject_variable.as_ref(), &fact.subject),
                (link.object_variable.as_ref(), &fact.object),
            ];
            for (variable, value) in positions {
                if let Some(variable) = variable {
                    if production.select.contains(variable) {
                        bindings.entry(variable.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
        }
        Ok(Some(bindings))
    }

    /// Facts matched along a token chain, first condition first
    fn chain_facts(&self, token: TokenId) -> Vec<&Fact> {
        let mut facts: Vec<&Fact> = self
            .tokens
            .chain(token)
            .filter_map(|(_, link)| link.fact)
            .filter_map(|id| self.working_memory.get(id))
            .collect();
        facts.reverse();
        facts
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    pub fn is_rule_registered(&self, rule_name: &str) -> bool {
        self.rules_by_name.contains_key(rule_name)
    }

    /// Number of compiled production nodes
    pub fn registered_rule_count(&self) -> usize {
        self.productions.len()
    }

    /// Production node most recently compiled under a name
    pub fn production_node(&self, rule_name: &str) -> Option<NodeId> {
        self.rules_by_name.get(rule_name).copied()
    }

    pub fn productions(&self) -> &[NodeId] {
        &self.productions
    }

    pub fn node(&self, id: NodeId) -> ReteResult<&ReteNode> {
        self.nodes.get(id).ok_or_else(|| ReteError::network(id, "no such node"))
    }

    pub fn nodes(&self) -> &[ReteNode] {
        &self.nodes
    }

    pub fn children_of(&self, id: NodeId) -> ReteResult<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    pub fn join_node(&self, id: NodeId) -> ReteResult<&JoinNode> {
        match self.node(id)? {
            ReteNode::Join(join) => Ok(join),
            other => Err(ReteError::network(
                id,
                format!("expected join node, found {}", other.kind_name()),
            )),
        }
    }

    pub fn production(&self, id: NodeId) -> ReteResult<&ProductionNode> {
        match self.node(id)? {
            ReteNode::Production(production) => Ok(production),
            other => Err(ReteError::network(
                id,
                format!("expected production node, found {}", other.kind_name()),
            )),
        }
    }

    /// Tokens held by a beta memory or production node, most recent first
    pub fn tokens_in(&self, id: NodeId) -> ReteResult<Vec<TokenId>> {
        let memory = self
            .node(id)?
            .as_token_memory()
            .ok_or_else(|| ReteError::network(id, "node does not hold tokens"))?;
        Ok(memory.tokens().collect())
    }

    pub fn pattern_index(&self) -> &PatternIndex {
        &self.pattern_index
    }

    pub fn token_arena(&self) -> &TokenArena {
        &self.tokens
    }

    /// Fact of the current batch by handle
    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.working_memory.get(id)
    }

    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            alpha_memories: self.pattern_index.len(),
            tokens: self.tokens.len(),
            facts: self.working_memory.len(),
            satisfied_rules: self.satisfied.len(),
            sharing: self.sharing.clone(),
            ..NetworkStats::default()
        };
        for node in &self.nodes {
            match node {
                ReteNode::Join(_) => stats.join_nodes += 1,
                ReteNode::BetaMemory(_) => stats.beta_memories += 1,
                ReteNode::Production(_) => stats.production_nodes += 1,
                ReteNode::DummyTop(_) => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PatternTerm;

    fn fact(s: &str, p: &str, o: &str) -> Fact {
        Fact::new(s, p, o)
    }

    fn knows_works_at() -> RuleDefinition {
        RuleDefinition::new("R2")
            .with_condition(Condition::vars("?x", "knows", "?y"))
            .with_condition(Condition::with_constant("?y", "worksAt", "acme"))
            .with_select(["?x"])
    }

    #[test]
    fn test_join_tests_point_at_nearest_binder() {
        let conditions = vec![
            Condition::vars("?x", "knows", "?y"),
            Condition::vars("?y", "worksAt", "?z"),
            Condition::vars("?z", "locatedIn", "?y"),
        ];

        assert!(ReteNetwork::join_tests(&conditions, 0).unwrap().is_empty());

        let second = ReteNetwork::join_tests(&conditions, 1).unwrap();
        assert_eq!(
            second,
            vec![TestAtJoinNode::new("?y", FieldType::Subject, 1, FieldType::Object).unwrap()]
        );

        let third = ReteNetwork::join_tests(&conditions, 2).unwrap();
        assert_eq!(
            third,
            vec![
                TestAtJoinNode::new("?z", FieldType::Subject, 1, FieldType::Object).unwrap(),
                TestAtJoinNode::new("?y", FieldType::Object, 1, FieldType::Subject).unwrap(),
            ]
        );
    }

    #[test]
    fn test_join_tests_skip_past_unrelated_conditions() {
        let conditions = vec![
            Condition::vars("?x", "knows", "?y"),
            Condition::vars("?a", "likes", "?b"),
            Condition::vars("?x", "age", "?n"),
        ];
        let tests = ReteNetwork::join_tests(&conditions, 2).unwrap();
        assert_eq!(
            tests,
            vec![TestAtJoinNode::new("?x", FieldType::Subject, 2, FieldType::Subject).unwrap()]
        );
    }

    #[test]
    fn test_compile_builds_alternating_chain() {
        let mut network = ReteNetwork::new();
        let production = network.add_rule_definition(&knows_works_at()).unwrap();

        let first_join = network.children_of(DUMMY_TOP).unwrap()[0];
        assert!(network.join_node(first_join).is_ok());
        let beta = network.children_of(first_join).unwrap()[0];
        assert!(matches!(network.node(beta).unwrap(), ReteNode::BetaMemory(_)));
        let second_join = network.children_of(beta).unwrap()[0];
        assert_eq!(network.children_of(second_join).unwrap(), &[production]);
        assert_eq!(network.production(production).unwrap().rule_name, "R2");
    }

    #[test]
    fn test_invalid_rule_leaves_network_untouched() {
        let mut network = ReteNetwork::new();
        let rule = RuleDefinition::new("bad")
            .with_condition(Condition::vars("?x", "knows", "?y"))
            .with_condition(Condition::new(
                PatternTerm::constant("alice"),
                "knows",
                PatternTerm::var("?z"),
            ));

        let err = network.add_rule_definition(&rule).unwrap_err();
        assert!(matches!(err, ReteError::RuleDefinition { condition_index: Some(1), .. }));
        assert_eq!(network.nodes().len(), 1);
        assert!(network.pattern_index().is_empty());
        assert!(!network.is_rule_registered("bad"));
    }

    #[test]
    fn test_right_then_left_activation() {
        let mut network = ReteNetwork::new();
        network.add_rule_definition(&knows_works_at()).unwrap();

        assert!(network.add_fact(fact("bob", "worksAt", "acme")).unwrap());
        assert!(network.satisfied_rule_names().is_empty());
        assert!(network.add_fact(fact("alice", "knows", "bob")).unwrap());

        let bindings = network.bindings("R2").unwrap().unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings["?x"], Term::resource("alice"));
    }

    #[test]
    fn test_join_test_rejects_inconsistent_binding() {
        let mut network = ReteNetwork::new();
        network.add_rule_definition(&knows_works_at()).unwrap();

        network.add_fact(fact("alice", "knows", "bob")).unwrap();
        network.add_fact(fact("carol", "worksAt", "acme")).unwrap();
        assert!(network.satisfied_rule_names().is_empty());
        assert_eq!(network.bindings("R2").unwrap(), None);
    }

    #[test]
    fn test_duplicate_fact_is_ignored() {
        let mut network = ReteNetwork::new();
        network.add_rule_definition(&knows_works_at()).unwrap();

        assert!(network.add_fact(fact("alice", "knows", "bob")).unwrap());
        assert!(!network.add_fact(fact("alice", "knows", "bob")).unwrap());
        assert_eq!(network.stats().facts, 1);
        assert_eq!(network.stats().tokens, 1);
    }

    #[test]
    fn test_reset_clears_batch_state_only() {
        let mut network = ReteNetwork::new();
        let production = network.add_rule_definition(&knows_works_at()).unwrap();
        network.add_fact(fact("alice", "knows", "bob")).unwrap();
        network.add_fact(fact("bob", "worksAt", "acme")).unwrap();
        let nodes_before = network.nodes().len();

        network.reset();

        assert!(network.satisfied_rule_names().is_empty());
        assert!(network.tokens_in(production).unwrap().is_empty());
        assert!(network.pattern_index().iter().all(|memory| memory.is_empty()));
        assert_eq!(network.nodes().len(), nodes_before);
        assert_eq!(network.stats().tokens, 0);
        assert!(network.add_fact(fact("alice", "knows", "bob")).unwrap());
    }

    #[test]
    fn test_unknown_rule_bindings() {
        let network = ReteNetwork::new();
        assert!(matches!(network.bindings("missing"), Err(ReteError::UnknownRule { .. })));
    }

    #[test]
    fn test_bindings_keep_most_recent_value_per_variable() {
        let mut network = ReteNetwork::new();
        let rule = RuleDefinition::new("chain")
            .with_condition(Condition::vars("?x", "knows", "?y"))
            .with_condition(Condition::vars("?y", "knows", "?z"))
            .with_select(["?x", "?y", "?z"]);
        network.add_rule_definition(&rule).unwrap();

        network.add_fact(fact("alice", "knows", "bob")).unwrap();
        network.add_fact(fact("bob", "knows", "carol")).unwrap();

        let bindings = network.bindings("chain").unwrap().unwrap();
        assert_eq!(bindings["?x"], Term::resource("alice"));
        assert_eq!(bindings["?y"], Term::resource("bob"));
        assert_eq!(bindings["?z"], Term::resource("carol"));
    }

    #[test]
    fn test_bindings_report_lowest_chain_among_several_matches() {
        let rule = RuleDefinition::new("R1")
            .with_condition(Condition::vars("?x", "knows", "?y"))
            .with_select(["?x", "?y"]);
        let facts = [fact("carol", "knows", "dave"), fact("alice", "knows", "bob")];

        for ordered in [facts.clone(), [facts[1].clone(), facts[0].clone()]] {
            let mut network = ReteNetwork::new();
            let production = network.add_rule_definition(&rule).unwrap();
            for item in ordered {
                network.add_fact(item).unwrap();
            }

            assert_eq!(network.tokens_in(production).unwrap().len(), 2);
            let bindings = network.bindings("R1").unwrap().unwrap();
            assert_eq!(bindings["?x"], Term::resource("alice"));
            assert_eq!(bindings["?y"], Term::resource("bob"));
        }
    }
}
