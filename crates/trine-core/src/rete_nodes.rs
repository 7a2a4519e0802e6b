//! Beta-network node kinds
//!
//! The network is a tree rooted at a single dummy top node. Join nodes alternate with beta
//! memories and every branch ends in a production node, one per compiled rule:
//!
//! ```text
//! DummyTop ─► Join(c1) ─► BetaMemory ─► Join(c2) ─► Production(R)
//!                     └─► Production(R')
//! ```
//!
//! Nodes live in an arena owned by [`crate::rete_network::ReteNetwork`] and refer to each
//! other by [`NodeId`].

use crate::error::{ReteError, ReteResult};
use crate::types::{AlphaMemoryId, Condition, Fact, NodeId, Term, TokenId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which position of a fact a join test reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Subject,
    Object,
}

impl FieldType {
    pub fn of<'a>(&self, fact: &'a Fact) -> &'a Term {
        match self {
            FieldType::Subject => &fact.subject,
            FieldType::Object => &fact.object,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Subject => write!(f, "subject"),
            FieldType::Object => write!(f, "object"),
        }
    }
}

/// Variable-consistency test between a new fact and an earlier binding in the token chain
///
/// `levels_up` counts links from the token a successful join would create: the left-input
/// token is one level up, its parent two levels up, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestAtJoinNode {
    pub variable: String,
    pub arg1_field: FieldType,
    pub levels_up: usize,
    pub arg2_field: FieldType,
}

impl TestAtJoinNode {
    pub fn new(
        variable: impl Into<String>,
        arg1_field: FieldType,
        levels_up: usize,
        arg2_field: FieldType,
    ) -> ReteResult<Self> {
        let variable = variable.into();
        if levels_up == 0 {
            return Err(ReteError::RuleDefinition {
                message: format!("join test for {variable} must look at least one level up"),
                rule_name: None,
                condition_index: None,
            });
        }
        Ok(Self { variable, arg1_field, levels_up, arg2_field })
    }
}

impl fmt::Display for TestAtJoinNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} = {}^{}",
            self.variable, self.arg1_field, self.arg2_field, self.levels_up
        )
    }
}

/// Root of the network; its single dummy token seeds the first join
#[derive(Debug, Clone, Default)]
pub struct DummyTopNode {
    pub children: Vec<NodeId>,
}

/// Tests facts from one alpha memory against tokens from its parent
#[derive(Debug, Clone)]
pub struct JoinNode {
    pub alpha_memory: AlphaMemoryId,
    pub tests: Vec<TestAtJoinNode>,
    pub condition: Condition,
    pub parent: NodeId,
    pub children: Vec<NodeId>,
}

impl JoinNode {
    /// Sharing key: alpha memory, tests and condition all equal
    pub fn shares_with(
        &self,
        alpha_memory: AlphaMemoryId,
        tests: &[TestAtJoinNode],
        condition: &Condition,
    ) -> bool {
        self.alpha_memory == alpha_memory && self.tests == tests && &self.condition == condition
    }
}

/// Partial matches accumulated up to one condition, shared by sibling joins
#[derive(Debug, Clone)]
pub struct BetaMemoryNode {
    pub parent: NodeId,
    pub children: Vec<NodeId>,
    tokens: Vec<TokenId>,
}

impl BetaMemoryNode {
    pub fn new(parent: NodeId) -> Self {
        Self { parent, children: Vec::new(), tokens: Vec::new() }
    }
}

/// Terminal node of one compiled rule
#[derive(Debug, Clone)]
pub struct ProductionNode {
    pub parent: NodeId,
    pub rule_name: String,
    pub select: Vec<String>,
    pub condition_count: usize,
    tokens: Vec<TokenId>,
}

impl ProductionNode {
    pub fn new(
        parent: NodeId,
        rule_name: String,
        select: Vec<String>,
        condition_count: usize,
    ) -> Self {
        Self { parent, rule_name, select, condition_count, tokens: Vec::new() }
    }

    pub fn is_satisfied(&self) -> bool {
        !self.tokens.is_empty()
    }
}

/// Token storage shared by beta memories and production nodes; tokens kept in arrival order
pub trait TokenMemory {
    fn token_list(&self) -> &[TokenId];
    fn token_list_mut(&mut self) -> &mut Vec<TokenId>;

    /// Tokens, most recent first
    fn tokens(&self) -> Box<dyn Iterator<Item = TokenId> + '_> {
        Box::new(self.token_list().iter().rev().copied())
    }
}

impl TokenMemory for BetaMemoryNode {
    fn token_list(&self) -> &[TokenId] {
        &self.tokens
    }

    fn token_list_mut(&mut self) -> &mut Vec<TokenId> {
        &mut self.tokens
    }
}

impl TokenMemory for ProductionNode {
    fn token_list(&self) -> &[TokenId] {
        &self.tokens
    }

    fn token_list_mut(&mut self) -> &mut Vec<TokenId> {
        &mut self.tokens
    }
}

/// Closed set of node kinds stored in the network arena
#[derive(Debug, Clone)]
pub enum ReteNode {
    DummyTop(DummyTopNode),
    Join(JoinNode),
    BetaMemory(BetaMemoryNode),
    Production(ProductionNode),
}

impl ReteNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ReteNode::DummyTop(_) => "dummy-top",
            ReteNode::Join(_) => "join",
            ReteNode::BetaMemory(_) => "beta-memory",
            ReteNode::Production(_) => "production",
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            ReteNode::DummyTop(_) => None,
            ReteNode::Join(node) => Some(node.parent),
            ReteNode::BetaMemory(node) => Some(node.parent),
            ReteNode::Production(node) => Some(node.parent),
        }
    }

    pub fn children(&self) -> &[NodeId] {
        match self {
            ReteNode::DummyTop(node) => &node.children,
            ReteNode::Join(node) => &node.children,
            ReteNode::BetaMemory(node) => &node.children,
            ReteNode::Production(_) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            ReteNode::DummyTop(node) => Some(&mut node.children),
            ReteNode::Join(node) => Some(&mut node.children),
            ReteNode::BetaMemory(node) => Some(&mut node.children),
            ReteNode::Production(_) => None,
        }
    }

    pub fn as_token_memory(&self) -> Option<&dyn TokenMemory> {
        match self {
            ReteNode::BetaMemory(node) => Some(node as &dyn TokenMemory),
            ReteNode::Production(node) => Some(node as &dyn TokenMemory),
            ReteNode::DummyTop(_) | ReteNode::Join(_) => None,
        }
    }

    pub(crate) fn as_token_memory_mut(&mut self) -> Option<&mut dyn TokenMemory> {
        match self {
            ReteNode::BetaMemory(node) => Some(node as &mut dyn TokenMemory),
            ReteNode::Production(node) => Some(node as &mut dyn TokenMemory),
            ReteNode::DummyTop(_) | ReteNode::Join(_) => None,
        }
    }
}
