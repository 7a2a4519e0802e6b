//! RETE Network Node Sharing
//!
//! Compiling overlapping rules reuses existing nodes instead of duplicating common
//! condition prefixes. Sharing is keyed purely by content:
//!
//! - alpha memories by pattern key (see [`crate::alpha_memory::PatternIndex`])
//! - join nodes by (alpha memory, tests, condition) among the children of one parent
//! - beta memories by parent: a join node has at most one beta memory child

use crate::rete_nodes::{ReteNode, TestAtJoinNode};
use crate::types::{AlphaMemoryId, Condition, NodeId};
use serde::{Deserialize, Serialize};

/// Find a child of `parent` that is a join node with the same sharing key
pub(crate) fn find_shared_join(
    nodes: &[ReteNode],
    parent: NodeId,
    alpha_memory: AlphaMemoryId,
    tests: &[TestAtJoinNode],
    condition: &Condition,
) -> Option<NodeId> {
    let parent = nodes.get(parent)?;
    parent.children().iter().copied().find(|&child| {
        matches!(
            nodes.get(child),
            Some(ReteNode::Join(join)) if join.shares_with(alpha_memory, tests, condition)
        )
    })
}

/// Find the beta memory child of `parent`, if it already has one
pub(crate) fn find_beta_memory_child(nodes: &[ReteNode], parent: NodeId) -> Option<NodeId> {
    let parent = nodes.get(parent)?;
    parent
        .children()
        .iter()
        .copied()
        .find(|&child| matches!(nodes.get(child), Some(ReteNode::BetaMemory(_))))
}

/// Counters for nodes created and reused during compilation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSharingStats {
    pub alpha_memories_created: usize,
    pub alpha_shares_found: usize,
    pub join_nodes_created: usize,
    pub join_shares_found: usize,
    pub beta_memories_created: usize,
    pub beta_shares_found: usize,
}

impl NodeSharingStats {
    /// Percentage of node requests served by an existing node
    pub fn overall_sharing_rate(&self) -> f64 {
        let shares = self.alpha_shares_found + self.join_shares_found + self.beta_shares_found;
        let requests = self.nodes_without_sharing();

        if requests > 0 { (shares as f64 / requests as f64) * 100.0 } else { 0.0 }
    }

    /// Total nodes that would have been created without sharing
    pub fn nodes_without_sharing(&self) -> usize {
        self.alpha_memories_created
            + self.alpha_shares_found
            + self.join_nodes_created
            + self.join_shares_found
            + self.beta_memories_created
            + self.beta_shares_found
    }
}
