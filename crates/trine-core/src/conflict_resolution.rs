//! Specificity-Based Conflict Resolution
//!
//! When several rules are satisfied by one batch, the most specific one wins. Specificity
//! is measured on the network itself rather than on the rule text:
//!
//! ```text
//! Production(R) ─► Join ─► BetaMemory ─► Join ─► BetaMemory ─► ... ─► DummyTop
//!                           count flagged          count flagged
//! ```
//!
//! Every token on a satisfying chain is flagged as a satisfaction-set member when its
//! production fires. A rule's score is the number of flagged tokens held by the beta
//! memories on its path to the root. A strict winner is returned; a tie at the top is an
//! [`ReteError::AmbiguousConflict`] that names every tied rule, because this core has no
//! priority information to break it.

use crate::error::{ReteError, ReteResult};
use crate::rete_network::ReteNetwork;
use crate::rete_nodes::{ReteNode, TokenMemory};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Specificity score of one satisfied rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleScore {
    pub rule_name: String,
    pub score: usize,
}

/// Count flagged tokens in every beta memory above a production node
pub fn score_production(network: &ReteNetwork, production: NodeId) -> ReteResult<usize> {
    let mut score = 0;
    let mut current = network.node(production)?.parent();

    while let Some(id) = current {
        let node = network.node(id)?;
        if let ReteNode::BetaMemory(memory) = node {
            score += memory
                .tokens()
                .filter_map(|token| network.token_arena().get(token))
                .filter(|token| token.satisfaction_member)
                .count();
        }
        current = node.parent();
    }
    Ok(score)
}

/// Pick the single top-ranked rule from scores sorted best first
pub fn resolve_most_specific(ranked: &[RuleScore]) -> ReteResult<Option<String>> {
    let Some(best) = ranked.first() else { return Ok(None) };

    let tied: Vec<String> = ranked
        .iter()
        .take_while(|candidate| candidate.score == best.score)
        .map(|candidate| candidate.rule_name.clone())
        .collect();

    if tied.len() > 1 {
        return Err(ReteError::AmbiguousConflict { rules: tied, score: best.score });
    }
    Ok(Some(best.rule_name.clone()))
}

impl ReteNetwork {
    /// Scores of every satisfied rule, highest first, ties ordered by name
    pub fn rule_scores(&self) -> ReteResult<Vec<RuleScore>> {
        let mut scores = self
            .satisfied_productions()
            .map(|(rule_name, production)| {
                Ok(RuleScore {
                    rule_name: rule_name.to_string(),
                    score: score_production(self, production)?,
                })
            })
            .collect::<ReteResult<Vec<_>>>()?;

        scores.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.rule_name.cmp(&b.rule_name)));
        Ok(scores)
    }

    /// Name of the strictly most specific satisfied rule
    ///
    /// `Ok(None)` when nothing is satisfied in the current batch.
    #[instrument(skip(self))]
    pub fn most_specific_rule_name(&self) -> ReteResult<Option<String>> {
        let scores = self.rule_scores()?;
        debug!(candidates = scores.len(), "Resolving most specific rule");

        let winner = resolve_most_specific(&scores)?;
        if let Some(name) = &winner {
            info!(rule = %name, "Most specific rule selected");
        }
        Ok(winner)
    }
}
