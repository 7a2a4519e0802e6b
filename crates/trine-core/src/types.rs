//! Shared handle types and re-exports of the rule/fact model

pub use trine_types::{Condition, Fact, NotSameTerm, PatternTerm, RuleDefinition, Term};

/// Index of a node in the network arena; doubles as its diagnostic id
pub type NodeId = usize;
/// Index of an alpha memory in the pattern index
pub type AlphaMemoryId = usize;
/// Index of a fact in the per-batch working memory
pub type FactId = usize;
/// Index of a token in the per-batch token arena
pub type TokenId = usize;
