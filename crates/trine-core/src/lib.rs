#![allow(missing_docs)]
//! Core functionality for the Trine RETE matcher.
//!
//! This crate compiles triple-pattern rules into a shared discrimination network once and
//! re-evaluates it cheaply against many batches of subject/predicate/object facts,
//! reporting which rules are satisfied and the variable bindings that satisfy them.
//!
//! ```no_run
//! use trine_core::{Condition, Fact, ReteEngine, RuleDefinition};
//!
//! let mut engine = ReteEngine::new();
//! engine.compile(
//!     &RuleDefinition::new("colleague")
//!         .with_condition(Condition::vars("?x", "knows", "?y"))
//!         .with_condition(Condition::with_constant("?y", "worksAt", "acme"))
//!         .with_select(["?x"]),
//! )?;
//!
//! let result = engine.evaluate([
//!     Fact::new("alice", "knows", "bob"),
//!     Fact::new("bob", "worksAt", "acme"),
//! ])?;
//! assert!(result.is_satisfied("colleague"));
//! # Ok::<(), trine_core::ReteError>(())
//! ```

/// Alpha memories and the two-tier pattern index
pub mod alpha_memory;
/// Token chains for partial matches
pub mod beta_network;
/// Engine limits loaded from TOML and the environment
pub mod config;
/// Specificity scoring of satisfied rules
pub mod conflict_resolution;
/// Rule compilation and batch evaluation entry point
pub mod engine;
/// Error types
pub mod error;
/// Node reuse across rules
pub mod node_sharing;
/// RETE network construction and execution
pub mod rete_network;
/// Individual RETE node implementations
pub mod rete_nodes;
/// Graphviz export of the compiled network
pub mod rule_visualization;
/// Rule and fact model plus arena handle types
pub mod types;

pub use config::ReteConfig;
pub use conflict_resolution::RuleScore;
pub use engine::{MatchResult, ReteEngine};
pub use error::{ReteError, ReteResult};
pub use node_sharing::NodeSharingStats;
pub use rete_network::{Bindings, NetworkStats, ReteNetwork};
pub use types::{
    AlphaMemoryId, Condition, Fact, FactId, NodeId, NotSameTerm, PatternTerm, RuleDefinition,
    Term, TokenId,
};
