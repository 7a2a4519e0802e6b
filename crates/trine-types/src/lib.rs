//! Trine Types
//!
//! This crate defines the data handed to the Trine matcher by the surrounding system:
//! facts (subject/predicate/object triples) and the already-structured rule definitions
//! compiled into the discrimination network by `trine-core`. It carries no matching logic
//! of its own.

#![deny(missing_docs)]

mod types;
pub use types::{Condition, Fact, NotSameTerm, PatternTerm, RuleDefinition, Term};
