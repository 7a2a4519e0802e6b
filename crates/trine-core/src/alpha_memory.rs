//! Alpha Memory Implementation for the RETE Network
//!
//! The alpha layer indexes facts by a derived pattern key so that a new fact reaches only
//! the join nodes that can possibly use it.
//!
//! ## Two-tier keys
//!
//! ```text
//! (alice knows bob) ──► "knows bob"   (predicate + constant object, most selective)
//!                   └─► "knows"       (predicate only, unless `bob` is excluded)
//! ```
//!
//! A condition with a constant object compiles to the first kind of key, a condition with
//! an object variable to the second. A fact may therefore activate zero, one or both
//! memories.

use crate::types::{AlphaMemoryId, Fact, FactId, NodeId, PatternTerm, Term};
use ahash::AHashMap;
use std::collections::BTreeSet;
use tracing::debug;

/// Derive the pattern key for a predicate/object pair
///
/// A variable object yields the formatted predicate alone; a constant object yields
/// `"<predicate> <object>"`.
pub fn derive_pattern(predicate: &Term, object: &PatternTerm) -> String {
    match object {
        PatternTerm::Variable(_) => predicate.to_string(),
        PatternTerm::Constant(term) => constant_pattern(predicate, term),
    }
}

fn constant_pattern(predicate: &Term, object: &Term) -> String {
    format!("{predicate} {object}")
}

/// Facts currently matching one pattern key, plus the join nodes fed by them
#[derive(Debug, Clone)]
pub struct AlphaMemory {
    /// Unique identifier for this alpha memory
    pub id: AlphaMemoryId,
    /// Pattern key; the sole identity of the memory
    pub pattern: String,
    /// Whether the key was derived from the predicate alone
    pub predicate_only: bool,
    /// Objects bypassed by a predicate-only memory ("not-same-term" exclusions)
    pub excluded_objects: BTreeSet<Term>,
    /// Join nodes right-activated by new facts
    pub successors: Vec<NodeId>,
    /// Matched facts in arrival order; read most-recent first
    statements: Vec<FactId>,
    /// Number of facts added since the network was built
    pub facts_added: u64,
}

impl AlphaMemory {
    fn new(id: AlphaMemoryId, pattern: String, predicate_only: bool) -> Self {
        Self {
            id,
            pattern,
            predicate_only,
            excluded_objects: BTreeSet::new(),
            successors: Vec::new(),
            statements: Vec::new(),
            facts_added: 0,
        }
    }

    /// Check whether a fact's object is excluded from this memory
    pub fn excludes(&self, object: &Term) -> bool {
        self.predicate_only && self.excluded_objects.contains(object)
    }

    /// Matched facts, most recent first
    pub fn statements(&self) -> impl Iterator<Item = FactId> + '_ {
        self.statements.iter().rev().copied()
    }

    /// Number of matched facts
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether no fact currently matches
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub(crate) fn push_fact(&mut self, fact_id: FactId) {
        self.statements.push(fact_id);
        self.facts_added += 1;
    }

    pub(crate) fn add_successor(&mut self, join: NodeId) {
        if !self.successors.contains(&join) {
            self.successors.push(join);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.statements.clear();
    }
}

/// Maps derived pattern keys to alpha memories
#[derive(Debug, Default)]
pub struct PatternIndex {
    memories: Vec<AlphaMemory>,
    by_pattern: AHashMap<String, AlphaMemoryId>,
    /// Number of times compilation reused an existing memory
    pub shares_found: usize,
}

impl PatternIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the alpha memory for a condition's predicate and object
    ///
    /// Exclusions are merged into the memory whether it is new or shared; they only take
    /// effect on predicate-only memories. A shared memory applies them to every rule that
    /// reads it, not just the rule that declared them.
    pub fn build_or_share<I>(
        &mut self,
        predicate: &Term,
        object: &PatternTerm,
        exclusions: I,
    ) -> AlphaMemoryId
    where
        I: IntoIterator<Item = Term>,
    {
        let pattern = derive_pattern(predicate, object);
        let id = match self.by_pattern.get(&pattern) {
            Some(&id) => {
                self.shares_found += 1;
                debug!(pattern = %pattern, alpha_memory = id, "Sharing alpha memory");
                id
            }
            None => {
                let id = self.memories.len();
                debug!(pattern = %pattern, alpha_memory = id, "Creating alpha memory");
                self.memories.push(AlphaMemory::new(id, pattern.clone(), object.is_variable()));
                self.by_pattern.insert(pattern, id);
                id
            }
        };
        self.memories[id].excluded_objects.extend(exclusions);
        id
    }

    /// Alpha memories a fact qualifies for: the constant-object key first, then the
    /// predicate-only key unless the fact's object is excluded there
    pub fn matching_memories(&self, fact: &Fact) -> impl Iterator<Item = AlphaMemoryId> + '_ {
        let specific =
            self.by_pattern.get(&constant_pattern(&fact.predicate, &fact.object)).copied();
        let general = self
            .by_pattern
            .get(&fact.predicate.to_string())
            .copied()
            .filter(|&id| !self.memories[id].excludes(&fact.object));
        [specific, general].into_iter().flatten()
    }

    /// Look up a memory by its pattern key
    pub fn lookup(&self, pattern: &str) -> Option<&AlphaMemory> {
        self.by_pattern.get(pattern).map(|&id| &self.memories[id])
    }

    pub fn get(&self, id: AlphaMemoryId) -> Option<&AlphaMemory> {
        self.memories.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: AlphaMemoryId) -> Option<&mut AlphaMemory> {
        self.memories.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlphaMemory> {
        self.memories.iter()
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }
}
