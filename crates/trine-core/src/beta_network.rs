//! Token chains for the beta network
//!
//! A token records one link of a partial match: the fact matched by one condition, the
//! variable names that fact binds, and a handle to the token for the previous condition.
//! Following parent handles from any token reaches the dummy root token, so a chain is an
//! immutable persistent list addressed by [`TokenId`].
//!
//! ```text
//! [dummy] ◄── (alice knows bob) ?x ?y ◄── (bob worksAt acme) ?y
//! ```

use crate::types::{FactId, TokenId};

/// Handle of the dummy root token, present in every batch
pub const DUMMY_TOKEN: TokenId = 0;

/// One link of a partial match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token for the previous condition (None only for the dummy root)
    pub parent: Option<TokenId>,
    /// Fact matched by this link (None only for the dummy root)
    pub fact: Option<FactId>,
    /// Variable bound to the fact's subject
    pub subject_variable: Option<String>,
    /// Variable bound to the fact's object; absent when the condition's object is constant
    pub object_variable: Option<String>,
    /// Whether this link is part of a chain that satisfied some rule in this batch
    pub satisfaction_member: bool,
}

impl Token {
    fn dummy() -> Self {
        Self {
            parent: None,
            fact: None,
            subject_variable: None,
            object_variable: None,
            satisfaction_member: false,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.fact.is_none()
    }
}

/// Per-batch token storage
#[derive(Debug, Clone)]
pub struct TokenArena {
    tokens: Vec<Token>,
}

impl Default for TokenArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenArena {
    pub fn new() -> Self {
        Self { tokens: vec![Token::dummy()] }
    }

    /// Append a token chained to `parent`
    pub fn push(
        &mut self,
        parent: TokenId,
        fact: FactId,
        subject_variable: Option<String>,
        object_variable: Option<String>,
    ) -> TokenId {
        let id = self.tokens.len();
        self.tokens.push(Token {
            parent: Some(parent),
            fact: Some(fact),
            subject_variable,
            object_variable,
            satisfaction_member: false,
        });
        id
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id)
    }

    /// Walk `steps` parent links from `id`
    ///
    /// Returns `None` if the chain ends before the walk does.
    pub fn ancestor(&self, id: TokenId, steps: usize) -> Option<TokenId> {
        let mut current = id;
        for _ in 0..steps {
            current = self.tokens.get(current)?.parent?;
        }
        Some(current)
    }

    /// Iterate a chain from `id` back to (and including) the dummy root
    pub fn chain(&self, id: TokenId) -> TokenChain<'_> {
        TokenChain { arena: self, next: Some(id) }
    }

    /// Flag every token on the chain from `id` as a satisfaction-set member
    pub(crate) fn mark_satisfaction_chain(&mut self, id: TokenId) {
        let mut current = Some(id);
        while let Some(token_id) = current {
            match self.tokens.get_mut(token_id) {
                Some(token) if !token.is_dummy() => {
                    token.satisfaction_member = true;
                    current = token.parent;
                }
                _ => break,
            }
        }
    }

    /// Drop every token except the dummy root
    pub(crate) fn clear(&mut self) {
        self.tokens.truncate(1);
    }

    /// Number of live tokens, the dummy root excluded
    pub fn len(&self) -> usize {
        self.tokens.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterator over a token chain, nearest link first
pub struct TokenChain<'a> {
    arena: &'a TokenArena,
    next: Option<TokenId>,
}

impl<'a> Iterator for TokenChain<'a> {
    type Item = (TokenId, &'a Token);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let token = self.arena.get(id)?;
        self.next = token.parent;
        Some((id, token))
    }
}
