use serde::{Deserialize, Serialize};
use std::fmt;

/// A constant term appearing in a fact or rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// Named resource (e.g. `alice`, `knows`)
    Resource(String),
    /// Literal value, compared by its lexical form
    Literal(String),
}

impl Term {
    /// Create a resource term
    pub fn resource(name: impl Into<String>) -> Self {
        Self::Resource(name.into())
    }

    /// Create a literal term
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Lexical form without any quoting
    pub fn as_str(&self) -> &str {
        match self {
            Self::Resource(name) => name,
            Self::Literal(value) => value,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(name) => write!(f, "{name}"),
            Self::Literal(value) => write!(f, "\"{value}\""),
        }
    }
}

impl From<&str> for Term {
    fn from(name: &str) -> Self {
        Self::resource(name)
    }
}

/// An immutable subject/predicate/object triple
///
/// Facts order by subject, then predicate, then object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fact {
    /// Subject term
    pub subject: Term,
    /// Predicate term
    pub predicate: Term,
    /// Object term
    pub object: Term,
}

impl Fact {
    /// Create a fact from anything convertible into terms
    pub fn new(
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
    ) -> Self {
        Self { subject: subject.into(), predicate: predicate.into(), object: object.into() }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.subject, self.predicate, self.object)
    }
}

/// A position in a condition: either a variable or a constant term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternTerm {
    /// Variable, named verbatim (conventionally `?x`)
    Variable(String),
    /// Constant term that must match exactly
    Constant(Term),
}

impl PatternTerm {
    /// Create a variable
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Create a constant
    pub fn constant(term: impl Into<Term>) -> Self {
        Self::Constant(term.into())
    }

    /// Whether this is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// Variable name, if this is a variable
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            Self::Constant(_) => None,
        }
    }

    /// Constant term, if this is a constant
    pub fn as_constant(&self) -> Option<&Term> {
        match self {
            Self::Variable(_) => None,
            Self::Constant(term) => Some(term),
        }
    }
}

impl fmt::Display for PatternTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name) => write!(f, "{name}"),
            Self::Constant(term) => write!(f, "{term}"),
        }
    }
}

/// A single triple pattern within a rule
///
/// The predicate is always a constant. The subject is expected to be a variable; the
/// network compiler rejects conditions where it is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    /// Subject position
    pub subject: PatternTerm,
    /// Predicate constant
    pub predicate: Term,
    /// Object position
    pub object: PatternTerm,
}

impl Condition {
    /// Create a condition
    pub fn new(subject: PatternTerm, predicate: impl Into<Term>, object: PatternTerm) -> Self {
        Self { subject, predicate: predicate.into(), object }
    }

    /// Shorthand for `(?s predicate ?o)`
    pub fn vars(subject: &str, predicate: impl Into<Term>, object: &str) -> Self {
        Self::new(PatternTerm::var(subject), predicate, PatternTerm::var(object))
    }

    /// Shorthand for `(?s predicate constant)`
    pub fn with_constant(
        subject: &str,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
    ) -> Self {
        Self::new(PatternTerm::var(subject), predicate, PatternTerm::constant(object))
    }

    /// Subject variable name, if the subject is a variable
    pub fn subject_variable(&self) -> Option<&str> {
        self.subject.variable_name()
    }

    /// Object variable name, if the object is a variable
    pub fn object_variable(&self) -> Option<&str> {
        self.object.variable_name()
    }

    /// Whether the condition binds the named variable in either position
    pub fn binds(&self, variable: &str) -> bool {
        self.subject_variable() == Some(variable) || self.object_variable() == Some(variable)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.subject, self.predicate, self.object)
    }
}

/// An inequality between a variable and a constant term
///
/// Either side may hold the variable; the other side must be a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotSameTerm {
    /// Left-hand side
    pub left: PatternTerm,
    /// Right-hand side
    pub right: PatternTerm,
}

impl NotSameTerm {
    /// Create an inequality from two sides
    pub fn new(left: PatternTerm, right: PatternTerm) -> Self {
        Self { left, right }
    }

    /// Variable/constant pair, when the constraint is shaped correctly
    pub fn variable_and_constant(&self) -> Option<(&str, &Term)> {
        match (&self.left, &self.right) {
            (PatternTerm::Variable(name), PatternTerm::Constant(term))
            | (PatternTerm::Constant(term), PatternTerm::Variable(name)) => Some((name, term)),
            _ => None,
        }
    }
}

impl fmt::Display for NotSameTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notSameTerm({} {})", self.left, self.right)
    }
}

/// A named conjunction of conditions with an optional set of inequalities and a select list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Rule name, used as the key of match results
    pub name: String,
    /// Ordered conditions
    pub conditions: Vec<Condition>,
    /// Variable/constant inequalities
    #[serde(default)]
    pub not_same_terms: Vec<NotSameTerm>,
    /// Variables reported in bindings
    #[serde(default)]
    pub select: Vec<String>,
}

impl RuleDefinition {
    /// Start a rule definition with no conditions
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
            not_same_terms: Vec::new(),
            select: Vec::new(),
        }
    }

    /// Append a condition
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an inequality between two sides
    #[must_use]
    pub fn with_not_same_term(mut self, left: PatternTerm, right: PatternTerm) -> Self {
        self.not_same_terms.push(NotSameTerm::new(left, right));
        self
    }

    /// Replace the select list
    #[must_use]
    pub fn with_select<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = variables.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name)?;
        for (index, condition) in self.conditions.iter().enumerate() {
            if index > 0 {
                write!(f, " ")?;
            }
            write!(f, "{condition}")?;
        }
        for constraint in &self.not_same_terms {
            write!(f, " {constraint}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_display_quotes_literals_only() {
        assert_eq!(Term::resource("alice").to_string(), "alice");
        assert_eq!(Term::literal("42").to_string(), "\"42\"");
        assert_eq!(Term::literal("42").as_str(), "42");
    }

    #[test]
    fn test_fact_display() {
        let fact = Fact::new("alice", "knows", "bob");
        assert_eq!(fact.to_string(), "(alice knows bob)");
    }

    #[test]
    fn test_condition_variables() {
        let condition = Condition::with_constant("?y", "worksAt", "acme");
        assert_eq!(condition.subject_variable(), Some("?y"));
        assert_eq!(condition.object_variable(), None);
        assert!(condition.binds("?y"));
        assert!(!condition.binds("?x"));
        assert_eq!(condition.to_string(), "(?y worksAt acme)");
    }

    #[test]
    fn test_not_same_term_shape() {
        let forward = NotSameTerm::new(PatternTerm::var("?y"), PatternTerm::constant("bob"));
        let reversed = NotSameTerm::new(PatternTerm::constant("bob"), PatternTerm::var("?y"));
        let two_vars = NotSameTerm::new(PatternTerm::var("?x"), PatternTerm::var("?y"));

        assert_eq!(forward.variable_and_constant(), Some(("?y", &Term::resource("bob"))));
        assert_eq!(reversed.variable_and_constant(), Some(("?y", &Term::resource("bob"))));
        assert_eq!(two_vars.variable_and_constant(), None);
    }

    #[test]
    fn test_rule_definition_deserializes_without_optional_sections() {
        let json = r#"{
            "name": "R1",
            "conditions": [{
                "subject": {"Variable": "?x"},
                "predicate": {"Resource": "knows"},
                "object": {"Variable": "?y"}
            }]
        }"#;

        let rule: RuleDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(rule.name, "R1");
        assert_eq!(rule.conditions, vec![Condition::vars("?x", "knows", "?y")]);
        assert!(rule.not_same_terms.is_empty());
        assert!(rule.select.is_empty());
    }
}
