//! Structured error handling for the Trine matcher
//!
//! Compile-time precondition violations, run-time conflicts and configuration problems
//! are reported through one error type so callers can match on the failure category.

use thiserror::Error;

/// Error type for network compilation, evaluation and configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReteError {
    /// Malformed rule definition, rejected before any node is installed
    #[error("Rule definition error: {message}")]
    RuleDefinition { message: String, rule_name: Option<String>, condition_index: Option<usize> },

    /// Several satisfied rules share the highest specificity score
    #[error("Ambiguous conflict between rules {rules:?} (score {score})")]
    AmbiguousConflict { rules: Vec<String>, score: usize },

    /// A post-evaluation query named a rule that was never compiled
    #[error("Unknown rule: {rule_name}")]
    UnknownRule { rule_name: String },

    /// A configured limit was exceeded at the engine boundary
    #[error("Limit exceeded: {message} (limit {limit}, actual {actual})")]
    Limit { message: String, limit: usize, actual: usize },

    /// Configuration could not be parsed or loaded
    #[error("Configuration error: {message}")]
    Configuration { message: String, setting: Option<String> },

    /// An arena handle did not resolve to the expected node
    #[error("RETE network error: {message}")]
    Network { message: String, node_id: Option<usize> },
}

impl ReteError {
    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ReteError::RuleDefinition { .. } => "rule_definition",
            ReteError::AmbiguousConflict { .. } => "ambiguous_conflict",
            ReteError::UnknownRule { .. } => "unknown_rule",
            ReteError::Limit { .. } => "limit",
            ReteError::Configuration { .. } => "configuration",
            ReteError::Network { .. } => "network",
        }
    }

    /// Check if the engine remains usable after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ReteError::Network { .. })
    }

    /// Create a rule definition error for the whole rule
    pub fn rule_definition(rule_name: &str, message: impl Into<String>) -> Self {
        Self::RuleDefinition {
            message: message.into(),
            rule_name: Some(rule_name.to_string()),
            condition_index: None,
        }
    }

    /// Create a rule definition error pointing at one condition
    pub fn condition(rule_name: &str, condition_index: usize, message: impl Into<String>) -> Self {
        Self::RuleDefinition {
            message: message.into(),
            rule_name: Some(rule_name.to_string()),
            condition_index: Some(condition_index),
        }
    }

    /// Create a limit error
    pub fn limit(message: impl Into<String>, limit: usize, actual: usize) -> Self {
        Self::Limit { message: message.into(), limit, actual }
    }

    /// Create a configuration error
    pub fn configuration(setting: Option<&str>, message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into(), setting: setting.map(str::to_string) }
    }

    /// Create a network invariant error
    pub fn network(node_id: usize, message: impl Into<String>) -> Self {
        Self::Network { message: message.into(), node_id: Some(node_id) }
    }
}

/// Result type alias for matcher operations
pub type ReteResult<T> = Result<T, ReteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err = ReteError::rule_definition("R1", "rule has no conditions");
        assert_eq!(err.category(), "rule_definition");
        assert!(err.is_recoverable());

        let err = ReteError::network(7, "dangling node handle");
        assert_eq!(err.category(), "network");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_condition_error_carries_index() {
        let err = ReteError::condition("R2", 1, "subject must be a variable");
        match err {
            ReteError::RuleDefinition { rule_name, condition_index, .. } => {
                assert_eq!(rule_name.as_deref(), Some("R2"));
                assert_eq!(condition_index, Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ambiguous_conflict_message_names_rules() {
        let err = ReteError::AmbiguousConflict { rules: vec!["A".into(), "B".into()], score: 2 };
        let message = err.to_string();
        assert!(message.contains("\"A\""));
        assert!(message.contains("\"B\""));
    }
}
