//! Engine configuration
//!
//! Limits applied at the engine boundary. They guard callers against unbounded batches and
//! rule sets; they never change matching semantics.

use crate::error::{ReteError, ReteResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReteConfig {
    #[serde(default = "default_max_conditions_per_rule")]
    pub max_conditions_per_rule: usize,
    #[serde(default = "default_max_facts_per_batch")]
    pub max_facts_per_batch: usize,
    #[serde(default = "default_max_rule_name_length")]
    pub max_rule_name_length: usize,
    #[serde(default = "default_true")]
    pub log_duplicate_facts: bool,
}

impl Default for ReteConfig {
    fn default() -> Self {
        Self {
            max_conditions_per_rule: default_max_conditions_per_rule(),
            max_facts_per_batch: default_max_facts_per_batch(),
            max_rule_name_length: default_max_rule_name_length(),
            log_duplicate_facts: default_true(),
        }
    }
}

impl ReteConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(source: &str) -> ReteResult<Self> {
        toml::from_str(source).map_err(|e| ReteError::configuration(None, e.to_string()))
    }

    /// Load a configuration file, falling back to defaults when it does not exist
    pub fn load(path: impl AsRef<Path>) -> ReteResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(source) => {
                info!(path = %path.display(), "Loaded matcher configuration");
                Self::from_toml_str(&source)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    path = %path.display(),
                    "Configuration file not found. Using default configuration."
                );
                Ok(Self::default())
            }
            Err(e) => Err(ReteError::configuration(
                None,
                format!("failed to read '{}': {e}", path.display()),
            )),
        }
    }

    /// Reject limits that would refuse every rule or batch
    pub fn validate(&self) -> ReteResult<()> {
        let limits = [
            ("max_conditions_per_rule", self.max_conditions_per_rule),
            ("max_facts_per_batch", self.max_facts_per_batch),
            ("max_rule_name_length", self.max_rule_name_length),
        ];
        for (setting, value) in limits {
            if value == 0 {
                return Err(ReteError::configuration(Some(setting), "must be greater than zero"));
            }
        }
        Ok(())
    }

    /// Apply `TRINE_*` environment variable overrides; unparseable values are ignored
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(value) = env_usize("TRINE_MAX_CONDITIONS_PER_RULE") {
            self.max_conditions_per_rule = value;
        }
        if let Some(value) = env_usize("TRINE_MAX_FACTS_PER_BATCH") {
            self.max_facts_per_batch = value;
        }
        if let Some(value) = env_usize("TRINE_MAX_RULE_NAME_LENGTH") {
            self.max_rule_name_length = value;
        }
        self
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<usize>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable configuration override");
            None
        }
    }
}

fn default_max_conditions_per_rule() -> usize {
    64
}
fn default_max_facts_per_batch() -> usize {
    100_000
}
fn default_max_rule_name_length() -> usize {
    256
}

fn default_true() -> bool {
    true
}
