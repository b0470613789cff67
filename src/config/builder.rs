/// Builder configuration
///
/// Tunables for pipeline construction:
/// - Join field deduplication suffix
/// - Branch registry strictness
/// - Implicit first-fields reduction
/// - Default assertion strictness

use crate::plan::operation::AssertionLevel;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline builder configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Appended (repeatedly) to colliding join output field names
    pub dedup_suffix: String,

    /// Reject a second registration under an existing branch name
    /// instead of overwriting it
    pub strict_branch_names: bool,

    /// Append the implicit "take first" reducer after aggregation blocks
    pub first_fields_reduction: bool,

    /// Level used by `assert` / `assert_group` when none is given
    pub default_assertion_level: AssertionLevel,

    /// Log every derived scope at debug level
    pub trace_scopes: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            dedup_suffix: "_".to_string(),
            strict_branch_names: false,
            first_fields_reduction: true,
            default_assertion_level: AssertionLevel::Strict,
            trace_scopes: false,
        }
    }
}

impl BuilderConfig {
    /// Config that fails on duplicate branch registration
    pub fn strict() -> Self {
        Self {
            strict_branch_names: true,
            ..Default::default()
        }
    }

    /// Config for interactive pipeline development
    pub fn development() -> Self {
        Self {
            trace_scopes: true,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse builder config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read builder config {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dedup_suffix.is_empty() {
            anyhow::bail!("dedup_suffix must not be empty");
        }
        Ok(())
    }
}
