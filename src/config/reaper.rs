//! Reaper behavior configuration.
//!
//! # Example
//!
//! ```toml
//! [reaper]
//! families = ["svc_user_%", "svc_file_%"]
//! custodian_role = "object_custodian"
//! progress_batch = 10
//! exclude_schemas = ["audit"]
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Which families to sweep and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReaperConfig {
    /// Naming-family LIKE patterns to sweep, in processing order.
    pub families: Vec<String>,

    /// Role that receives ownership of objects still owned by an expired
    /// principal. Must already exist; the reaper never creates it.
    #[serde(default = "default_custodian_role")]
    pub custodian_role: String,

    /// Emit a progress log line after every this many principals.
    #[serde(default = "default_progress_batch")]
    pub progress_batch: usize,

    /// Schemas to skip during privilege revocation, in addition to the
    /// system schemas that are always skipped.
    #[serde(default)]
    pub exclude_schemas: Vec<String>,
}

impl ReaperConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.families.is_empty() {
            return Err(ConfigError::Validation(
                "reaper.families must list at least one family pattern".into(),
            ));
        }
        if self.families.iter().any(|f| f.is_empty()) {
            return Err(ConfigError::Validation(
                "reaper.families must not contain empty patterns".into(),
            ));
        }
        if self.custodian_role.is_empty() {
            return Err(ConfigError::Validation(
                "reaper.custodian_role must not be empty".into(),
            ));
        }
        if self.progress_batch == 0 {
            return Err(ConfigError::Validation(
                "reaper.progress_batch must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_custodian_role() -> String {
    "object_custodian".into()
}

fn default_progress_batch() -> usize {
    10
}
