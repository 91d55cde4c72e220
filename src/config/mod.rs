//! Configuration loading and validation.
//!
//! Configuration is a TOML file with `${VAR}` environment expansion:
//!
//! ```toml
//! [database]
//! url = "${DATABASE_URL}"
//!
//! [reaper]
//! families = ["svc_user_%", "svc_file_%"]
//! custodian_role = "object_custodian"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

mod database;
mod observability;
mod reaper;

use std::path::Path;

pub use database::PostgresConfig;
pub use observability::{LogFormat, LoggingConfig};
pub use reaper::ReaperConfig;

use serde::{Deserialize, Serialize};

/// Root configuration for a sweep run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Target database connection.
    pub database: PostgresConfig,

    /// Families to sweep and teardown behavior.
    pub reaper: ReaperConfig,

    /// Console logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SweepConfig {
    /// Load configuration from a TOML file.
    ///
    /// `${VAR}` references are expanded from the environment; a missing
    /// variable is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;
        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: SweepConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.reaper.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand `${VAR}` references from the environment, leaving anything after
/// a `#` comment marker untouched.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');
        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let matched = cap.get(0).unwrap();
            if let Some(pos) = comment_pos
                && matched.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..matched.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = matched.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}
