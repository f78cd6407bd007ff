//! CLI configuration file
//!
//! ```json
//! {
//!   "schema_path": "schemas/microscopy_core.json",
//!   "strict_unknown_slots": true,
//!   "type_designator": "@type",
//!   "log_level": "warn"
//! }
//! ```
//!
//! Every field is optional. Command-line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::Severity;
use crate::schema::ValidatorConfig;

use super::args::SchemaSource;
use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Schema file; the bundled schema is used when absent
    #[serde(default)]
    pub schema_path: Option<PathBuf>,

    /// Reject undeclared slots (default true)
    #[serde(default = "default_strict_unknown_slots")]
    pub strict_unknown_slots: bool,

    /// Key naming the concrete class of nested objects (default "@type")
    #[serde(default = "default_type_designator")]
    pub type_designator: String,

    /// Minimum log severity (default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_strict_unknown_slots() -> bool {
    true
}
fn default_type_designator() -> String {
    "@type".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_path: None,
            strict_unknown_slots: default_strict_unknown_slots(),
            type_designator: default_type_designator(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Builds the effective configuration for one command
    pub fn resolve(source: &SchemaSource, lenient: bool) -> CliResult<Self> {
        let mut config = match &source.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(schema) = &source.schema {
            config.schema_path = Some(schema.clone());
        }
        if lenient {
            config.strict_unknown_slots = false;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if let Some(path) = &self.schema_path {
            if path.as_os_str().is_empty() {
                return Err(CliError::config_error("schema_path must not be empty"));
            }
        }

        if self.type_designator.trim().is_empty() {
            return Err(CliError::config_error("type_designator must not be empty"));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error, fatal.",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Minimum log severity
    pub fn log_severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Warn)
    }

    /// Validator options derived from this configuration
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            strict_unknown_slots: self.strict_unknown_slots,
            type_designator: self.type_designator.clone(),
        }
    }
}
