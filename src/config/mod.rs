//! Configuration management
//!
//! Layered as: built-in defaults, then an optional TOML file, then
//! `TRAIL_AUDIT__*` environment variables. Command-line flags are applied
//! on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::compliance::{CheckName, CompliancePolicy};
use crate::infrastructure::aws::AwsSettings;

pub const ENV_PREFIX: &str = "TRAIL_AUDIT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub aws: AwsConfig,
    pub report: ReportConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub profile: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: Option<PathBuf>,
    /// Fixed report filename; timestamped when unset
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub fail_fast: bool,
    pub checks: Vec<CheckName>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            checks: CompliancePolicy::default().checks().collect(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("audit.checks")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn aws_settings(&self) -> AwsSettings {
        AwsSettings {
            profile: self.aws.profile.clone(),
            region: self.aws.region.clone(),
        }
    }

    pub fn policy(&self) -> CompliancePolicy {
        CompliancePolicy::new(self.audit.checks.iter().copied())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
