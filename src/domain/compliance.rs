//! Compliance evaluation
//!
//! Turns one trail's configuration into a set of named pass/fail checks.
//! Evaluation is pure: the same trail always yields the same checks, and no
//! check looks at any other trail.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::trail::{EventSelector, TrailConfig};

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "COMPLIANT",
            ComplianceStatus::NonCompliant => "NON_COMPLIANT",
        }
    }

    pub fn is_compliant(&self) -> bool {
        matches!(self, ComplianceStatus::Compliant)
    }
}

impl From<bool> for ComplianceStatus {
    fn from(value: bool) -> Self {
        if value {
            ComplianceStatus::Compliant
        } else {
            ComplianceStatus::NonCompliant
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one named check against one trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub status: ComplianceStatus,
    /// The observed value the status was derived from
    pub value: bool,
    pub requirement: String,
}

impl ComplianceCheck {
    pub fn new(value: bool, requirement: impl Into<String>) -> Self {
        Self {
            status: ComplianceStatus::from(value),
            value,
            requirement: requirement.into(),
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.status.is_compliant()
    }
}

/// Checks computed for one trail, ordered by check name
pub type TrailChecks = BTreeMap<CheckName, ComplianceCheck>;

/// Every check the auditor knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    ManagementEvents,
    DataEvents,
    TrailLogging,
    MultiRegion,
    LogFileValidation,
    KmsEncryption,
    CloudwatchLogs,
    S3BucketAccessible,
}

impl CheckName {
    pub const ALL: [CheckName; 8] = [
        CheckName::ManagementEvents,
        CheckName::DataEvents,
        CheckName::TrailLogging,
        CheckName::MultiRegion,
        CheckName::LogFileValidation,
        CheckName::KmsEncryption,
        CheckName::CloudwatchLogs,
        CheckName::S3BucketAccessible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::ManagementEvents => "management_events",
            CheckName::DataEvents => "data_events",
            CheckName::TrailLogging => "trail_logging",
            CheckName::MultiRegion => "multi_region",
            CheckName::LogFileValidation => "log_file_validation",
            CheckName::KmsEncryption => "kms_encryption",
            CheckName::CloudwatchLogs => "cloudwatch_logs",
            CheckName::S3BucketAccessible => "s3_bucket_accessible",
        }
    }

    pub fn requirement(&self) -> &'static str {
        match self {
            CheckName::ManagementEvents => "Management events must be logged for API call auditing",
            CheckName::DataEvents => {
                "Data events must be logged for object-level API activity auditing"
            }
            CheckName::TrailLogging => "Trail must be actively logging events",
            CheckName::MultiRegion => "Trail must capture events from all regions",
            CheckName::LogFileValidation => "Log file integrity validation must be enabled",
            CheckName::KmsEncryption => "Log files must be encrypted with a KMS key",
            CheckName::CloudwatchLogs => "Trail must deliver events to CloudWatch Logs",
            CheckName::S3BucketAccessible => "Log delivery bucket must exist and be reachable",
        }
    }

    fn observe(&self, trail: &TrailConfig, findings: &SelectorFindings) -> bool {
        match self {
            CheckName::ManagementEvents => findings.management_events_enabled,
            CheckName::DataEvents => findings.data_events_enabled,
            CheckName::TrailLogging => trail.is_logging,
            CheckName::MultiRegion => trail.is_multi_region_trail,
            CheckName::LogFileValidation => trail.log_file_validation_enabled,
            CheckName::KmsEncryption => is_present(trail.kms_key_id.as_deref()),
            CheckName::CloudwatchLogs => {
                is_present(trail.cloud_watch_logs_log_group_arn.as_deref())
            }
            CheckName::S3BucketAccessible => trail.s3_bucket_accessible,
        }
    }
}

fn is_present(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown check: {}", s))
    }
}

/// What the event selectors of one trail turn on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorFindings {
    pub management_events_enabled: bool,
    pub data_events_enabled: bool,
}

impl SelectorFindings {
    /// Walk the selectors in order.
    ///
    /// Management logging takes the value of the *last* selector with a
    /// recognised `ReadWriteType`, so a later selector can switch it back
    /// off. Data logging is sticky once any selector names a data resource.
    pub fn scan(selectors: &[EventSelector]) -> Self {
        let mut findings = SelectorFindings::default();

        for selector in selectors {
            if selector.governs_management_events() {
                findings.management_events_enabled = selector.include_management_events;
            }

            if selector.has_data_resources() {
                findings.data_events_enabled = true;
            }
        }

        findings
    }
}

/// The set of checks to run against every trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompliancePolicy {
    checks: BTreeSet<CheckName>,
}

impl Default for CompliancePolicy {
    fn default() -> Self {
        Self::new([CheckName::ManagementEvents, CheckName::DataEvents])
    }
}

impl CompliancePolicy {
    pub fn new(checks: impl IntoIterator<Item = CheckName>) -> Self {
        Self {
            checks: checks.into_iter().collect(),
        }
    }

    /// Every known check
    pub fn all() -> Self {
        Self::new(CheckName::ALL)
    }

    pub fn checks(&self) -> impl Iterator<Item = CheckName> + '_ {
        self.checks.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn evaluate(&self, trail: &TrailConfig) -> TrailChecks {
        let findings = SelectorFindings::scan(&trail.event_selectors);

        self.checks
            .iter()
            .map(|name| {
                let value = name.observe(trail, &findings);
                debug!("{}: {} = {}", trail.id(), name, value);
                (*name, ComplianceCheck::new(value, name.requirement()))
            })
            .collect()
    }
}

/// Evaluate a trail against the default management/data events policy
pub fn evaluate(trail: &TrailConfig) -> TrailChecks {
    CompliancePolicy::default().evaluate(trail)
}
