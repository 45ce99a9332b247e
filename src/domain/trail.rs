//! Trail configuration model
//!
//! Mirrors the shape of a CloudTrail trail descriptor: identity, delivery
//! metadata and the ordered event selectors. Every field is optional in the
//! raw API response, so each one decodes to an explicit default instead of
//! failing.

use serde::{Deserialize, Deserializer, Serialize};

use super::shared::AuditResult;

/// Decode a present-but-null field as its type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which API calls an event selector records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadWriteType {
    All,
    ReadOnly,
    WriteOnly,
    /// Any value the service may add later; treated like an unset field
    #[serde(other)]
    Unknown,
}

impl ReadWriteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadWriteType::All => "All",
            ReadWriteType::ReadOnly => "ReadOnly",
            ReadWriteType::WriteOnly => "WriteOnly",
            ReadWriteType::Unknown => "Unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "All" => ReadWriteType::All,
            "ReadOnly" => ReadWriteType::ReadOnly,
            "WriteOnly" => ReadWriteType::WriteOnly,
            _ => ReadWriteType::Unknown,
        }
    }

    /// True for the values that make a selector govern management events
    pub fn governs_management_events(&self) -> bool {
        matches!(
            self,
            ReadWriteType::All | ReadWriteType::ReadOnly | ReadWriteType::WriteOnly
        )
    }
}

/// Data-plane resource pattern captured by a selector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DataResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub values: Vec<String>,
}

impl DataResource {
    pub fn new(resource_type: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            r#type: Some(resource_type.into()),
            values,
        }
    }
}

/// One event selector record
///
/// Defaults: `read_write_type` unset, `include_management_events` false,
/// `data_resources` empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EventSelector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_write_type: Option<ReadWriteType>,
    #[serde(deserialize_with = "null_as_default")]
    pub include_management_events: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub data_resources: Vec<DataResource>,
}

impl EventSelector {
    pub fn new(read_write_type: Option<ReadWriteType>, include_management_events: bool) -> Self {
        Self {
            read_write_type,
            include_management_events,
            data_resources: Vec::new(),
        }
    }

    pub fn with_data_resource(mut self, resource: DataResource) -> Self {
        self.data_resources.push(resource);
        self
    }

    pub fn governs_management_events(&self) -> bool {
        self.read_write_type
            .map(|rw| rw.governs_management_events())
            .unwrap_or(false)
    }

    pub fn has_data_resources(&self) -> bool {
        !self.data_resources.is_empty()
    }
}

/// Raw description of one audit trail
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TrailConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "TrailARN", skip_serializing_if = "Option::is_none")]
    pub trail_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_bucket_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_multi_region_trail: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub log_file_validation_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_watch_logs_log_group_arn: Option<String>,
    /// From `GetTrailStatus`
    #[serde(deserialize_with = "null_as_default")]
    pub is_logging: bool,
    /// From a `HeadBucket` request against the delivery bucket
    #[serde(deserialize_with = "null_as_default")]
    pub s3_bucket_accessible: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub event_selectors: Vec<EventSelector>,
}

impl TrailConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
        self.trail_arn = Some(arn.into());
        self
    }

    pub fn with_selector(mut self, selector: EventSelector) -> Self {
        self.event_selectors.push(selector);
        self
    }

    /// Report key: the ARN when known, otherwise the trail name
    pub fn id(&self) -> &str {
        self.trail_arn
            .as_deref()
            .filter(|arn| !arn.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Port for reading trail configuration
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TrailSource: Send + Sync {
    /// List the account's trails (identity and delivery metadata only)
    async fn list_trails(&self) -> AuditResult<Vec<TrailConfig>>;

    /// Complete one listed trail with its selectors, status and bucket access
    async fn describe_trail(&self, trail: TrailConfig) -> AuditResult<TrailConfig>;
}
