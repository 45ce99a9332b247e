//! Offline trail source
//!
//! Reads a JSON capture of an account's trails so an audit can run without
//! credentials. The document uses the CloudTrail field names, with each
//! trail's `EventSelectors` and `IsLogging` inlined:
//!
//! ```json
//! {
//!   "AccountId": "123456789012",
//!   "Region": "us-east-1",
//!   "Trails": [
//!     {
//!       "Name": "main",
//!       "EventSelectors": [{"ReadWriteType": "All", "IncludeManagementEvents": true}]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::domain::shared::{AuditContext, AuditError, AuditResult};
use crate::domain::trail::{TrailConfig, TrailSource};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TrailSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub trails: Vec<TrailConfig>,
}

impl TrailSnapshot {
    pub fn from_json(json: &str) -> AuditResult<Self> {
        serde_json::from_str(json).map_err(|e| AuditError::InvalidSnapshot(e.to_string()))
    }

    /// Build the run context; an explicit account id wins over the one
    /// recorded in the snapshot.
    pub fn context(&self, account_override: Option<&str>) -> AuditResult<AuditContext> {
        let account_id = account_override
            .or(self.account_id.as_deref())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AuditError::InvalidSnapshot("snapshot has no AccountId and none was given".into())
            })?;

        Ok(AuditContext::new(account_id).with_region(self.region.clone()))
    }
}

/// Serves trails from a loaded snapshot
pub struct SnapshotTrailSource {
    snapshot: TrailSnapshot,
}

impl SnapshotTrailSource {
    pub fn new(snapshot: TrailSnapshot) -> Self {
        Self { snapshot }
    }

    pub async fn load(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuditError::io(path, e))?;

        let snapshot = TrailSnapshot::from_json(&json)?;
        info!(
            "Loaded snapshot {} with {} trail(s)",
            path.display(),
            snapshot.trails.len()
        );

        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &TrailSnapshot {
        &self.snapshot
    }
}

#[async_trait::async_trait]
impl TrailSource for SnapshotTrailSource {
    async fn list_trails(&self) -> AuditResult<Vec<TrailConfig>> {
        Ok(self.snapshot.trails.clone())
    }

    async fn describe_trail(&self, trail: TrailConfig) -> AuditResult<TrailConfig> {
        Ok(trail)
    }
}
