//! JSON report writer

use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::info;

use crate::domain::report::ComplianceReport;
use crate::domain::shared::{AuditError, AuditResult};

pub const REPORT_FILE_PREFIX: &str = "cloudtrail_compliance_report_";

/// `cloudtrail_compliance_report_YYYYMMDD_HHMMSS.json`
pub fn default_filename(now: DateTime<Local>) -> String {
    format!("{}{}.json", REPORT_FILE_PREFIX, now.format("%Y%m%d_%H%M%S"))
}

/// Writes reports as pretty-printed JSON
#[derive(Debug, Clone, Default)]
pub struct JsonReportWriter {
    output_dir: Option<PathBuf>,
}

impl JsonReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place relative filenames under `dir`
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    /// Resolve where a report would be written
    pub fn target_path(&self, filename: Option<&str>) -> PathBuf {
        let filename = filename
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_filename(Local::now()));

        match &self.output_dir {
            Some(dir) => dir.join(filename),
            None => PathBuf::from(filename),
        }
    }

    /// Serialize `report` and create or overwrite the target file.
    ///
    /// Returns the path actually written. The report is only borrowed, so a
    /// failed write can be retried with another filename.
    pub async fn write(
        &self,
        report: &ComplianceReport,
        filename: Option<&str>,
    ) -> AuditResult<PathBuf> {
        let path = self.target_path(filename);
        let json = serde_json::to_string_pretty(report)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuditError::io(parent, e))?;
        }

        tokio::fs::write(&path, json)
            .await
            .map_err(|e| AuditError::io(&path, e))?;

        info!("JSON report saved: {}", path.display());
        Ok(path)
    }
}
