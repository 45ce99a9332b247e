//! Compliance report aggregation
//!
//! Collects per-trail check results into the report that gets written to
//! disk. Trails are kept in a sorted map so the summary, and the serialized
//! output, never depend on the order trails were evaluated in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::compliance::{ComplianceStatus, TrailChecks};
use super::shared::{AuditContext, RunId};

/// Compliant / non-compliant counts for one trail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub compliant: usize,
    pub non_compliant: usize,
    pub fully_compliant: bool,
}

impl CheckSummary {
    pub fn from_checks(checks: &TrailChecks) -> Self {
        let compliant = checks
            .values()
            .filter(|c| c.status == ComplianceStatus::Compliant)
            .count();
        let non_compliant = checks.len() - compliant;

        Self {
            compliant,
            non_compliant,
            fully_compliant: non_compliant == 0,
        }
    }
}

/// Results for one trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailReport {
    pub compliance_checks: TrailChecks,
    pub summary: CheckSummary,
}

impl TrailReport {
    pub fn new(compliance_checks: TrailChecks) -> Self {
        let summary = CheckSummary::from_checks(&compliance_checks);
        Self {
            compliance_checks,
            summary,
        }
    }
}

/// Account-wide totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_trails: usize,
    pub fully_compliant_trails: usize,
    pub skipped_trails: usize,
    pub compliant_checks: usize,
    pub non_compliant_checks: usize,
    /// Every check of every trail passed, no trail was skipped, and at
    /// least one trail exists
    pub fully_compliant: bool,
}

/// The report produced by one audit run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub run_id: RunId,
    pub account_id: String,
    pub region: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub trails: BTreeMap<String, TrailReport>,
    #[serde(default)]
    pub skipped_trails: BTreeMap<String, String>,
    pub summary: ReportSummary,
}

impl ComplianceReport {
    /// Record a trail whose configuration could not be fetched
    pub fn record_skipped(&mut self, trail_id: impl Into<String>, reason: impl Into<String>) {
        self.skipped_trails.insert(trail_id.into(), reason.into());
        self.summary = summarize(&self.trails, self.skipped_trails.len());
    }

    pub fn trail(&self, trail_id: &str) -> Option<&TrailReport> {
        self.trails.get(trail_id)
    }

    pub fn is_fully_compliant(&self) -> bool {
        self.summary.fully_compliant
    }
}

/// Build a report from per-trail results.
///
/// Trail ids are unique keys; a repeated id is logged at `warn` and the later
/// entry replaces the earlier one.
pub fn aggregate<I>(context: &AuditContext, per_trail: I) -> ComplianceReport
where
    I: IntoIterator<Item = (String, TrailChecks)>,
{
    let mut trails: BTreeMap<String, TrailReport> = BTreeMap::new();
    for (id, checks) in per_trail {
        if trails.contains_key(&id) {
            warn!("Duplicate trail id {}; keeping the later result", id);
        }
        trails.insert(id, TrailReport::new(checks));
    }

    let summary = summarize(&trails, 0);

    ComplianceReport {
        run_id: context.run_id,
        account_id: context.account_id.clone(),
        region: context.region.clone(),
        generated_at: context.started_at,
        trails,
        skipped_trails: BTreeMap::new(),
        summary,
    }
}

fn summarize(trails: &BTreeMap<String, TrailReport>, skipped: usize) -> ReportSummary {
    let mut summary = ReportSummary {
        total_trails: trails.len(),
        skipped_trails: skipped,
        ..Default::default()
    };

    for report in trails.values() {
        summary.compliant_checks += report.summary.compliant;
        summary.non_compliant_checks += report.summary.non_compliant;
        if report.summary.fully_compliant {
            summary.fully_compliant_trails += 1;
        }
    }

    summary.fully_compliant =
        !trails.is_empty() && skipped == 0 && summary.fully_compliant_trails == trails.len();

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::compliance::{evaluate, CheckName, ComplianceCheck};
    use crate::domain::trail::{DataResource, EventSelector, ReadWriteType, TrailConfig};

    fn context() -> AuditContext {
        AuditContext::new("123456789012")
    }

    fn checks(management: bool, data: bool) -> TrailChecks {
        let mut checks = TrailChecks::new();
        checks.insert(
            CheckName::ManagementEvents,
            ComplianceCheck::new(management, CheckName::ManagementEvents.requirement()),
        );
        checks.insert(
            CheckName::DataEvents,
            ComplianceCheck::new(data, CheckName::DataEvents.requirement()),
        );
        checks
    }

    #[test]
    fn test_single_trail_scenario() {
        let trail = TrailConfig::new("trail-a")
            .with_selector(EventSelector::new(Some(ReadWriteType::All), true));

        let ctx = context();
        let report = aggregate(&ctx, [(trail.id().to_string(), evaluate(&trail))]);

        let trail_a = report.trail("trail-a").unwrap();
        assert!(trail_a.compliance_checks[&CheckName::ManagementEvents].is_compliant());
        assert!(!trail_a.compliance_checks[&CheckName::DataEvents].is_compliant());

        assert_eq!(report.account_id, "123456789012");
        assert_eq!(report.summary.compliant_checks, 1);
        assert_eq!(report.summary.non_compliant_checks, 1);
        assert!(!report.summary.fully_compliant);
    }

    #[test]
    fn test_trail_without_selectors_scenario() {
        let trail: TrailConfig = serde_json::from_str(r#"{"Name": "trail-b"}"#).unwrap();

        let report = aggregate(&context(), [(trail.id().to_string(), evaluate(&trail))]);

        let summary = report.trail("trail-b").unwrap().summary;
        assert_eq!(summary.compliant, 0);
        assert_eq!(summary.non_compliant, 2);
        assert!(!summary.fully_compliant);
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let input = vec![
            ("a".to_string(), checks(true, true)),
            ("b".to_string(), checks(true, false)),
            ("c".to_string(), checks(false, false)),
        ];
        let mut reversed = input.clone();
        reversed.reverse();

        let ctx = context();
        let forward = aggregate(&ctx, input);
        let backward = aggregate(&ctx, reversed);

        assert_eq!(forward.summary, backward.summary);
        assert_eq!(forward, backward);
        assert_eq!(forward.summary.compliant_checks, 3);
        assert_eq!(forward.summary.non_compliant_checks, 3);
        assert_eq!(forward.summary.fully_compliant_trails, 1);
    }

    #[test]
    fn test_fully_compliant_account() {
        let trail = TrailConfig::new("main").with_selector(
            EventSelector::new(Some(ReadWriteType::All), true).with_data_resource(
                DataResource::new("AWS::Lambda::Function", vec!["arn:aws:lambda".to_string()]),
            ),
        );

        let report = aggregate(&context(), [(trail.id().to_string(), evaluate(&trail))]);
        assert!(report.is_fully_compliant());
        assert_eq!(report.summary.fully_compliant_trails, 1);
    }

    #[test]
    fn test_duplicate_trail_ids_keep_later_result() {
        let report = aggregate(
            &context(),
            [
                ("trail-a".to_string(), checks(true, true)),
                ("trail-a".to_string(), checks(false, false)),
            ],
        );

        assert_eq!(report.summary.total_trails, 1);
        assert_eq!(report.trail("trail-a").unwrap().summary.non_compliant, 2);
        assert!(!report.is_fully_compliant());
    }

    #[test]
    fn test_no_trails_is_not_compliant() {
        let report = aggregate(&context(), Vec::new());
        assert_eq!(report.summary.total_trails, 0);
        assert!(!report.is_fully_compliant());
    }

    #[test]
    fn test_skipped_trail_clears_compliance() {
        let mut report = aggregate(&context(), [("a".to_string(), checks(true, true))]);
        assert!(report.is_fully_compliant());

        report.record_skipped("b", "Connectivity error: timeout");

        assert!(!report.is_fully_compliant());
        assert_eq!(report.summary.skipped_trails, 1);
        assert_eq!(report.summary.total_trails, 1);
        assert_eq!(report.skipped_trails["b"], "Connectivity error: timeout");
    }

    #[test]
    fn test_report_json_shape() {
        let report = aggregate(&context(), [("trail-a".to_string(), checks(true, false))]);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["account_id"], "123456789012");
        assert_eq!(
            json["trails"]["trail-a"]["compliance_checks"]["management_events"]["status"],
            "COMPLIANT"
        );
        assert_eq!(json["summary"]["non_compliant_checks"], 1);
        assert!(json["generated_at"].is_string());
        assert!(json["run_id"].is_string());
    }
}
