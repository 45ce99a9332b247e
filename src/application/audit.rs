//! Audit use case: fetch → evaluate → aggregate

use tracing::{info, warn};

use crate::domain::compliance::{CompliancePolicy, TrailChecks};
use crate::domain::report::{aggregate, ComplianceReport};
use crate::domain::shared::{AuditContext, AuditResult};
use crate::domain::trail::TrailSource;

/// How a run behaves
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    pub policy: CompliancePolicy,
    /// Abort the whole run when one trail cannot be described, instead of
    /// recording it as skipped
    pub fail_fast: bool,
}

pub struct AuditService<'a> {
    source: &'a dyn TrailSource,
    options: AuditOptions,
}

impl<'a> AuditService<'a> {
    pub fn new(source: &'a dyn TrailSource, options: AuditOptions) -> Self {
        Self { source, options }
    }

    /// Run one audit over every trail the source lists.
    ///
    /// A failed listing always aborts. A failed per-trail fetch aborts when
    /// `fail_fast` is set or the error is fatal, and is otherwise recorded
    /// in the report's `skipped_trails`.
    pub async fn run(&self, context: &AuditContext) -> AuditResult<ComplianceReport> {
        info!(
            "Auditing CloudTrail configuration for account {}",
            context.account_id
        );

        let trails = self.source.list_trails().await?;

        let mut evaluated: Vec<(String, TrailChecks)> = Vec::with_capacity(trails.len());
        let mut skipped: Vec<(String, String)> = Vec::new();

        for listed in trails {
            let trail_id = listed.id().to_string();

            match self.source.describe_trail(listed).await {
                Ok(trail) => {
                    let checks = self.options.policy.evaluate(&trail);
                    evaluated.push((trail_id, checks));
                }
                Err(e) if self.options.fail_fast || e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Skipping trail {}: {}", trail_id, e);
                    skipped.push((trail_id, e.to_string()));
                }
            }
        }

        let mut report = aggregate(context, evaluated);
        for (trail_id, reason) in skipped {
            report.record_skipped(trail_id, reason);
        }

        info!(
            "Evaluated {} trail(s): {} compliant check(s), {} non-compliant, {} skipped",
            report.summary.total_trails,
            report.summary.compliant_checks,
            report.summary.non_compliant_checks,
            report.summary.skipped_trails
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::compliance::CheckName;
    use crate::domain::shared::AuditError;
    use crate::domain::trail::{EventSelector, MockTrailSource, ReadWriteType, TrailConfig};

    fn listed() -> Vec<TrailConfig> {
        vec![TrailConfig::new("trail-a"), TrailConfig::new("trail-b")]
    }

    fn describe(trail: TrailConfig) -> AuditResult<TrailConfig> {
        match trail.name.as_str() {
            "trail-a" => {
                Ok(trail.with_selector(EventSelector::new(Some(ReadWriteType::All), true)))
            }
            _ => Err(AuditError::Connectivity("GetEventSelectors timed out".into())),
        }
    }

    #[tokio::test]
    async fn test_run_evaluates_every_trail() {
        let mut source = MockTrailSource::new();
        source.expect_list_trails().times(1).returning(|| Ok(listed()));
        source
            .expect_describe_trail()
            .times(2)
            .returning(|trail| Ok(trail));

        let service = AuditService::new(&source, AuditOptions::default());
        let report = service.run(&AuditContext::new("123456789012")).await.unwrap();

        assert_eq!(report.summary.total_trails, 2);
        assert_eq!(report.summary.non_compliant_checks, 4);
        assert!(report.skipped_trails.is_empty());
    }

    #[tokio::test]
    async fn test_run_skips_failed_trail() {
        let mut source = MockTrailSource::new();
        source.expect_list_trails().returning(|| Ok(listed()));
        source.expect_describe_trail().returning(describe);

        let service = AuditService::new(&source, AuditOptions::default());
        let report = service.run(&AuditContext::new("123456789012")).await.unwrap();

        assert_eq!(report.summary.total_trails, 1);
        assert_eq!(report.summary.skipped_trails, 1);
        assert!(report.skipped_trails["trail-b"].contains("timed out"));
        let trail_a = report.trail("trail-a").unwrap();
        assert!(trail_a.compliance_checks[&CheckName::ManagementEvents].is_compliant());
        assert!(!report.is_fully_compliant());
    }

    #[tokio::test]
    async fn test_run_fail_fast() {
        let mut source = MockTrailSource::new();
        source.expect_list_trails().returning(|| Ok(listed()));
        source.expect_describe_trail().returning(describe);

        let options = AuditOptions {
            fail_fast: true,
            ..Default::default()
        };
        let service = AuditService::new(&source, options);
        let result = service.run(&AuditContext::new("123456789012")).await;

        assert!(matches!(result, Err(AuditError::Connectivity(_))));
    }

    #[tokio::test]
    async fn test_run_aborts_on_authentication_failure() {
        let mut source = MockTrailSource::new();
        source.expect_list_trails().returning(|| Ok(listed()));
        source
            .expect_describe_trail()
            .returning(|_| Err(AuditError::Authentication("token expired".into())));

        let service = AuditService::new(&source, AuditOptions::default());
        let result = service.run(&AuditContext::new("123456789012")).await;

        assert!(matches!(result, Err(AuditError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_run_aborts_when_listing_fails() {
        let mut source = MockTrailSource::new();
        source
            .expect_list_trails()
            .returning(|| Err(AuditError::Connectivity("DescribeTrails failed".into())));
        source.expect_describe_trail().never();

        let service = AuditService::new(&source, AuditOptions::default());
        let result = service.run(&AuditContext::new("123456789012")).await;

        assert!(result.is_err());
    }

    #[test]
    fn test_run_with_extended_policy() {
        let mut source = MockTrailSource::new();
        source.expect_list_trails().returning(|| Ok(listed()));
        source.expect_describe_trail().returning(|trail| Ok(trail));

        let options = AuditOptions {
            policy: CompliancePolicy::all(),
            ..Default::default()
        };
        let service = AuditService::new(&source, options);
        let report = tokio_test::block_on(service.run(&AuditContext::new("123456789012")));

        let report = tokio_test::assert_ok!(report);
        let trail_a = report.trail("trail-a").unwrap();
        assert_eq!(trail_a.compliance_checks.len(), CheckName::ALL.len());
    }
}
