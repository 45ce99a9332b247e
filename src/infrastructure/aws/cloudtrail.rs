//! CloudTrail-backed trail source

use aws_sdk_cloudtrail::error::DisplayErrorContext;
use aws_sdk_cloudtrail::types as sdk;
use tracing::{debug, info, warn};

use crate::domain::shared::{AuditError, AuditResult};
use crate::domain::trail::{DataResource, EventSelector, ReadWriteType, TrailConfig, TrailSource};

use super::clients::AwsClients;

/// Reads trails through the CloudTrail API and checks delivery bucket access
/// through S3.
pub struct CloudTrailSource {
    cloudtrail: aws_sdk_cloudtrail::Client,
    s3: aws_sdk_s3::Client,
}

impl CloudTrailSource {
    pub fn new(cloudtrail: aws_sdk_cloudtrail::Client, s3: aws_sdk_s3::Client) -> Self {
        Self { cloudtrail, s3 }
    }

    pub fn from_clients(clients: &AwsClients) -> Self {
        Self::new(clients.cloudtrail.clone(), clients.s3.clone())
    }

    async fn fetch_selectors(&self, trail_id: &str) -> AuditResult<Vec<EventSelector>> {
        let output = self
            .cloudtrail
            .get_event_selectors()
            .trail_name(trail_id)
            .send()
            .await
            .map_err(|e| connectivity("GetEventSelectors", trail_id, &e))?;

        if !output.advanced_event_selectors().is_empty() {
            debug!(
                "{} uses advanced event selectors, which are not evaluated",
                trail_id
            );
        }

        Ok(output.event_selectors().iter().map(selector_from_sdk).collect())
    }

    async fn fetch_is_logging(&self, trail_id: &str) -> AuditResult<bool> {
        let output = self
            .cloudtrail
            .get_trail_status()
            .name(trail_id)
            .send()
            .await
            .map_err(|e| connectivity("GetTrailStatus", trail_id, &e))?;

        Ok(output.is_logging().unwrap_or(false))
    }

    /// A bucket that cannot be reached counts as inaccessible, not as a
    /// failed fetch.
    async fn bucket_accessible(&self, bucket: Option<&str>) -> bool {
        let Some(bucket) = bucket.filter(|b| !b.is_empty()) else {
            return false;
        };

        match self.s3.head_bucket().bucket(bucket).send().await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "Log bucket {} is not accessible: {}",
                    bucket,
                    aws_sdk_s3::error::DisplayErrorContext(&e)
                );
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl TrailSource for CloudTrailSource {
    async fn list_trails(&self) -> AuditResult<Vec<TrailConfig>> {
        let output = self
            .cloudtrail
            .describe_trails()
            .include_shadow_trails(true)
            .send()
            .await
            .map_err(|e| {
                AuditError::Connectivity(format!(
                    "DescribeTrails failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let trails: Vec<TrailConfig> = output.trail_list().iter().map(trail_from_sdk).collect();
        info!("Found {} CloudTrail trail(s)", trails.len());

        Ok(trails)
    }

    async fn describe_trail(&self, mut trail: TrailConfig) -> AuditResult<TrailConfig> {
        let trail_id = trail.id().to_string();

        trail.event_selectors = self.fetch_selectors(&trail_id).await?;
        trail.is_logging = self.fetch_is_logging(&trail_id).await?;
        trail.s3_bucket_accessible = self.bucket_accessible(trail.s3_bucket_name.as_deref()).await;

        Ok(trail)
    }
}

fn connectivity<E>(operation: &str, trail_id: &str, err: &E) -> AuditError
where
    E: std::error::Error,
{
    AuditError::Connectivity(format!(
        "{} failed for {}: {}",
        operation,
        trail_id,
        DisplayErrorContext(err)
    ))
}

/// Decode the listing fields of an SDK trail
pub fn trail_from_sdk(trail: &sdk::Trail) -> TrailConfig {
    TrailConfig {
        name: trail.name().unwrap_or_default().to_string(),
        trail_arn: trail.trail_arn().map(str::to_string),
        home_region: trail.home_region().map(str::to_string),
        s3_bucket_name: trail.s3_bucket_name().map(str::to_string),
        is_multi_region_trail: trail.is_multi_region_trail().unwrap_or(false),
        log_file_validation_enabled: trail.log_file_validation_enabled().unwrap_or(false),
        kms_key_id: trail.kms_key_id().map(str::to_string),
        cloud_watch_logs_log_group_arn: trail.cloud_watch_logs_log_group_arn().map(str::to_string),
        ..Default::default()
    }
}

pub fn selector_from_sdk(selector: &sdk::EventSelector) -> EventSelector {
    EventSelector {
        read_write_type: selector
            .read_write_type()
            .map(|rw| ReadWriteType::from_str(rw.as_str())),
        include_management_events: selector.include_management_events().unwrap_or(false),
        data_resources: selector
            .data_resources()
            .iter()
            .map(|resource| DataResource {
                r#type: resource.r#type().map(str::to_string),
                values: resource.values().to_vec(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_smithy_runtime::client::http::test_util::{capture_request, CaptureRequestReceiver};

    fn captured_source() -> (CloudTrailSource, CaptureRequestReceiver) {
        use aws_sdk_cloudtrail::config::{BehaviorVersion, Credentials, Region};

        let (cloudtrail_http, requests) = capture_request(None);
        let (s3_http, _) = capture_request(None);
        let credentials = Credentials::new("AKIDTEST", "secret", None, None, "test");

        let cloudtrail = aws_sdk_cloudtrail::Client::from_conf(
            aws_sdk_cloudtrail::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("eu-west-1"))
                .credentials_provider(credentials.clone())
                .http_client(cloudtrail_http)
                .build(),
        );
        let s3 = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("eu-west-1"))
                .credentials_provider(credentials)
                .http_client(s3_http)
                .build(),
        );

        (CloudTrailSource::new(cloudtrail, s3), requests)
    }

    #[tokio::test]
    async fn test_list_trails_includes_shadow_trails() {
        let (source, requests) = captured_source();

        // The canned response is empty; only the outgoing request matters.
        let _ = source.list_trails().await;

        let request = requests.expect_request();
        let body = std::str::from_utf8(request.body().bytes().unwrap_or_default()).unwrap();
        assert!(
            body.contains(r#""includeShadowTrails":true"#),
            "unexpected DescribeTrails body {}",
            body
        );
    }

    #[test]
    fn test_trail_from_sdk() {
        let trail = sdk::Trail::builder()
            .name("org-trail")
            .trail_arn("arn:aws:cloudtrail:us-east-1:123456789012:trail/org-trail")
            .home_region("us-east-1")
            .s3_bucket_name("org-trail-logs")
            .is_multi_region_trail(true)
            .kms_key_id("arn:aws:kms:us-east-1:123456789012:key/abc")
            .build();

        let config = trail_from_sdk(&trail);

        assert_eq!(config.name, "org-trail");
        assert_eq!(
            config.id(),
            "arn:aws:cloudtrail:us-east-1:123456789012:trail/org-trail"
        );
        assert!(config.is_multi_region_trail);
        assert!(!config.log_file_validation_enabled);
        assert!(config.cloud_watch_logs_log_group_arn.is_none());
        assert!(config.event_selectors.is_empty());
        assert!(!config.is_logging);
    }

    #[test]
    fn test_selector_from_sdk() {
        let selector = sdk::EventSelector::builder()
            .read_write_type(sdk::ReadWriteType::WriteOnly)
            .include_management_events(true)
            .data_resources(
                sdk::DataResource::builder()
                    .r#type("AWS::S3::Object")
                    .values("arn:aws:s3:::bucket/")
                    .build(),
            )
            .build();

        let decoded = selector_from_sdk(&selector);

        assert_eq!(decoded.read_write_type, Some(ReadWriteType::WriteOnly));
        assert!(decoded.include_management_events);
        assert_eq!(decoded.data_resources.len(), 1);
        assert_eq!(decoded.data_resources[0].values, vec!["arn:aws:s3:::bucket/"]);
    }

    #[test]
    fn test_empty_sdk_selector_defaults() {
        let decoded = selector_from_sdk(&sdk::EventSelector::builder().build());
        assert_eq!(decoded, EventSelector::default());
    }
}
