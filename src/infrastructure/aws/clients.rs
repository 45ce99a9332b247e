//! AWS credential resolution and client construction

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_sts::error::DisplayErrorContext;
use tracing::info;

use crate::domain::shared::{AuditContext, AuditError, AuditResult};

/// Where to find credentials and which region to talk to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsSettings {
    /// Named profile from the shared config files; default chain when `None`
    pub profile: Option<String>,
    /// Region override; provider default when `None`
    pub region: Option<String>,
}

/// Authenticated service handles plus the resolved account context
#[derive(Debug, Clone)]
pub struct AwsClients {
    pub cloudtrail: aws_sdk_cloudtrail::Client,
    pub s3: aws_sdk_s3::Client,
    pub sts: aws_sdk_sts::Client,
    pub context: AuditContext,
}

impl AwsClients {
    /// Resolve credentials, build the three clients and ask STS who we are.
    pub async fn connect(settings: &AwsSettings) -> AuditResult<Self> {
        let sdk_config = load_sdk_config(settings).await;
        ensure_credentials(&sdk_config).await?;

        let cloudtrail = aws_sdk_cloudtrail::Client::new(&sdk_config);
        let s3 = aws_sdk_s3::Client::new(&sdk_config);
        let sts = aws_sdk_sts::Client::new(&sdk_config);

        let account_id = resolve_account_id(&sts).await?;
        info!("Connected to AWS Account: {}", account_id);

        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .or_else(|| settings.region.clone());

        let context = AuditContext::new(account_id)
            .with_region(region)
            .with_profile(settings.profile.clone());

        Ok(Self {
            cloudtrail,
            s3,
            sts,
            context,
        })
    }
}

async fn load_sdk_config(settings: &AwsSettings) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    match settings.profile.as_deref() {
        Some(profile) => {
            info!("Using AWS profile: {}", profile);
            loader = loader.profile_name(profile);
        }
        None => info!("Using default AWS credentials"),
    }

    if let Some(region) = settings.region.clone() {
        loader = loader.region(Region::new(region));
    }

    loader.load().await
}

async fn ensure_credentials(sdk_config: &SdkConfig) -> AuditResult<()> {
    let provider = sdk_config
        .credentials_provider()
        .ok_or_else(|| AuditError::Authentication("no credentials provider configured".into()))?;

    provider
        .provide_credentials()
        .await
        .map(|_| ())
        .map_err(|e| AuditError::Authentication(e.to_string()))
}

async fn resolve_account_id(sts: &aws_sdk_sts::Client) -> AuditResult<String> {
    let identity = sts.get_caller_identity().send().await.map_err(|e| {
        AuditError::Connectivity(format!("GetCallerIdentity failed: {}", DisplayErrorContext(&e)))
    })?;

    identity
        .account()
        .map(str::to_string)
        .ok_or_else(|| AuditError::Connectivity("GetCallerIdentity returned no account".into()))
}
