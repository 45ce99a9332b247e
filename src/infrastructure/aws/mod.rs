//! AWS integration: credential/client provider and the CloudTrail source

pub mod clients;
pub mod cloudtrail;

pub use clients::{AwsClients, AwsSettings};
pub use cloudtrail::CloudTrailSource;
