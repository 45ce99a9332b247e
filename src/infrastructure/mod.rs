//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - AWS client construction and the CloudTrail trail source
//! - The offline snapshot trail source
//! - The JSON report writer

pub mod aws;
pub mod report;
pub mod snapshot;
