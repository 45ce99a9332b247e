//! trail-audit - CloudTrail logging compliance auditor
//!
//! Lists an account's CloudTrail trails, checks each trail's event
//! selectors against a fixed policy (management events logged, data events
//! logged) and writes a JSON report. Layered the usual way: the domain holds
//! the pure evaluation and aggregation, infrastructure talks to AWS and the
//! filesystem, and the interface layer is the CLI.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::AuditError;
pub use domain::shared::result::AuditResult;
