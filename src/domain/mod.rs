//! Domain layer - Core audit rules
//!
//! This layer contains:
//! - Trail and event selector model, and the `TrailSource` port
//! - Compliance evaluation
//! - Report aggregation

pub mod compliance;
pub mod report;
pub mod shared;
pub mod trail;

// Re-export commonly used types
pub use shared::{AuditError, AuditResult};
