//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases.
//! It's responsible for:
//! - Fetching trail configuration through the `TrailSource` port
//! - Running the compliance policy over every trail
//! - Aggregating results into a report

pub mod audit;

pub use audit::{AuditOptions, AuditService};
