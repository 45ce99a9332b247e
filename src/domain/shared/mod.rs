//! Shared kernel - Common types used across the audit pipeline

pub mod error;
pub mod result;
pub mod value_objects;

pub use error::AuditError;
pub use result::AuditResult;
pub use value_objects::*;
