//! Audit result type

use super::error::AuditError;

/// Standard result type for audit operations
pub type AuditResult<T> = std::result::Result<T, AuditError>;
