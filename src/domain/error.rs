//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Business rule violations for the site's write side.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A submitted field failed validation
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// Event not found
    #[error("Event not found: {0}")]
    EventNotFound(i64),

    /// Event has reached its participant limit
    #[error("Event is fully booked: {0}")]
    EventFull(i64),
}

impl DomainError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DomainError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
