//! Command definitions
//!
//! Commands represent validated submissions from the public site.

use serde::{Deserialize, Serialize};

use crate::domain::validation::{email, optional_text, required_text};
use crate::domain::DomainError;

// =========================================================================
// Contact form
// =========================================================================

/// Command to store a contact inquiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactCommand {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub subject: String,
    pub message: String,
}

impl ContactCommand {
    /// Validate raw form input into a command
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        email_address: &str,
        phone: &str,
        company_name: Option<&str>,
        job_title: Option<&str>,
        subject: &str,
        message: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name: required_text("name", name, 100)?,
            email: email("email", email_address)?,
            phone: required_text("phone", phone, 20)?,
            company_name: optional_text("company_name", company_name, 100)?,
            job_title: optional_text("job_title", job_title, 100)?,
            subject: required_text("subject", subject, 200)?,
            message: required_text("message", message, 10_000)?,
        })
    }
}

// =========================================================================
// Event registration
// =========================================================================

/// Command to register an attendee for an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationCommand {
    pub event_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl RegistrationCommand {
    pub fn new(event_id: i64, name: &str, email_address: &str, phone: &str) -> Result<Self, DomainError> {
        Ok(Self {
            event_id,
            name: required_text("name", name, 100)?,
            email: email("email", email_address)?,
            phone: required_text("phone", phone, 20)?,
        })
    }
}

// =========================================================================
// Newsletter
// =========================================================================

/// Command to subscribe an address to the newsletter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeCommand {
    pub email: String,
}

impl SubscribeCommand {
    pub fn new(email_address: &str) -> Result<Self, DomainError> {
        Ok(Self {
            email: email("email", email_address)?,
        })
    }
}
