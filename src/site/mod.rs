//! Public site
//!
//! Contact form, newsletter, event detail and registration, plus the staff
//! analytics summary.

pub mod commands;
pub mod service;

pub use commands::{ContactCommand, RegistrationCommand, SubscribeCommand};
pub use service::{
    AnalyticsSummary, EventDetail, LocationCount, RegistrationResult, SiteService, SubscribeOutcome,
};
