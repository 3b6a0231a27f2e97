//! Domain module
//!
//! Core domain types and business rules.

pub mod context;
pub mod error;
pub mod models;
pub mod rating;
pub mod validation;

pub use context::OperationContext;
pub use error::DomainError;
pub use models::{
    BlogPost, ContactMessage, Event, EventRegistration, EventType, Portfolio, RegistrationStatus,
    Service, Testimonial,
};
pub use rating::{Rating, RatingError};
