//! Agency Site Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod dashboard;
pub mod domain;
pub mod site;

pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, ErrorResponse};
pub use domain::{DomainError, OperationContext, Rating, RatingError};
