//! Site Entities
//!
//! Read models for the content the site publishes and the inquiries it
//! collects. Column names match the tables in `migrations/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Rating;

/// Kind of event, as offered in the events listing filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    All,
    Workshop,
    Conference,
    Webinar,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::All => "all",
            EventType::Workshop => "workshop",
            EventType::Conference => "conference",
            EventType::Webinar => "webinar",
        }
    }

    /// Human-readable label shown on the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            EventType::All => "All Events",
            EventType::Workshop => "Workshop",
            EventType::Conference => "Conference",
            EventType::Webinar => "Webinar",
        }
    }

    /// Unknown stored values fall back to `All`, the column default.
    pub fn from_db(value: &str) -> Self {
        match value {
            "workshop" => EventType::Workshop,
            "conference" => EventType::Conference,
            "webinar" => EventType::Webinar,
            _ => EventType::All,
        }
    }
}

/// Registration lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub id: i64,
    pub email: String,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub is_upcoming: bool,
    pub event_type: EventType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRegistration {
    pub id: i64,
    pub event_id: i64,
    pub registration_date: DateTime<Utc>,
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub read_time: i32,
    pub is_published: bool,
    pub created_date: DateTime<Utc>,
    pub published_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Testimonial {
    pub id: i64,
    pub client_name: String,
    pub rating: Rating,
    pub service_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub id: i64,
    pub title: String,
    pub service_id: Option<i64>,
}
