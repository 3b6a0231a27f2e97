//! Site Service
//!
//! Write side of the public site plus the staff analytics summary.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::dashboard::source::start_of_day;
use crate::domain::{DomainError, EventType, OperationContext, RegistrationStatus};
use crate::error::AppError;

use super::{ContactCommand, RegistrationCommand, SubscribeCommand};

/// Format of event dates on the public detail endpoint
const DETAIL_DATE_FORMAT: &str = "%B %d, %Y";

/// Rows shown in each analytics top list
const ANALYTICS_TOP_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationResult {
    pub registration_id: i64,
    pub event_id: i64,
    pub status: RegistrationStatus,
    pub registration_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscribeOutcome {
    /// False when the address was already on the list
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub max_participants: Option<i32>,
    pub spots_remaining: Option<i64>,
    pub is_upcoming: bool,
    pub event_type: String,
    pub registration_url: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EventRegistrationCount {
    pub title: String,
    pub registration_count: i64,
}

/// Registrations across every event held at one location
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LocationCount {
    pub location: String,
    pub registration_count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PeriodCount {
    pub period: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SiteTotals {
    pub messages: i64,
    pub blogs: i64,
    pub services: i64,
    pub events: i64,
    pub registrations: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub today_messages: i64,
    pub today_events: i64,
    pub today_registrations: i64,
    pub today_blogs: i64,
    /// Today's messages minus yesterday's
    pub message_growth: i64,
    pub messages_by_month: Vec<PeriodCount>,
    pub messages_by_hour: Vec<PeriodCount>,
    pub top_events: Vec<EventRegistrationCount>,
    pub registrations_by_location: Vec<LocationCount>,
    pub totals: SiteTotals,
}

#[derive(Debug, sqlx::FromRow)]
struct EventDetailRow {
    id: i64,
    title: String,
    description: String,
    date: DateTime<Utc>,
    location: String,
    max_participants: Option<i32>,
    is_upcoming: bool,
    event_type: String,
    registration_url: String,
    active_registrations: i64,
}

/// Service for the public site's submissions and lookups
#[derive(Debug, Clone)]
pub struct SiteService {
    pool: PgPool,
}

impl SiteService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a contact inquiry and return its id
    pub async fn submit_contact(
        &self,
        command: ContactCommand,
        context: &OperationContext,
    ) -> Result<i64, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO contact_messages
                (name, email, phone, company_name, job_title, subject, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&command.name)
        .bind(&command.email)
        .bind(&command.phone)
        .bind(&command.company_name)
        .bind(&command.job_title)
        .bind(&command.subject)
        .bind(&command.message)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            contact_id = id,
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            "Contact message received"
        );

        Ok(id)
    }

    /// Add an address to the newsletter, reactivating it if it had lapsed
    pub async fn subscribe(&self, command: SubscribeCommand) -> Result<SubscribeOutcome, AppError> {
        // xmax = 0 only for a freshly inserted row
        let created: bool = sqlx::query_scalar(
            r#"
            INSERT INTO newsletters (email)
            VALUES ($1)
            ON CONFLICT (email) DO UPDATE SET is_active = true
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&command.email)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(created, "Newsletter subscription stored");

        Ok(SubscribeOutcome { created })
    }

    /// Public event detail
    pub async fn event_detail(&self, event_id: i64) -> Result<EventDetail, AppError> {
        let row: Option<EventDetailRow> = sqlx::query_as(
            r#"
            SELECT
                e.id, e.title, e.description, e.date, e.location, e.max_participants,
                e.is_upcoming, e.event_type, e.registration_url,
                (SELECT COUNT(*) FROM event_registrations r
                  WHERE r.event_id = e.id AND r.status <> 'cancelled') AS active_registrations
            FROM events e
            WHERE e.id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(DomainError::EventNotFound(event_id))?;

        Ok(EventDetail {
            id: row.id,
            title: row.title,
            description: row.description,
            date: row.date.format(DETAIL_DATE_FORMAT).to_string(),
            location: row.location,
            max_participants: row.max_participants,
            spots_remaining: spots_remaining(row.max_participants, row.active_registrations),
            is_upcoming: row.is_upcoming,
            event_type: EventType::from_db(&row.event_type).label().to_string(),
            registration_url: row.registration_url,
        })
    }

    /// Register an attendee as pending, unless the event is full
    pub async fn register(
        &self,
        command: RegistrationCommand,
        context: &OperationContext,
    ) -> Result<RegistrationResult, AppError> {
        let mut tx = self.pool.begin().await?;

        // Lock the event row so concurrent registrations see each other's counts
        let max_participants: Option<Option<i32>> =
            sqlx::query_scalar("SELECT max_participants FROM events WHERE id = $1 FOR UPDATE")
                .bind(command.event_id)
                .fetch_optional(&mut *tx)
                .await?;

        let max_participants =
            max_participants.ok_or(DomainError::EventNotFound(command.event_id))?;

        if let Some(max) = max_participants {
            let active: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND status <> 'cancelled'",
            )
            .bind(command.event_id)
            .fetch_one(&mut *tx)
            .await?;

            if spots_remaining(Some(max), active) == Some(0) {
                return Err(DomainError::EventFull(command.event_id).into());
            }
        }

        let (registration_id, registration_date): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO event_registrations (event_id, name, email, phone, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, registration_date
            "#,
        )
        .bind(command.event_id)
        .bind(&command.name)
        .bind(&command.email)
        .bind(&command.phone)
        .bind(RegistrationStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            registration_id,
            event_id = command.event_id,
            correlation_id = ?context.correlation_id,
            client_ip = ?context.client_ip,
            "Event registration created"
        );

        Ok(RegistrationResult {
            registration_id,
            event_id: command.event_id,
            status: RegistrationStatus::Pending,
            registration_date,
        })
    }

    /// Day-level activity and totals for the staff analytics page
    pub async fn analytics(&self, today: NaiveDate) -> Result<AnalyticsSummary, AppError> {
        let today_start = start_of_day(today);
        let tomorrow_start = today_start + Duration::days(1);
        let yesterday_start = today_start - Duration::days(1);

        let (today_messages, yesterday_messages, today_events, today_registrations, today_blogs): (
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM contact_messages WHERE created_at >= $2 AND created_at < $3),
                (SELECT COUNT(*) FROM contact_messages WHERE created_at >= $1 AND created_at < $2),
                (SELECT COUNT(*) FROM events WHERE date >= $2 AND date < $3),
                (SELECT COUNT(*) FROM event_registrations
                  WHERE registration_date >= $2 AND registration_date < $3),
                (SELECT COUNT(*) FROM blog_posts WHERE published_date >= $2 AND published_date < $3)
            "#,
        )
        .bind(yesterday_start)
        .bind(today_start)
        .bind(tomorrow_start)
        .fetch_one(&self.pool)
        .await?;

        let messages_by_month: Vec<PeriodCount> = sqlx::query_as(
            r#"
            SELECT to_char(date_trunc('month', created_at), 'YYYY-MM') AS period, COUNT(*) AS count
            FROM contact_messages
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let messages_by_hour: Vec<PeriodCount> = sqlx::query_as(
            r#"
            SELECT to_char(created_at, 'HH24') AS period, COUNT(*) AS count
            FROM contact_messages
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let top_events: Vec<EventRegistrationCount> = sqlx::query_as(
            r#"
            SELECT e.title, COUNT(r.id) AS registration_count
            FROM events e
            LEFT JOIN event_registrations r ON r.event_id = e.id
            GROUP BY e.id, e.title
            ORDER BY registration_count DESC, e.id
            LIMIT $1
            "#,
        )
        .bind(ANALYTICS_TOP_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let registrations_by_location: Vec<LocationCount> = sqlx::query_as(
            r#"
            SELECT e.location, COUNT(r.id) AS registration_count
            FROM event_registrations r
            JOIN events e ON e.id = r.event_id
            GROUP BY e.location
            ORDER BY registration_count DESC, e.location
            LIMIT $1
            "#,
        )
        .bind(ANALYTICS_TOP_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let totals: SiteTotals = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM contact_messages) AS messages,
                (SELECT COUNT(*) FROM blog_posts) AS blogs,
                (SELECT COUNT(*) FROM services) AS services,
                (SELECT COUNT(*) FROM events) AS events,
                (SELECT COUNT(*) FROM event_registrations) AS registrations
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AnalyticsSummary {
            today_messages,
            today_events,
            today_registrations,
            today_blogs,
            message_growth: today_messages - yesterday_messages,
            messages_by_month,
            messages_by_hour,
            top_events,
            registrations_by_location,
            totals,
        })
    }
}

/// Open places left, `None` for events without a participant limit
pub fn spots_remaining(max_participants: Option<i32>, active_registrations: i64) -> Option<i64> {
    max_participants.map(|max| (i64::from(max) - active_registrations).max(0))
}
