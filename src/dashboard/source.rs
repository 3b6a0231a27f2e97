//! Dashboard Source
//!
//! Read-only access to the collections the dashboard summarizes. A source
//! answers one question per tick: "what does the site look like right now?",
//! returned as a [`DashboardView`] that the snapshot builder turns into
//! wire data without touching storage again.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{BlogPost, Event, EventType, Rating, Testimonial};

use super::error::StoreError;

/// Upcoming events listed in the snapshot
pub const NEXT_EVENTS_LIMIT: i64 = 5;

/// Published posts plotted in the blog chart
pub const BLOG_CHART_LIMIT: i64 = 5;

/// Entries taken from each activity source before merging
pub const ACTIVITY_SOURCE_LIMIT: i64 = 3;

/// Query results for one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    /// Distinct contact email addresses
    pub distinct_client_emails: i64,
    /// Distinct non-blank company names on contact messages
    pub distinct_companies: i64,
    /// Events dated today or later that are flagged upcoming
    pub upcoming_event_count: i64,
    /// Soonest upcoming events, ascending by date
    pub next_events: Vec<Event>,
    pub published_post_count: i64,
    /// Mean read time of published posts, `None` when there are none
    pub average_published_read_time: Option<Decimal>,
    /// Every testimonial rating
    pub ratings: Vec<Rating>,
    /// Every service with its related item counts, ordered by id
    pub services: Vec<ServicePopularity>,
    /// Most recently published posts, newest first
    pub latest_published_posts: Vec<BlogPost>,
    /// Most recently created posts (published or not), newest first
    pub newest_posts: Vec<BlogPost>,
    /// Events with the latest dates, latest first
    pub newest_events: Vec<Event>,
    /// Testimonials with the highest ids, highest first
    pub newest_testimonials: Vec<Testimonial>,
    pub registrations: RegistrationCounts,
}

/// Service title plus the number of portfolio items and testimonials
/// attached to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePopularity {
    pub title: String,
    pub portfolio_count: i64,
    pub testimonial_count: i64,
}

impl ServicePopularity {
    pub fn score(&self) -> i64 {
        self.portfolio_count + self.testimonial_count
    }
}

/// Event registrations grouped by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
}

/// Midnight UTC at the start of `today`; events from earlier today still count
/// as upcoming.
pub fn start_of_day(today: NaiveDate) -> DateTime<Utc> {
    today.and_time(NaiveTime::MIN).and_utc()
}

/// Read-only data access for the dashboard.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Read everything one snapshot needs, as of `today`.
    async fn read_view(&self, today: NaiveDate) -> Result<DashboardView, StoreError>;
}

// =========================================================================
// Postgres source
// =========================================================================

/// Dashboard source backed by the site database.
///
/// All queries of one read run inside a single read-only REPEATABLE READ
/// transaction, so the counts and lists of one view agree with each other.
#[derive(Debug, Clone)]
pub struct PgDashboardSource {
    pool: PgPool,
}

impl PgDashboardSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i64,
    title: String,
    date: DateTime<Utc>,
    location: String,
    is_upcoming: bool,
    event_type: String,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            title: row.title,
            date: row.date,
            location: row.location,
            is_upcoming: row.is_upcoming,
            event_type: EventType::from_db(&row.event_type),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BlogPostRow {
    id: i64,
    title: String,
    read_time: i32,
    is_published: bool,
    created_date: DateTime<Utc>,
    published_date: DateTime<Utc>,
}

impl From<BlogPostRow> for BlogPost {
    fn from(row: BlogPostRow) -> Self {
        BlogPost {
            id: row.id,
            title: row.title,
            read_time: row.read_time,
            is_published: row.is_published,
            created_date: row.created_date,
            published_date: row.published_date,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TestimonialRow {
    id: i64,
    client_name: String,
    rating: Decimal,
    service_id: Option<i64>,
}

impl TryFrom<TestimonialRow> for Testimonial {
    type Error = StoreError;

    fn try_from(row: TestimonialRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(row.rating).map_err(|e| {
            StoreError::InvalidData(format!("testimonial {}: {}", row.id, e))
        })?;
        Ok(Testimonial {
            id: row.id,
            client_name: row.client_name,
            rating,
            service_id: row.service_id,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    title: String,
    portfolio_count: i64,
    testimonial_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct RegistrationRow {
    pending: i64,
    confirmed: i64,
    cancelled: i64,
}

const EVENT_COLUMNS: &str = "id, title, date, location, is_upcoming, event_type, created_at";
const POST_COLUMNS: &str = "id, title, read_time, is_published, created_date, published_date";

#[async_trait]
impl DashboardSource for PgDashboardSource {
    async fn read_view(&self, today: NaiveDate) -> Result<DashboardView, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let view = read_in_transaction(&mut tx, start_of_day(today)).await?;

        // Nothing was written; ending the transaction just releases the snapshot
        tx.rollback().await?;

        Ok(view)
    }
}

async fn read_in_transaction(
    tx: &mut Transaction<'_, Postgres>,
    today_start: DateTime<Utc>,
) -> Result<DashboardView, StoreError> {
    let distinct_client_emails: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT email) FROM contact_messages")
            .fetch_one(&mut **tx)
            .await?;

    let distinct_companies: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT NULLIF(TRIM(company_name), '')) FROM contact_messages",
    )
    .fetch_one(&mut **tx)
    .await?;

    let upcoming_event_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE date >= $1 AND is_upcoming")
            .bind(today_start)
            .fetch_one(&mut **tx)
            .await?;

    let next_events: Vec<EventRow> = sqlx::query_as(&format!(
        r#"
        SELECT {EVENT_COLUMNS}
        FROM events
        WHERE date >= $1 AND is_upcoming
        ORDER BY date ASC, id ASC
        LIMIT $2
        "#
    ))
    .bind(today_start)
    .bind(NEXT_EVENTS_LIMIT)
    .fetch_all(&mut **tx)
    .await?;

    let published_post_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM blog_posts WHERE is_published")
            .fetch_one(&mut **tx)
            .await?;

    let average_published_read_time: Option<Decimal> =
        sqlx::query_scalar("SELECT AVG(read_time)::NUMERIC FROM blog_posts WHERE is_published")
            .fetch_one(&mut **tx)
            .await?;

    let ratings: Vec<Decimal> = sqlx::query_scalar("SELECT rating FROM testimonials ORDER BY id")
        .fetch_all(&mut **tx)
        .await?;
    let ratings = ratings
        .into_iter()
        .map(|r| Rating::new(r).map_err(|e| StoreError::InvalidData(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    // Correlated subqueries, since joining both tables would multiply the counts
    let services: Vec<ServiceRow> = sqlx::query_as(
        r#"
        SELECT
            s.title,
            (SELECT COUNT(*) FROM portfolios p WHERE p.service_id = s.id) AS portfolio_count,
            (SELECT COUNT(*) FROM testimonials t WHERE t.service_id = s.id) AS testimonial_count
        FROM services s
        ORDER BY s.id
        "#,
    )
    .fetch_all(&mut **tx)
    .await?;

    let latest_published_posts: Vec<BlogPostRow> = sqlx::query_as(&format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM blog_posts
        WHERE is_published
        ORDER BY published_date DESC, id DESC
        LIMIT $1
        "#
    ))
    .bind(BLOG_CHART_LIMIT)
    .fetch_all(&mut **tx)
    .await?;

    let newest_posts: Vec<BlogPostRow> = sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM blog_posts ORDER BY created_date DESC, id DESC LIMIT $1"
    ))
    .bind(ACTIVITY_SOURCE_LIMIT)
    .fetch_all(&mut **tx)
    .await?;

    let newest_events: Vec<EventRow> = sqlx::query_as(&format!(
        "SELECT {EVENT_COLUMNS} FROM events ORDER BY date DESC, id DESC LIMIT $1"
    ))
    .bind(ACTIVITY_SOURCE_LIMIT)
    .fetch_all(&mut **tx)
    .await?;

    let newest_testimonials: Vec<TestimonialRow> = sqlx::query_as(
        "SELECT id, client_name, rating, service_id FROM testimonials ORDER BY id DESC LIMIT $1",
    )
    .bind(ACTIVITY_SOURCE_LIMIT)
    .fetch_all(&mut **tx)
    .await?;

    let registrations: RegistrationRow = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN status = 'pending'   THEN 1 ELSE 0 END), 0) AS pending,
            COALESCE(SUM(CASE WHEN status = 'confirmed' THEN 1 ELSE 0 END), 0) AS confirmed,
            COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) AS cancelled
        FROM event_registrations
        "#,
    )
    .fetch_one(&mut **tx)
    .await?;

    Ok(DashboardView {
        distinct_client_emails,
        distinct_companies,
        upcoming_event_count,
        next_events: next_events.into_iter().map(Event::from).collect(),
        published_post_count,
        average_published_read_time,
        ratings,
        services: services
            .into_iter()
            .map(|row| ServicePopularity {
                title: row.title,
                portfolio_count: row.portfolio_count,
                testimonial_count: row.testimonial_count,
            })
            .collect(),
        latest_published_posts: latest_published_posts
            .into_iter()
            .map(BlogPost::from)
            .collect(),
        newest_posts: newest_posts.into_iter().map(BlogPost::from).collect(),
        newest_events: newest_events.into_iter().map(Event::from).collect(),
        newest_testimonials: newest_testimonials
            .into_iter()
            .map(Testimonial::try_from)
            .collect::<Result<Vec<_>, _>>()?,
        registrations: RegistrationCounts {
            pending: registrations.pending,
            confirmed: registrations.confirmed,
            cancelled: registrations.cancelled,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_start_of_day() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(start_of_day(today).to_rfc3339(), "2026-03-14T00:00:00+00:00");
    }

    #[test]
    fn test_service_popularity_score() {
        let service = ServicePopularity {
            title: "Cloud Migration".to_string(),
            portfolio_count: 3,
            testimonial_count: 2,
        };
        assert_eq!(service.score(), 5);
    }

    #[test]
    fn test_testimonial_row_rejects_bad_rating() {
        let row = TestimonialRow {
            id: 9,
            client_name: "Grace".to_string(),
            rating: dec!(6.0),
            service_id: None,
        };
        let err = Testimonial::try_from(row).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn test_event_row_maps_type() {
        let now = Utc::now();
        let event = Event::from(EventRow {
            id: 1,
            title: "Rust Day".to_string(),
            date: now,
            location: "Berlin".to_string(),
            is_upcoming: true,
            event_type: "conference".to_string(),
            created_at: now,
        });
        assert_eq!(event.event_type, EventType::Conference);
    }
}
