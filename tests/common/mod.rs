//! Common test utilities

#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, Utc};

use agency_site::api::middleware::hash_api_key;
use agency_site::api::AppState;
use agency_site::dashboard::BroadcastConfig;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::response::Response;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Key with the `staff` permission
pub const STAFF_KEY: &str = "test_staff_key_123";

/// Active key without any staff permission
pub const VISITOR_KEY: &str = "test_visitor_key_123";

/// Staff key that has been switched off
pub const DISABLED_KEY: &str = "test_disabled_key_123";

/// Setup test database - truncate tables and seed API keys
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    let mut tx = pool.begin().await.expect("Failed to begin transaction");

    // Clean up DB for fresh state
    sqlx::query(
        r#"
        TRUNCATE TABLE api_keys, contact_messages, newsletters, event_registrations, events,
            blog_posts, testimonials, portfolios, services
        RESTART IDENTITY CASCADE
        "#,
    )
    .execute(&mut *tx)
    .await
    .expect("Failed to clean up DB");

    let keys: [(&str, &str, Vec<&str>, bool); 3] = [
        (STAFF_KEY, "Test Staff", vec!["staff"], true),
        (VISITOR_KEY, "Test Visitor", vec!["read:events"], true),
        (DISABLED_KEY, "Test Disabled", vec!["staff"], false),
    ];

    for (raw, name, permissions, is_active) in keys {
        sqlx::query(
            r#"
            INSERT INTO api_keys (id, name, key_hash, key_prefix, permissions, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(name)
        .bind(hash_api_key(raw))
        .bind(&raw[..12])
        .bind(permissions.iter().map(|p| p.to_string()).collect::<Vec<_>>())
        .bind(is_active)
        .execute(&mut *tx)
        .await
        .expect("Failed to seed API key");
    }

    tx.commit().await.expect("Failed to commit transaction");

    pool
}

pub fn test_state(pool: PgPool) -> AppState {
    AppState::new(pool, Duration::from_secs(5), BroadcastConfig::default())
}

/// Insert an event and return its id
pub async fn seed_event(
    pool: &PgPool,
    title: &str,
    date: DateTime<Utc>,
    max_participants: Option<i32>,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO events (title, description, date, location, is_upcoming, max_participants, event_type)
        VALUES ($1, 'Hands-on session', $2, 'Main Hall', true, $3, 'workshop')
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(date)
    .bind(max_participants)
    .fetch_one(pool)
    .await
    .expect("Failed to seed event")
}

/// Build a request with an optional API key header and JSON body
pub fn request(method: &str, uri: &str, api_key: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-API-Key", key);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
