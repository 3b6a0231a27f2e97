//! API Integration Tests
//!
//! These need a migrated Postgres database in `DATABASE_URL` and share its
//! tables, so run them serially:
//! `cargo test --test integration_api -- --ignored --test-threads=1`

use agency_site::api;
use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use serde_json::json;
use tower::util::ServiceExt;

mod common;

use common::{body_json, request, DISABLED_KEY, STAFF_KEY, VISITOR_KEY};

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_contact_then_dashboard() {
    let pool = common::setup_test_db().await;
    let app = api::build_router(common::test_state(pool.clone()));

    for (email, company) in [
        ("ada@engines.io", "Analytical Engines"),
        ("ADA@engines.io", " Analytical Engines "),
        ("grace@navy.mil", ""),
    ] {
        let req = request(
            "POST",
            "/api/v1/contact",
            None,
            Some(json!({
                "name": "Visitor",
                "email": email,
                "phone": "555-0100",
                "company_name": company,
                "subject": "Quote",
                "message": "Please get in touch."
            })),
        );
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED, "Contact submission failed");
    }

    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/dashboard", Some(STAFF_KEY), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let snapshot = body_json(response).await;
    // Emails are lowercased on the way in, blank companies are not counted
    assert_eq!(snapshot["total_clients"], 2);
    assert_eq!(snapshot["stats_details"]["unique_companies"], 1);
    assert_eq!(snapshot["avg_rating"], 0.0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_dashboard_requires_staff_key() {
    let pool = common::setup_test_db().await;
    let app = api::build_router(common::test_state(pool));

    let cases = [
        (None, StatusCode::UNAUTHORIZED),
        (Some("not_a_real_key"), StatusCode::UNAUTHORIZED),
        (Some(DISABLED_KEY), StatusCode::UNAUTHORIZED),
        (Some(VISITOR_KEY), StatusCode::FORBIDDEN),
        (Some(STAFF_KEY), StatusCode::OK),
    ];

    for (key, expected) in cases {
        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/dashboard", key, None))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "key {:?}", key);
    }

    // Query-string key, as used by browser WebSocket clients
    let uri = format!("/api/v1/dashboard?api_key={}", STAFF_KEY);
    let response = app.oneshot(request("GET", &uri, None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_newsletter_is_idempotent() {
    let pool = common::setup_test_db().await;
    let app = api::build_router(common::test_state(pool.clone()));

    for _ in 0..2 {
        let req = request("POST", "/api/v1/newsletter", None, Some(json!({"email": "News@Example.com"})));
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM newsletters")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    // Lapsed subscriptions are reactivated
    sqlx::query("UPDATE newsletters SET is_active = false")
        .execute(&pool)
        .await
        .unwrap();
    let req = request("POST", "/api/v1/newsletter", None, Some(json!({"email": "news@example.com"})));
    assert_eq!(app.oneshot(req).await.unwrap().status(), StatusCode::OK);

    let active: bool = sqlx::query_scalar("SELECT is_active FROM newsletters WHERE email = 'news@example.com'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(active);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_event_detail() {
    let pool = common::setup_test_db().await;
    let date = Utc.with_ymd_and_hms(2030, 3, 15, 18, 0, 0).unwrap();
    let event_id = common::seed_event(&pool, "Rust Workshop", date, Some(20)).await;
    let app = api::build_router(common::test_state(pool));

    let uri = format!("/api/v1/events/{}", event_id);
    let response = app.clone().oneshot(request("GET", &uri, None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["title"], "Rust Workshop");
    assert_eq!(body["date"], "March 15, 2030");
    assert_eq!(body["event_type"], "Workshop");
    assert_eq!(body["spots_remaining"], 20);

    let response = app
        .oneshot(request("GET", "/api/v1/events/999999", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "event_not_found");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_registration_respects_capacity() {
    let pool = common::setup_test_db().await;
    let date = Utc.with_ymd_and_hms(2030, 6, 1, 9, 0, 0).unwrap();
    let event_id = common::seed_event(&pool, "Small Webinar", date, Some(1)).await;
    let app = api::build_router(common::test_state(pool.clone()));

    let uri = format!("/api/v1/events/{}/register", event_id);
    let attendee = |email: &str| {
        json!({"name": "Attendee", "email": email, "phone": "555-0101"})
    };

    let response = app
        .clone()
        .oneshot(request("POST", &uri, None, Some(attendee("first@example.com"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["registration_status"], "pending");

    let response = app
        .clone()
        .oneshot(request("POST", &uri, None, Some(attendee("second@example.com"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error_code"], "event_full");

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/events/999999/register",
            None,
            Some(attendee("third@example.com")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The pending registration shows up on the dashboard
    let response = app
        .oneshot(request("GET", "/api/v1/dashboard", Some(STAFF_KEY), None))
        .await
        .unwrap();
    let snapshot = body_json(response).await;
    assert_eq!(snapshot["stats_details"]["registrations"]["pending"], 1);
    assert_eq!(snapshot["upcoming_events"], 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_analytics_counts_today() {
    let pool = common::setup_test_db().await;
    let app = api::build_router(common::test_state(pool.clone()));

    let req = request(
        "POST",
        "/api/v1/contact",
        None,
        Some(json!({
            "name": "Visitor",
            "email": "visitor@example.com",
            "phone": "555-0100",
            "subject": "Hello",
            "message": "Just saying hi."
        })),
    );
    assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::CREATED);

    let date = Utc.with_ymd_and_hms(2030, 9, 1, 10, 0, 0).unwrap();
    let hall_a = common::seed_event(&pool, "Morning Talk", date, None).await;
    let hall_b = common::seed_event(&pool, "Evening Talk", date, None).await;
    let harbour: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO events (title, description, date, location, is_upcoming, event_type)
        VALUES ('Harbour Meetup', 'Casual', $1, 'Harbour Room', true, 'conference')
        RETURNING id
        "#,
    )
    .bind(date)
    .fetch_one(&pool)
    .await
    .unwrap();

    for (event_id, email) in [
        (hall_a, "one@example.com"),
        (hall_b, "two@example.com"),
        (harbour, "three@example.com"),
    ] {
        let uri = format!("/api/v1/events/{}/register", event_id);
        let body = json!({"name": "Attendee", "email": email, "phone": "555-0101"});
        let response = app.clone().oneshot(request("POST", &uri, None, Some(body))).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(request("GET", "/api/v1/admin/analytics", Some(STAFF_KEY), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["today_messages"], 1);
    assert_eq!(body["message_growth"], 1);
    assert_eq!(body["totals"]["messages"], 1);
    assert_eq!(body["today_registrations"], 3);

    // Events sharing a location are counted together
    let by_location = &body["registrations_by_location"];
    assert_eq!(by_location[0]["location"], "Main Hall");
    assert_eq!(by_location[0]["registration_count"], 2);
    assert_eq!(by_location[1]["location"], "Harbour Room");
    assert_eq!(by_location[1]["registration_count"], 1);

    let response = app
        .oneshot(request("GET", "/api/v1/admin/analytics", Some(VISITOR_KEY), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
