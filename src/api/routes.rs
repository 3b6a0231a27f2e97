//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::dashboard::{Aggregator, Snapshot};
use crate::domain::{OperationContext, RegistrationStatus};
use crate::error::AppError;
use crate::site::{
    AnalyticsSummary, ContactCommand, EventDetail, RegistrationCommand, SiteService,
    SubscribeCommand,
};

use super::{ws, AppState};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: i64,
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewsletterRequest {
    pub email: String,
}

/// `{status, message}` body shared by the public form endpoints
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventRegistrationRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct EventRegistrationResponse {
    pub registration_id: i64,
    pub event_id: i64,
    pub registration_status: RegistrationStatus,
    pub registration_date: DateTime<Utc>,
    pub status: &'static str,
    pub message: &'static str,
}

// =========================================================================
// API Router
// =========================================================================

/// Routes open to anonymous site visitors
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(submit_contact))
        .route("/newsletter", post(subscribe_newsletter))
        .route("/events/:event_id", get(get_event))
        .route("/events/:event_id/register", post(register_for_event))
}

/// Routes that require a staff API key
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/ws", get(ws::dashboard_ws))
        .route("/admin/analytics", get(get_analytics))
}

// =========================================================================
// Staff: dashboard and analytics
// =========================================================================

/// GET /dashboard - one snapshot, computed on demand
async fn get_dashboard(
    State(aggregator): State<Aggregator>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<Snapshot>, AppError> {
    let snapshot = aggregator.compute_snapshot().await?;
    tracing::debug!(
        api_key_id = ?context.api_key_id,
        correlation_id = ?context.correlation_id,
        "Dashboard snapshot served"
    );
    Ok(Json(snapshot))
}

/// GET /admin/analytics
async fn get_analytics(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let service = SiteService::new(pool);
    let summary = service.analytics(Utc::now().date_naive()).await?;
    tracing::debug!(
        api_key_id = ?context.api_key_id,
        correlation_id = ?context.correlation_id,
        "Analytics summary served"
    );
    Ok(Json(summary))
}

// =========================================================================
// Public: contact, newsletter, events
// =========================================================================

/// POST /contact
async fn submit_contact(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    let Json(request) = payload?;
    let command = ContactCommand::new(
        &request.name,
        &request.email,
        &request.phone,
        request.company_name.as_deref(),
        request.job_title.as_deref(),
        &request.subject,
        &request.message,
    )?;

    let id = SiteService::new(pool).submit_contact(command, &context).await?;

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            id,
            status: "success",
            message: "Thank you for your message! We will get back to you soon.",
        }),
    ))
}

/// POST /newsletter - repeating a subscription is not an error
async fn subscribe_newsletter(
    State(pool): State<PgPool>,
    payload: Result<Json<NewsletterRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let Json(request) = payload?;
    let command = SubscribeCommand::new(&request.email)?;
    SiteService::new(pool).subscribe(command).await?;

    Ok(Json(StatusResponse {
        status: "success",
        message: "Thank you for subscribing to our newsletter!",
    }))
}

/// GET /events/:event_id
async fn get_event(
    State(pool): State<PgPool>,
    Path(event_id): Path<i64>,
) -> Result<Json<EventDetail>, AppError> {
    let detail = SiteService::new(pool).event_detail(event_id).await?;
    Ok(Json(detail))
}

/// POST /events/:event_id/register
async fn register_for_event(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(event_id): Path<i64>,
    payload: Result<Json<EventRegistrationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventRegistrationResponse>), AppError> {
    let Json(request) = payload?;
    let command = RegistrationCommand::new(event_id, &request.name, &request.email, &request.phone)?;
    let result = SiteService::new(pool).register(command, &context).await?;

    Ok((
        StatusCode::CREATED,
        Json(EventRegistrationResponse {
            registration_id: result.registration_id,
            event_id: result.event_id,
            registration_status: result.status,
            registration_date: result.registration_date,
            status: "success",
            message: "Thank you for registering! Check your email for confirmation.",
        }),
    ))
}
