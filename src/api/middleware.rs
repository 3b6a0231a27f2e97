//! API Middleware
//!
//! Request context, staff authentication and request logging.

use std::net::IpAddr;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::OperationContext;
use crate::error::AppError;

/// Permissions that grant access to staff-only endpoints
const STAFF_PERMISSIONS: &[&str] = &["staff", "admin"];

/// API Key authentication result
#[derive(Debug, Clone)]
pub struct AuthenticatedApiKey {
    pub id: Uuid,
    pub name: String,
    pub permissions: Vec<String>,
}

impl AuthenticatedApiKey {
    /// Check if this API key has a specific permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission || p == "admin")
    }

    pub fn is_staff(&self) -> bool {
        STAFF_PERMISSIONS.iter().any(|p| self.has_permission(p))
    }
}

/// Hex-encoded sha256 of a raw API key, as stored in `api_keys.key_hash`
pub fn hash_api_key(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

// =========================================================================
// Request context
// =========================================================================

/// Attach an [`OperationContext`] to every API request
pub async fn context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let context = request_context(request.headers());
    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Context from the caller's correlation id and forwarded address
fn request_context(headers: &HeaderMap) -> OperationContext {
    let mut context = OperationContext::new();

    if let Some(correlation_id) = headers
        .get("X-Correlation-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        context = context.with_correlation_id(correlation_id);
    }
    if let Some(ip) = forwarded_client_ip(headers) {
        context = context.with_client_ip(ip);
    }

    context.ensure_correlation_id();
    context
}

/// First address of X-Forwarded-For, if it parses
fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok())
}

// =========================================================================
// Staff authentication
// =========================================================================

/// `?api_key=` fallback for clients that cannot set headers (browser WebSockets)
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeyQuery {
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Pick the raw key from the X-API-Key header, falling back to the query string
fn extract_api_key<'a>(headers: &'a HeaderMap, query: &'a ApiKeyQuery) -> Option<&'a str> {
    headers
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .or(query.api_key.as_deref())
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

/// Validate the API key and require a staff permission.
///
/// Runs before any handler, so a refused WebSocket request is never upgraded.
pub async fn auth_middleware(
    State(pool): State<PgPool>,
    Query(query): Query<ApiKeyQuery>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let raw_key = extract_api_key(request.headers(), &query).ok_or(AppError::MissingApiKey)?;

    let record: Option<(Uuid, String, Vec<String>, bool)> = sqlx::query_as(
        r#"
        SELECT id, name, permissions, is_active
        FROM api_keys
        WHERE key_hash = $1
        "#,
    )
    .bind(hash_api_key(raw_key))
    .fetch_optional(&pool)
    .await?;

    let (api_key_id, name, permissions, is_active) = record.ok_or(AppError::InvalidApiKey)?;

    if !is_active {
        tracing::warn!(api_key_id = %api_key_id, "Disabled API key presented");
        return Err(AppError::InvalidApiKey);
    }

    let api_key = AuthenticatedApiKey {
        id: api_key_id,
        name,
        permissions,
    };

    if !api_key.is_staff() {
        tracing::warn!(api_key_id = %api_key.id, name = %api_key.name, "API key lacks staff permission");
        return Err(AppError::PermissionDenied);
    }

    let context = request
        .extensions()
        .get::<OperationContext>()
        .cloned()
        .unwrap_or_default()
        .with_api_key(api_key.id);

    request.extensions_mut().insert(context);
    request.extensions_mut().insert(api_key);

    Ok(next.run(request).await)
}

// =========================================================================
// Logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["x-api-key", "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Strip `api_key` from a query string before it reaches the logs
pub fn mask_query_for_logging(query: &str) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("api_key", _)) => "api_key=[REDACTED]".to_string(),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(mask_query_for_logging);
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    let (correlation_id, client_ip) = request
        .extensions()
        .get::<OperationContext>()
        .map(|ctx| (ctx.correlation_id, ctx.client_ip))
        .unwrap_or_default();

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        path = %path,
        query = ?query,
        version = ?version,
        correlation_id = ?correlation_id,
        client_ip = ?client_ip,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}
