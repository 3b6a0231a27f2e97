//! Database module
//!
//! Database connection and schema utilities.

use sqlx::PgPool;

/// Tables the site and dashboard read from or write to
const REQUIRED_TABLES: &[&str] = &[
    "api_keys",
    "services",
    "portfolios",
    "testimonials",
    "blog_posts",
    "events",
    "event_registrations",
    "contact_messages",
    "newsletters",
];

/// Verify database connectivity.
/// The schema itself lives in raw SQL files under migrations/.
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    tracing::info!(tables = REQUIRED_TABLES.len(), "Database schema verified");
    Ok(true)
}
