//! Issue a staff API key
//!
//! Run with: cargo run --bin issue_api_key -- --name "Front desk" --permissions staff
//!
//! The raw key is printed once; only its sha256 hash is stored.

use agency_site::api::middleware::hash_api_key;
use rand::RngCore;
use sqlx::postgres::PgPoolOptions;

/// Prefix that marks a string as one of our keys
const KEY_PREFIX: &str = "ags_";

/// Characters of the key kept in clear for identification: the marker plus
/// 16 hex digits (64 random bits)
const STORED_PREFIX_LEN: usize = KEY_PREFIX.len() + 16;

/// New raw key: the marker followed by 32 random bytes in hex
fn generate_key() -> String {
    let mut secret = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);
    format!("{}{}", KEY_PREFIX, hex::encode(secret))
}

/// Part of a raw key stored in clear
fn stored_prefix(raw_key: &str) -> &str {
    raw_key.get(..STORED_PREFIX_LEN).unwrap_or(raw_key)
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let name = arg_value(&args, "--name").unwrap_or_else(|| "Staff dashboard".to_string());
    let permissions: Vec<String> = arg_value(&args, "--permissions")
        .unwrap_or_else(|| "staff".to_string())
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if permissions.is_empty() {
        anyhow::bail!("--permissions must name at least one permission");
    }

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    let raw_key = generate_key();
    let key_prefix = stored_prefix(&raw_key);

    let id = uuid::Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO api_keys (id, name, key_hash, key_prefix, permissions, is_active)
        VALUES ($1, $2, $3, $4, $5, true)
        "#,
    )
    .bind(id)
    .bind(&name)
    .bind(hash_api_key(&raw_key))
    .bind(key_prefix)
    .bind(&permissions)
    .execute(&pool)
    .await?;

    println!("Issued API key '{}' ({})", name, id);
    println!("Permissions: {}", permissions.join(", "));
    println!();
    println!("  {}", raw_key);
    println!();
    println!("Store it now; it cannot be shown again.");

    pool.close().await;
    Ok(())
}
