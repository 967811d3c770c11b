// deckvault/server/src/db.rs

//! Pool setup, migrations and admin seeding.

use crate::errors::{AppError, Result};
use crate::services::auth_service;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{info, instrument, warn};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub async fn connect(database_url: &str) -> Result<SqlitePool> {
  let options = SqliteConnectOptions::from_str(database_url)
    .map_err(|e| AppError::Config(format!("Invalid DATABASE_URL: {}", e)))?
    .create_if_missing(true)
    .foreign_keys(true)
    .journal_mode(SqliteJournalMode::Wal);

  let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;
  info!("Successfully connected to the database.");
  Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
  MIGRATOR.run(pool).await?;
  info!("Database migrations applied.");
  Ok(())
}

/// Ensures the configured admin exists, is approved and is an admin.
/// An existing account keeps its password.
#[instrument(name = "db::seed_admin", skip(pool, password))]
pub async fn seed_admin(pool: &SqlitePool, username: &str, password: &str) -> Result<()> {
  let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
    .bind(username)
    .fetch_one(pool)
    .await?;

  if exists {
    sqlx::query("UPDATE users SET is_admin = 1, approved = 1 WHERE username = ?")
      .bind(username)
      .execute(pool)
      .await?;
    info!("Seed admin already present; ensured admin and approved flags.");
    return Ok(());
  }

  if password.len() < 8 {
    warn!("ADMIN_PASSWORD is shorter than 8 characters.");
  }
  let hash = auth_service::hash_password(password)?;
  sqlx::query("INSERT INTO users (username, password_hash, is_admin, approved, created_at) VALUES (?, ?, 1, 1, ?)")
    .bind(username)
    .bind(hash)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await?;
  info!("Seed admin created.");
  Ok(())
}
