// deckvault/server/src/services/activity_service.rs

//! Append-only audit trail of user and admin actions.

use crate::errors::Result as AppResult;
use crate::models::Activity;
use sqlx::SqlitePool;
use tracing::warn;

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 100;
pub const MAX_ACTIVITY_LIMIT: i64 = 500;

/// Records an action. Failures are logged, never surfaced to the caller's request.
pub async fn record(pool: &SqlitePool, username: Option<&str>, action: &str, detail: Option<String>) {
  let result = sqlx::query("INSERT INTO activity (username, action, detail, created_at) VALUES (?, ?, ?, ?)")
    .bind(username)
    .bind(action)
    .bind(detail.as_deref())
    .bind(chrono::Utc::now())
    .execute(pool)
    .await;
  if let Err(e) = result {
    warn!(error = %e, action, "Failed to record activity.");
  }
}

pub async fn recent(pool: &SqlitePool, limit: i64) -> AppResult<Vec<Activity>> {
  let rows = sqlx::query_as::<_, Activity>(
    "SELECT id, username, action, detail, created_at FROM activity ORDER BY id DESC LIMIT ?",
  )
  .bind(limit.clamp(1, MAX_ACTIVITY_LIMIT))
  .fetch_all(pool)
  .await?;
  Ok(rows)
}
