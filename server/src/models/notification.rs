// deckvault/server/src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: i64,
  pub username: String,
  pub message: String,
  pub link: Option<String>,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
}

pub const NOTIFICATION_COLUMNS: &str = "id, username, message, link, is_read, created_at";
