// deckvault/server/src/models/announcement.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
  pub id: i64,
  pub message: String,
  pub links: Json<Vec<String>>,
  pub created_by: String,
  pub expires_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

pub const ANNOUNCEMENT_COLUMNS: &str = "id, message, links, created_by, expires_at, created_at";

impl Announcement {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|at| at <= now)
  }
}
