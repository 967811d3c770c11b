// deckvault/server/src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
  pub id: i64,
  pub username: Option<String>,
  pub action: String,
  pub detail: Option<String>,
  pub created_at: DateTime<Utc>,
}
