// deckvault/server/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: i64,
  pub username: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub is_admin: bool,
  pub approved: bool,
  pub created_at: DateTime<Utc>,
}

pub const USER_COLUMNS: &str = "id, username, password_hash, is_admin, approved, created_at";
