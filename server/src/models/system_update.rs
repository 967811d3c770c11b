// deckvault/server/src/models/system_update.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
  Update,
  Rollback,
}

impl UpdateKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      UpdateKind::Update => "update",
      UpdateKind::Rollback => "rollback",
    }
  }
}

/// One run of the update or rollback script.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SystemUpdate {
  pub id: i64,
  pub kind: String,
  pub from_version: String,
  /// running | succeeded | failed
  pub status: String,
  pub output: Option<String>,
  pub started_by: Option<String>,
  pub started_at: DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
}

pub const SYSTEM_UPDATE_COLUMNS: &str = "id, kind, from_version, status, output, started_by, started_at, finished_at";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledUpdate {
  pub id: i64,
  pub run_at: DateTime<Utc>,
  /// pending | done | failed
  pub status: String,
  pub created_by: String,
  pub created_at: DateTime<Utc>,
  pub update_id: Option<i64>,
}

pub const SCHEDULED_UPDATE_COLUMNS: &str = "id, run_at, status, created_by, created_at, update_id";
