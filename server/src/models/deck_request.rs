// deckvault/server/src/models/deck_request.rs

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
  Open,
  Fulfilled,
  Cancelled,
}

impl RequestStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      RequestStatus::Open => "open",
      RequestStatus::Fulfilled => "fulfilled",
      RequestStatus::Cancelled => "cancelled",
    }
  }
}

impl FromStr for RequestStatus {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "open" => Ok(RequestStatus::Open),
      "fulfilled" => Ok(RequestStatus::Fulfilled),
      "cancelled" => Ok(RequestStatus::Cancelled),
      other => Err(AppError::Validation(format!("Unknown request status '{}'.", other))),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeckRequest {
  pub id: i64,
  pub deck: String,
  /// Requesting user.
  pub username: String,
  pub note: Option<String>,
  pub status: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub const DECK_REQUEST_COLUMNS: &str = "id, deck, username, note, status, created_at, updated_at";
