// deckvault/server/src/models/webhook.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DiscordWebhook {
  pub url: String,
  pub enabled: bool,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct GotifyConfig {
  pub username: String,
  pub server_url: String,
  pub app_token: String,
  pub enabled: bool,
  pub updated_at: DateTime<Utc>,
}
