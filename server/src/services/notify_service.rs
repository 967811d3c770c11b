// deckvault/server/src/services/notify_service.rs

//! In-app notifications plus best-effort pushes to Discord and Gotify.
//!
//! Pushes are spawned and never retried; a failed delivery is logged and dropped. Only the
//! explicit "test" endpoints wait for the outcome.

use crate::errors::{AppError, Result as AppResult};
use crate::models::notification::{Notification, NOTIFICATION_COLUMNS};
use crate::models::{DiscordWebhook, GotifyConfig};
use async_trait::async_trait;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const PUSH_TITLE: &str = "Deckvault";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
  Discord { url: String },
  Gotify { server_url: String, app_token: String },
}

impl PushTarget {
  pub fn kind(&self) -> &'static str {
    match self {
      PushTarget::Discord { .. } => "discord",
      PushTarget::Gotify { .. } => "gotify",
    }
  }
}

#[async_trait]
pub trait PushSink: Send + Sync {
  async fn push(&self, target: &PushTarget, title: &str, message: &str) -> AppResult<()>;
}

/// The process-wide outbound client, shared by push delivery and version checks.
pub fn build_http_client() -> AppResult<reqwest::Client> {
  reqwest::Client::builder()
    .timeout(Duration::from_secs(10))
    .build()
    .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Posts to the real endpoints with reqwest.
pub struct HttpPushSink {
  client: reqwest::Client,
}

impl HttpPushSink {
  pub fn new(client: reqwest::Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl PushSink for HttpPushSink {
  async fn push(&self, target: &PushTarget, title: &str, message: &str) -> AppResult<()> {
    let request = match target {
      PushTarget::Discord { url } => self
        .client
        .post(url)
        .json(&json!({ "content": format!("**{}**\n{}", title, message) })),
      PushTarget::Gotify { server_url, app_token } => self
        .client
        .post(format!("{}/message", server_url.trim_end_matches('/')))
        .header("X-Gotify-Key", app_token)
        .json(&json!({ "title": title, "message": message, "priority": 5 })),
    };

    let response = request
      .send()
      .await
      .map_err(|e| AppError::Webhook(format!("{} delivery failed: {}", target.kind(), e)))?;
    if !response.status().is_success() {
      return Err(AppError::Webhook(format!(
        "{} endpoint responded with {}",
        target.kind(),
        response.status()
      )));
    }
    Ok(())
  }
}

pub fn is_http_url(url: &str) -> bool {
  let url = url.trim();
  (url.starts_with("https://") && url.len() > "https://".len()) || (url.starts_with("http://") && url.len() > "http://".len())
}

#[derive(Clone)]
pub struct Notifier {
  pool: SqlitePool,
  sink: Arc<dyn PushSink>,
}

impl Notifier {
  pub fn new(pool: SqlitePool, sink: Arc<dyn PushSink>) -> Self {
    Self { pool, sink }
  }

  /// Delivers immediately and reports the outcome.
  pub async fn send_now(&self, target: &PushTarget, title: &str, message: &str) -> AppResult<()> {
    self.sink.push(target, title, message).await
  }

  /// Stores an in-app notification and mirrors it to the user's Gotify in the background.
  #[instrument(name = "notifier::notify_user", skip(self, message, link))]
  pub async fn notify_user(&self, username: &str, message: &str, link: Option<&str>) -> AppResult<Notification> {
    let notification: Notification = sqlx::query_as(&format!(
      "INSERT INTO notifications (username, message, link, is_read, created_at) VALUES (?, ?, ?, 0, ?) RETURNING {}",
      NOTIFICATION_COLUMNS
    ))
    .bind(username)
    .bind(message)
    .bind(link)
    .bind(chrono::Utc::now())
    .fetch_one(&self.pool)
    .await?;
    debug!(notification_id = notification.id, "In-app notification stored.");

    let (pool, sink) = (self.pool.clone(), self.sink.clone());
    let (username, message) = (username.to_string(), message.to_string());
    tokio::spawn(async move {
      let config = sqlx::query_as::<_, GotifyConfig>(
        "SELECT username, server_url, app_token, enabled, updated_at FROM gotify_config WHERE username = ?",
      )
      .bind(&username)
      .fetch_optional(&pool)
      .await;
      match config {
        Ok(Some(cfg)) if cfg.enabled => {
          let target = PushTarget::Gotify {
            server_url: cfg.server_url,
            app_token: cfg.app_token,
          };
          if let Err(e) = sink.push(&target, PUSH_TITLE, &message).await {
            warn!(error = %e, username = %username, "Gotify push failed; dropping.");
          }
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Could not load Gotify config; skipping push."),
      }
    });

    Ok(notification)
  }

  /// Notifies every approved admin.
  pub async fn notify_admins(&self, message: &str, link: Option<&str>) -> AppResult<()> {
    let admins: Vec<String> = sqlx::query_scalar("SELECT username FROM users WHERE is_admin = 1 AND approved = 1")
      .fetch_all(&self.pool)
      .await?;
    for admin in admins {
      self.notify_user(&admin, message, link).await?;
    }
    Ok(())
  }

  /// Posts to the configured Discord webhook in the background, if one is enabled.
  pub fn broadcast_discord(&self, message: &str) {
    let (pool, sink) = (self.pool.clone(), self.sink.clone());
    let message = message.to_string();
    tokio::spawn(async move {
      let webhook = sqlx::query_as::<_, DiscordWebhook>("SELECT url, enabled, updated_at FROM discord_webhook WHERE id = 1")
        .fetch_optional(&pool)
        .await;
      match webhook {
        Ok(Some(hook)) if hook.enabled => {
          let target = PushTarget::Discord { url: hook.url };
          match sink.push(&target, PUSH_TITLE, &message).await {
            Ok(()) => info!("Discord broadcast delivered."),
            Err(e) => warn!(error = %e, "Discord broadcast failed; dropping."),
          }
        }
        Ok(_) => debug!("No enabled Discord webhook; broadcast skipped."),
        Err(e) => warn!(error = %e, "Could not load Discord webhook; broadcast skipped."),
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_http_urls_are_accepted() {
    assert!(is_http_url("https://discord.com/api/webhooks/1/abc"));
    assert!(is_http_url("http://gotify.local:8080"));
    assert!(!is_http_url("ftp://example.com"));
    assert!(!is_http_url("https://"));
  }
}
