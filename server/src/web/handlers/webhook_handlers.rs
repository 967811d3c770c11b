// deckvault/server/src/web/handlers/webhook_handlers.rs

//! Outbound push configuration: the shared Discord webhook and each user's Gotify server.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::{DiscordWebhook, GotifyConfig};
use crate::services::activity_service;
use crate::services::notify_service::{is_http_url, PushTarget, PUSH_TITLE};
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, Debug)]
pub struct DiscordWebhookPayload {
  pub url: String,
  #[serde(default = "default_enabled")]
  pub enabled: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GotifyPayload {
  pub server_url: String,
  pub app_token: String,
  #[serde(default = "default_enabled")]
  pub enabled: bool,
}

fn default_enabled() -> bool {
  true
}

fn require_http_url(url: &str) -> Result<String, AppError> {
  let url = url.trim();
  if !is_http_url(url) {
    return Err(AppError::Validation("URL must start with http:// or https://.".to_string()));
  }
  Ok(url.to_string())
}

async fn load_discord(app_state: &AppState) -> Result<Option<DiscordWebhook>, AppError> {
  let hook = sqlx::query_as::<_, DiscordWebhook>("SELECT url, enabled, updated_at FROM discord_webhook WHERE id = 1")
    .fetch_optional(&app_state.db_pool)
    .await?;
  Ok(hook)
}

async fn load_gotify(app_state: &AppState, username: &str) -> Result<Option<GotifyConfig>, AppError> {
  let config = sqlx::query_as::<_, GotifyConfig>(
    "SELECT username, server_url, app_token, enabled, updated_at FROM gotify_config WHERE username = ?",
  )
  .bind(username)
  .fetch_optional(&app_state.db_pool)
  .await?;
  Ok(config)
}

/// The token is never echoed back in full.
fn gotify_view(config: &GotifyConfig) -> serde_json::Value {
  let visible: String = config.app_token.chars().take(4).collect();
  json!({
      "serverUrl": config.server_url,
      "appToken": format!("{}…", visible),
      "enabled": config.enabled,
      "updatedAt": config.updated_at,
  })
}

#[instrument(name = "handler::get_discord_webhook", skip(app_state, _admin))]
pub async fn get_discord_webhook_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let webhook = load_discord(&app_state).await?;
  Ok(HttpResponse::Ok().json(json!({ "webhook": webhook })))
}

#[instrument(name = "handler::set_discord_webhook", skip(app_state, admin, req_payload), fields(admin = %admin.username()))]
pub async fn set_discord_webhook_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  req_payload: web::Json<DiscordWebhookPayload>,
) -> Result<HttpResponse, AppError> {
  let url = require_http_url(&req_payload.url)?;
  let webhook: DiscordWebhook = sqlx::query_as(
    "INSERT INTO discord_webhook (id, url, enabled, updated_at) VALUES (1, ?, ?, ?) \
     ON CONFLICT(id) DO UPDATE SET url = excluded.url, enabled = excluded.enabled, updated_at = excluded.updated_at \
     RETURNING url, enabled, updated_at",
  )
  .bind(&url)
  .bind(req_payload.enabled)
  .bind(chrono::Utc::now())
  .fetch_one(&app_state.db_pool)
  .await?;
  info!(enabled = webhook.enabled, "Discord webhook configured.");

  activity_service::record(&app_state.db_pool, Some(admin.username()), "set_discord_webhook", None).await;
  Ok(HttpResponse::Ok().json(json!({ "message": "Discord webhook saved.", "webhook": webhook })))
}

#[instrument(name = "handler::test_discord_webhook", skip(app_state, admin), fields(admin = %admin.username()))]
pub async fn test_discord_webhook_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  let webhook = load_discord(&app_state)
    .await?
    .ok_or_else(|| AppError::Validation("No Discord webhook is configured.".to_string()))?;
  let target = PushTarget::Discord { url: webhook.url };
  let message = format!("Test message from {}.", admin.username());
  app_state.notifier.send_now(&target, PUSH_TITLE, &message).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Test message delivered." })))
}

#[instrument(name = "handler::get_gotify", skip(app_state, auth_user), fields(username = %auth_user.username))]
pub async fn get_gotify_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let config = load_gotify(&app_state, &auth_user.username).await?;
  Ok(HttpResponse::Ok().json(json!({ "gotify": config.as_ref().map(gotify_view) })))
}

#[instrument(name = "handler::set_gotify", skip(app_state, auth_user, req_payload), fields(username = %auth_user.username))]
pub async fn set_gotify_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<GotifyPayload>,
) -> Result<HttpResponse, AppError> {
  let server_url = require_http_url(&req_payload.server_url)?;
  let app_token = req_payload.app_token.trim();
  if app_token.is_empty() {
    return Err(AppError::Validation("Gotify app token cannot be empty.".to_string()));
  }

  let config: GotifyConfig = sqlx::query_as(
    "INSERT INTO gotify_config (username, server_url, app_token, enabled, updated_at) VALUES (?, ?, ?, ?, ?) \
     ON CONFLICT(username) DO UPDATE SET server_url = excluded.server_url, app_token = excluded.app_token, \
     enabled = excluded.enabled, updated_at = excluded.updated_at \
     RETURNING username, server_url, app_token, enabled, updated_at",
  )
  .bind(&auth_user.username)
  .bind(&server_url)
  .bind(app_token)
  .bind(req_payload.enabled)
  .bind(chrono::Utc::now())
  .fetch_one(&app_state.db_pool)
  .await?;

  activity_service::record(&app_state.db_pool, Some(&auth_user.username), "set_gotify", None).await;
  Ok(HttpResponse::Ok().json(json!({ "message": "Gotify settings saved.", "gotify": gotify_view(&config) })))
}

#[instrument(name = "handler::test_gotify", skip(app_state, auth_user), fields(username = %auth_user.username))]
pub async fn test_gotify_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let config = load_gotify(&app_state, &auth_user.username)
    .await?
    .ok_or_else(|| AppError::Validation("No Gotify server is configured.".to_string()))?;
  let target = PushTarget::Gotify {
    server_url: config.server_url,
    app_token: config.app_token,
  };
  app_state
    .notifier
    .send_now(&target, PUSH_TITLE, "Gotify is connected.")
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Test message delivered." })))
}
