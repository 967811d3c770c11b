// deckvault/server/src/web/handlers/announcement_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::types::Json;
use tracing::{debug, info, instrument};

use crate::errors::AppError;
use crate::models::announcement::{Announcement, ANNOUNCEMENT_COLUMNS};
use crate::services::activity_service;
use crate::services::notify_service::is_http_url;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementPayload {
  pub message: String,
  #[serde(default)]
  pub links: Vec<String>,
  #[serde(default)]
  pub expires_at: Option<DateTime<Utc>>,
}

fn validate(payload: AnnouncementPayload) -> Result<AnnouncementPayload, AppError> {
  let message = payload.message.trim().to_string();
  if message.is_empty() {
    return Err(AppError::Validation("Announcement message cannot be empty.".to_string()));
  }
  let links: Vec<String> = payload.links.iter().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect();
  if let Some(bad) = links.iter().find(|l| !is_http_url(l)) {
    return Err(AppError::Validation(format!("Link '{}' must be an http(s) URL.", bad)));
  }
  Ok(AnnouncementPayload {
    message,
    links,
    expires_at: payload.expires_at,
  })
}

#[instrument(name = "handler::list_announcements", skip(app_state))]
pub async fn list_announcements_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let all = sqlx::query_as::<_, Announcement>(&format!(
    "SELECT {} FROM announcements ORDER BY id DESC",
    ANNOUNCEMENT_COLUMNS
  ))
  .fetch_all(&app_state.db_pool)
  .await?;

  let now = Utc::now();
  let (expired, active): (Vec<Announcement>, Vec<Announcement>) = all.into_iter().partition(|a| a.is_expired(now));
  for announcement in &expired {
    sqlx::query("DELETE FROM announcements WHERE id = ?")
      .bind(announcement.id)
      .execute(&app_state.db_pool)
      .await?;
  }
  if !expired.is_empty() {
    debug!(count = expired.len(), "Removed expired announcements.");
  }

  Ok(HttpResponse::Ok().json(json!({ "announcements": active })))
}

#[instrument(name = "handler::create_announcement", skip(app_state, admin, req_payload), fields(admin = %admin.username()))]
pub async fn create_announcement_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  req_payload: web::Json<AnnouncementPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = validate(req_payload.into_inner())?;

  let announcement: Announcement = sqlx::query_as(&format!(
    "INSERT INTO announcements (message, links, created_by, expires_at, created_at) VALUES (?, ?, ?, ?, ?) RETURNING {}",
    ANNOUNCEMENT_COLUMNS
  ))
  .bind(&payload.message)
  .bind(Json(&payload.links))
  .bind(admin.username())
  .bind(payload.expires_at)
  .bind(Utc::now())
  .fetch_one(&app_state.db_pool)
  .await?;
  info!(announcement_id = announcement.id, "Announcement created.");

  activity_service::record(
    &app_state.db_pool,
    Some(admin.username()),
    "create_announcement",
    Some(format!("#{}", announcement.id)),
  )
  .await;

  let mut broadcast = format!("Announcement: {}", announcement.message);
  for link in announcement.links.iter() {
    broadcast.push('\n');
    broadcast.push_str(link);
  }
  app_state.notifier.broadcast_discord(&broadcast);

  Ok(HttpResponse::Created().json(json!({ "message": "Announcement created.", "announcement": announcement })))
}

#[instrument(name = "handler::update_announcement", skip(app_state, admin, path, req_payload), fields(admin = %admin.username()))]
pub async fn update_announcement_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<i64>,
  req_payload: web::Json<AnnouncementPayload>,
) -> Result<HttpResponse, AppError> {
  let announcement_id = path.into_inner();
  let payload = validate(req_payload.into_inner())?;

  let announcement: Announcement = sqlx::query_as(&format!(
    "UPDATE announcements SET message = ?, links = ?, expires_at = ? WHERE id = ? RETURNING {}",
    ANNOUNCEMENT_COLUMNS
  ))
  .bind(&payload.message)
  .bind(Json(&payload.links))
  .bind(payload.expires_at)
  .bind(announcement_id)
  .fetch_optional(&app_state.db_pool)
  .await?
  .ok_or_else(|| AppError::NotFound(format!("Announcement {} not found.", announcement_id)))?;

  activity_service::record(
    &app_state.db_pool,
    Some(admin.username()),
    "update_announcement",
    Some(format!("#{}", announcement.id)),
  )
  .await;
  Ok(HttpResponse::Ok().json(json!({ "message": "Announcement updated.", "announcement": announcement })))
}

#[instrument(name = "handler::delete_announcement", skip(app_state, admin, path), fields(admin = %admin.username()))]
pub async fn delete_announcement_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let announcement_id = path.into_inner();
  let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
    .bind(announcement_id)
    .execute(&app_state.db_pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("Announcement {} not found.", announcement_id)));
  }

  activity_service::record(
    &app_state.db_pool,
    Some(admin.username()),
    "delete_announcement",
    Some(format!("#{}", announcement_id)),
  )
  .await;
  Ok(HttpResponse::Ok().json(json!({ "message": "Announcement deleted.", "id": announcement_id })))
}
