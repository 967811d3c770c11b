// deckvault/server/src/web/handlers/system_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::system_update::{ScheduledUpdate, SystemUpdate, SCHEDULED_UPDATE_COLUMNS, SYSTEM_UPDATE_COLUMNS};
use crate::models::UpdateKind;
use crate::services::activity_service;
use crate::services::update_service::{self, CURRENT_VERSION};
use crate::state::AppState;
use crate::web::extractors::AdminUser;

const UPDATE_HISTORY_LIMIT: i64 = 50;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePayload {
  pub run_at: DateTime<Utc>,
}

#[instrument(name = "handler::system_version", skip(app_state, _admin))]
pub async fn version_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let status = app_state.update_status.read().clone();
  let running = app_state.update_lock.try_lock().is_err();
  Ok(HttpResponse::Ok().json(json!({
      "current": CURRENT_VERSION,
      "status": status,
      "updateRunning": running,
  })))
}

#[instrument(name = "handler::system_check", skip(app_state, admin), fields(admin = %admin.username()))]
pub async fn check_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  let status = update_service::check_for_update(&app_state).await?;
  activity_service::record(&app_state.db_pool, Some(admin.username()), "check_update", status.latest.clone()).await;
  Ok(HttpResponse::Ok().json(json!({ "current": CURRENT_VERSION, "status": status })))
}

async fn run(app_state: &AppState, admin: &AdminUser, kind: UpdateKind) -> Result<HttpResponse, AppError> {
  let run = update_service::run_script(app_state, kind, Some(admin.username())).await?;
  let message = format!("System {} finished: {}.", kind.as_str(), run.status);
  app_state.notifier.broadcast_discord(&message);
  Ok(HttpResponse::Ok().json(json!({ "message": message, "run": run })))
}

#[instrument(name = "handler::system_update", skip(app_state, admin), fields(admin = %admin.username()))]
pub async fn update_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  run(&app_state, &admin, UpdateKind::Update).await
}

#[instrument(name = "handler::system_rollback", skip(app_state, admin), fields(admin = %admin.username()))]
pub async fn rollback_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  run(&app_state, &admin, UpdateKind::Rollback).await
}

#[instrument(name = "handler::system_updates", skip(app_state, _admin))]
pub async fn list_updates_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let updates = sqlx::query_as::<_, SystemUpdate>(&format!(
    "SELECT {} FROM system_updates ORDER BY id DESC LIMIT ?",
    SYSTEM_UPDATE_COLUMNS
  ))
  .bind(UPDATE_HISTORY_LIMIT)
  .fetch_all(&app_state.db_pool)
  .await?;
  Ok(HttpResponse::Ok().json(json!({ "updates": updates })))
}

#[instrument(name = "handler::list_scheduled_updates", skip(app_state, _admin))]
pub async fn list_scheduled_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let scheduled = sqlx::query_as::<_, ScheduledUpdate>(&format!(
    "SELECT {} FROM scheduled_updates ORDER BY id DESC",
    SCHEDULED_UPDATE_COLUMNS
  ))
  .fetch_all(&app_state.db_pool)
  .await?;
  Ok(HttpResponse::Ok().json(json!({ "scheduledUpdates": scheduled })))
}

#[instrument(name = "handler::schedule_update", skip(app_state, admin, req_payload), fields(admin = %admin.username()))]
pub async fn schedule_update_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  req_payload: web::Json<SchedulePayload>,
) -> Result<HttpResponse, AppError> {
  let now = Utc::now();
  if req_payload.run_at <= now {
    return Err(AppError::Validation("runAt must be in the future.".to_string()));
  }

  let scheduled: ScheduledUpdate = sqlx::query_as(&format!(
    "INSERT INTO scheduled_updates (run_at, status, created_by, created_at) VALUES (?, 'pending', ?, ?) RETURNING {}",
    SCHEDULED_UPDATE_COLUMNS
  ))
  .bind(req_payload.run_at)
  .bind(admin.username())
  .bind(now)
  .fetch_one(&app_state.db_pool)
  .await?;
  info!(scheduled_id = scheduled.id, run_at = %scheduled.run_at, "Update scheduled.");

  activity_service::record(
    &app_state.db_pool,
    Some(admin.username()),
    "schedule_update",
    Some(scheduled.run_at.to_rfc3339()),
  )
  .await;
  Ok(HttpResponse::Created().json(json!({ "message": "Update scheduled.", "scheduledUpdate": scheduled })))
}

#[instrument(name = "handler::cancel_scheduled_update", skip(app_state, admin, path), fields(admin = %admin.username()))]
pub async fn cancel_scheduled_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let scheduled_id = path.into_inner();
  let result = sqlx::query("DELETE FROM scheduled_updates WHERE id = ?")
    .bind(scheduled_id)
    .execute(&app_state.db_pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("Scheduled update {} not found.", scheduled_id)));
  }

  activity_service::record(
    &app_state.db_pool,
    Some(admin.username()),
    "cancel_scheduled_update",
    Some(format!("#{}", scheduled_id)),
  )
  .await;
  Ok(HttpResponse::Ok().json(json!({ "message": "Scheduled update removed.", "id": scheduled_id })))
}
