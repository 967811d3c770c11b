// deckvault/server/src/web/handlers/notification_handlers.rs

//! A user only ever sees their own notifications; anyone else's id is reported as missing.

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::notification::{Notification, NOTIFICATION_COLUMNS};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

fn not_found(notification_id: i64) -> AppError {
  AppError::NotFound(format!("Notification {} not found.", notification_id))
}

#[instrument(name = "handler::list_notifications", skip(app_state, auth_user), fields(username = %auth_user.username))]
pub async fn list_notifications_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let notifications = sqlx::query_as::<_, Notification>(&format!(
    "SELECT {} FROM notifications WHERE username = ? ORDER BY id DESC",
    NOTIFICATION_COLUMNS
  ))
  .bind(&auth_user.username)
  .fetch_all(&app_state.db_pool)
  .await?;
  let unread = notifications.iter().filter(|n| !n.is_read).count();
  Ok(HttpResponse::Ok().json(json!({ "notifications": notifications, "unread": unread })))
}

#[instrument(name = "handler::mark_notification_read", skip(app_state, auth_user, path), fields(username = %auth_user.username))]
pub async fn mark_read_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let notification_id = path.into_inner();
  let notification: Notification = sqlx::query_as(&format!(
    "UPDATE notifications SET is_read = 1 WHERE id = ? AND username = ? RETURNING {}",
    NOTIFICATION_COLUMNS
  ))
  .bind(notification_id)
  .bind(&auth_user.username)
  .fetch_optional(&app_state.db_pool)
  .await?
  .ok_or_else(|| not_found(notification_id))?;
  Ok(HttpResponse::Ok().json(json!({ "notification": notification })))
}

#[instrument(name = "handler::mark_all_notifications_read", skip(app_state, auth_user), fields(username = %auth_user.username))]
pub async fn mark_all_read_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE username = ? AND is_read = 0")
    .bind(&auth_user.username)
    .execute(&app_state.db_pool)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "updated": result.rows_affected() })))
}

#[instrument(name = "handler::delete_notification", skip(app_state, auth_user, path), fields(username = %auth_user.username))]
pub async fn delete_notification_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let notification_id = path.into_inner();
  let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND username = ?")
    .bind(notification_id)
    .bind(&auth_user.username)
    .execute(&app_state.db_pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(not_found(notification_id));
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Notification deleted.", "id": notification_id })))
}

#[instrument(name = "handler::delete_all_notifications", skip(app_state, auth_user), fields(username = %auth_user.username))]
pub async fn delete_all_notifications_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let result = sqlx::query("DELETE FROM notifications WHERE username = ?")
    .bind(&auth_user.username)
    .execute(&app_state.db_pool)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "deleted": result.rows_affected() })))
}
