// deckvault/server/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::auth_handlers::find_user;
use crate::errors::AppError;
use crate::models::user::{User, USER_COLUMNS};
use crate::services::activity_service::{self, DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT};
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
pub struct ApprovePayload {
  #[serde(default = "default_true")]
  pub approved: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminFlagPayload {
  pub is_admin: bool,
}

#[derive(Deserialize, Debug)]
pub struct ActivityQuery {
  pub limit: Option<i64>,
}

fn default_true() -> bool {
  true
}

async fn require_user(app_state: &AppState, username: &str) -> Result<User, AppError> {
  find_user(app_state, username)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User '{}' not found.", username)))
}

#[instrument(name = "handler::list_users", skip(app_state, _admin))]
pub async fn list_users_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let users = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY username ASC", USER_COLUMNS))
    .fetch_all(&app_state.db_pool)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "users": users })))
}

/// An empty body approves. Anything else must be a valid `ApprovePayload`.
fn parse_approval(body: &[u8]) -> Result<bool, AppError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(true);
  }
  serde_json::from_slice::<ApprovePayload>(body)
    .map(|p| p.approved)
    .map_err(|e| AppError::Validation(format!("Invalid approval payload: {}", e)))
}

/// Approves (or revokes approval of) an account. Approval notifies the user.
#[instrument(name = "handler::approve_user", skip(app_state, admin, path, body), fields(admin = %admin.username(), target = %path.as_str()))]
pub async fn approve_user_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<String>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let username = path.into_inner();
  let approved = parse_approval(&body)?;
  let user = require_user(&app_state, &username).await?;
  if !approved && user.username == admin.username() {
    return Err(AppError::Validation("You cannot revoke your own approval.".to_string()));
  }

  sqlx::query("UPDATE users SET approved = ? WHERE username = ?")
    .bind(approved)
    .bind(&user.username)
    .execute(&app_state.db_pool)
    .await?;
  info!(approved, "User approval changed.");

  let action = if approved { "approve_user" } else { "unapprove_user" };
  activity_service::record(&app_state.db_pool, Some(admin.username()), action, Some(user.username.clone())).await;
  if approved && !user.approved {
    if let Err(e) = app_state
      .notifier
      .notify_user(&user.username, "Your account has been approved. Welcome!", None)
      .await
    {
      warn!(error = %e, "Could not notify the approved user.");
    }
  }

  Ok(HttpResponse::Ok().json(json!({ "message": "User updated.", "username": user.username, "approved": approved })))
}

#[instrument(name = "handler::set_admin", skip(app_state, admin, path, req_payload), fields(admin = %admin.username(), target = %path.as_str()))]
pub async fn set_admin_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<String>,
  req_payload: web::Json<AdminFlagPayload>,
) -> Result<HttpResponse, AppError> {
  let username = path.into_inner();
  let user = require_user(&app_state, &username).await?;
  if !req_payload.is_admin && user.username == admin.username() {
    return Err(AppError::Validation("You cannot remove your own admin rights.".to_string()));
  }

  sqlx::query("UPDATE users SET is_admin = ? WHERE username = ?")
    .bind(req_payload.is_admin)
    .bind(&user.username)
    .execute(&app_state.db_pool)
    .await?;

  let action = if req_payload.is_admin { "grant_admin" } else { "revoke_admin" };
  activity_service::record(&app_state.db_pool, Some(admin.username()), action, Some(user.username.clone())).await;
  Ok(HttpResponse::Ok().json(json!({
      "message": "User updated.",
      "username": user.username,
      "isAdmin": req_payload.is_admin,
  })))
}

/// Removes the account; its cards, notifications and Gotify config go with it (foreign keys cascade).
#[instrument(name = "handler::delete_user", skip(app_state, admin, path), fields(admin = %admin.username(), target = %path.as_str()))]
pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let username = path.into_inner();
  if username == admin.username() {
    return Err(AppError::Validation("You cannot delete your own account.".to_string()));
  }
  let user = require_user(&app_state, &username).await?;

  sqlx::query("DELETE FROM users WHERE username = ?")
    .bind(&user.username)
    .execute(&app_state.db_pool)
    .await?;
  info!("User deleted.");

  activity_service::record(&app_state.db_pool, Some(admin.username()), "delete_user", Some(user.username.clone())).await;
  Ok(HttpResponse::Ok().json(json!({ "message": "User deleted.", "username": user.username })))
}

#[instrument(name = "handler::activity", skip(app_state, _admin, query))]
pub async fn activity_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  query: web::Query<ActivityQuery>,
) -> Result<HttpResponse, AppError> {
  let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
  if !(1..=MAX_ACTIVITY_LIMIT).contains(&limit) {
    return Err(AppError::Validation(format!("limit must be between 1 and {}.", MAX_ACTIVITY_LIMIT)));
  }
  let activity = activity_service::recent(&app_state.db_pool, limit).await?;
  Ok(HttpResponse::Ok().json(json!({ "activity": activity })))
}
