// deckvault/server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize; // For request payloads
use serde_json::json; // For JSON responses
use tracing::{info, instrument, warn};

use crate::errors::AppError; // Your application specific error
use crate::models::user::{User, USER_COLUMNS};
use crate::services::{activity_service, auth_service};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

pub const MIN_PASSWORD_LEN: usize = 8;

// --- Request DTOs ---
#[derive(Deserialize, Debug)]
pub struct CredentialsPayload {
  pub username: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
  pub current_password: String,
  pub new_password: String,
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
  let len = username.chars().count();
  if !(3..=32).contains(&len) {
    return Err(AppError::Validation("Username must be 3 to 32 characters long.".to_string()));
  }
  if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
    return Err(AppError::Validation(
      "Username may only contain letters, digits, '_' and '-'.".to_string(),
    ));
  }
  Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AppError::Validation(format!(
      "Password must be at least {} characters long.",
      MIN_PASSWORD_LEN
    )));
  }
  Ok(())
}

pub(crate) async fn find_user(app_state: &AppState, username: &str) -> Result<Option<User>, AppError> {
  let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS))
    .bind(username)
    .fetch_optional(&app_state.db_pool)
    .await?;
  Ok(user)
}

// --- Handler Implementations ---

#[instrument(
    name = "handler::register",
    skip(app_state, req_payload),
    fields(req_username = %req_payload.username)
)]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CredentialsPayload>,
) -> Result<HttpResponse, AppError> {
  let username = req_payload.username.trim();
  validate_username(username)?;
  validate_password(&req_payload.password)?;

  if find_user(&app_state, username).await?.is_some() {
    warn!("Attempt to register an existing username: {}", username);
    return Err(AppError::Conflict("Username is already taken.".to_string()));
  }

  let password_hash = auth_service::hash_password(&req_payload.password)?;
  let inserted = sqlx::query("INSERT INTO users (username, password_hash, is_admin, approved, created_at) VALUES (?, ?, 0, 0, ?)")
    .bind(username)
    .bind(password_hash)
    .bind(chrono::Utc::now())
    .execute(&app_state.db_pool)
    .await;
  if let Err(e) = inserted {
    // Lost a race with a concurrent registration of the same name.
    if let sqlx::Error::Database(db_err) = &e {
      if db_err.is_unique_violation() {
        return Err(AppError::Conflict("Username is already taken.".to_string()));
      }
    }
    return Err(AppError::Sqlx(e));
  }

  activity_service::record(&app_state.db_pool, Some(username), "register", None).await;
  if let Err(e) = app_state
    .notifier
    .notify_admins(&format!("New user '{}' is waiting for approval.", username), Some("/admin/users"))
    .await
  {
    warn!(error = %e, "Could not notify admins about a new registration.");
  }

  info!("User registered (pending approval): {}", username);
  Ok(HttpResponse::Created().json(json!({
      "message": "Registration received. An admin must approve the account before you can log in.",
      "username": username,
      "approved": false,
  })))
}

#[instrument(
    name = "handler::login",
    skip(app_state, req_payload),
    fields(req_username = %req_payload.username)
)]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CredentialsPayload>,
) -> Result<HttpResponse, AppError> {
  let username = req_payload.username.trim();
  let invalid = || AppError::Auth("Invalid username or password.".to_string());

  let user = find_user(&app_state, username).await?.ok_or_else(invalid)?;
  if !auth_service::verify_password(&user.password_hash, &req_payload.password)? {
    warn!("Wrong password for user: {}", username);
    return Err(invalid());
  }
  if !user.approved {
    warn!("Login attempt by unapproved user: {}", username);
    return Err(AppError::Auth("Account is awaiting admin approval.".to_string()));
  }

  let token = app_state.tokens.issue(&user.username, user.is_admin)?;
  activity_service::record(&app_state.db_pool, Some(&user.username), "login", None).await;

  info!("Login successful for user: {}", user.username);
  Ok(HttpResponse::Ok().json(json!({
      "message": "Login successful.",
      "token": token,
      "username": user.username,
      "isAdmin": user.is_admin,
  })))
}

#[instrument(name = "handler::me", skip(app_state, auth_user), fields(username = %auth_user.username))]
pub async fn me_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let user = find_user(&app_state, &auth_user.username)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

#[instrument(name = "handler::change_password", skip(app_state, auth_user, req_payload), fields(username = %auth_user.username))]
pub async fn change_password_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<ChangePasswordPayload>,
) -> Result<HttpResponse, AppError> {
  let user = find_user(&app_state, &auth_user.username)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
  if !auth_service::verify_password(&user.password_hash, &req_payload.current_password)? {
    return Err(AppError::Auth("Current password is incorrect.".to_string()));
  }
  validate_password(&req_payload.new_password)?;

  let new_hash = auth_service::hash_password(&req_payload.new_password)?;
  sqlx::query("UPDATE users SET password_hash = ? WHERE username = ?")
    .bind(new_hash)
    .bind(&user.username)
    .execute(&app_state.db_pool)
    .await?;
  activity_service::record(&app_state.db_pool, Some(&user.username), "change_password", None).await;

  Ok(HttpResponse::Ok().json(json!({ "message": "Password updated." })))
}
