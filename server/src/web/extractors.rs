// deckvault/server/src/web/extractors.rs

//! Request extractors for bearer-token authentication.
//!
//! The token is verified first; the user row is then re-read so that deleted or
//! un-approved accounts lose access immediately and admin rights reflect the database.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub username: String,
  pub is_admin: bool,
}

/// An authenticated user whose account is an admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl AdminUser {
  pub fn username(&self) -> &str {
    &self.0.username
  }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
  req
    .headers()
    .get(header::AUTHORIZATION)
    .and_then(|h| h.to_str().ok())
    .and_then(|s| s.strip_prefix("Bearer ").or_else(|| s.strip_prefix("bearer ")))
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError; // Use your app's error type
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let token = bearer_token(req);

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
      let token = token.ok_or_else(|| AppError::Auth("Missing bearer token.".to_string()))?;
      let claims = state.tokens.verify(&token)?;

      let row: Option<(String, bool, bool)> =
        sqlx::query_as("SELECT username, is_admin, approved FROM users WHERE username = ?")
          .bind(&claims.sub)
          .fetch_optional(&state.db_pool)
          .await?;

      match row {
        Some((username, is_admin, true)) => Ok(AuthenticatedUser { username, is_admin }),
        Some(_) => {
          warn!(username = %claims.sub, "Token presented for an unapproved account.");
          Err(AppError::Auth("Account is not approved.".to_string()))
        }
        None => {
          warn!(username = %claims.sub, "Token presented for a deleted account.");
          Err(AppError::Auth("Account no longer exists.".to_string()))
        }
      }
    })
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let user = AuthenticatedUser::from_request(req, payload);
    Box::pin(async move {
      let user = user.await?;
      if !user.is_admin {
        warn!(username = %user.username, "Non-admin attempted an admin operation.");
        return Err(AppError::Forbidden("Admin privileges required.".to_string()));
      }
      Ok(AdminUser(user))
    })
  }
}
