// deckvault/server/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use deckvault::DeckError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Deck Rule Violation: {0}")]
  Domain(#[from] DeckError),

  #[error("Webhook Delivery Error: {0}")]
  Webhook(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String), // For miscellaneous errors
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience in handlers
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl From<sqlx::migrate::MigrateError> for AppError {
  fn from(err: sqlx::migrate::MigrateError) -> Self {
    AppError::Internal(format!("Database migration failed: {}", err))
  }
}

impl AppError {
  /// The message sent to the client. Server-side failures never leak their details.
  fn public_message(&self) -> String {
    match self {
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m)
      | AppError::Webhook(m) => m.clone(),
      AppError::Domain(e) => e.to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Sqlx(_) => "Database operation failed".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> actix_web::http::StatusCode {
    use actix_web::http::StatusCode;
    match self {
      AppError::Validation(_) | AppError::Domain(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Webhook(_) => StatusCode::BAD_GATEWAY,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with error");
    }
    HttpResponse::build(status).json(json!({ "error": self.public_message() }))
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
