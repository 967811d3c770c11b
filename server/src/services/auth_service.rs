// deckvault/server/src/services/auth_service.rs

//! Password hashing and bearer token handling.

use crate::config::MAX_JWT_TTL_HOURS;
use crate::errors::AppError; // Application-specific error type
use argon2::{
  password_hash::{
    rand_core::OsRng, // For generating random salts
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
    SaltString,
  },
  Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// Hashes a plain-text password using Argon2.
///
/// # Returns
/// The PHC-formatted hash, or `AppError::Validation` for an empty password.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|argon_err| {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing process failed: {}", argon_err))
    })
}

/// Verifies a plain-text password against a stored Argon2 hash.
///
/// `Ok(false)` means the password does not match; errors are reserved for unusable hashes.
#[instrument(name = "auth_service::verify_password", skip(hashed_password_str, provided_password), err(Display))]
pub fn verify_password(hashed_password_str: &str, provided_password: &str) -> Result<bool, AppError> {
  if provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(hashed_password_str).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!(
        "Password verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

/// Token payload: the username and the admin flag at login time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
  pub sub: String,
  pub admin: bool,
  pub iat: i64,
  pub exp: i64,
  pub jti: String,
}

/// HS256 keys derived from the configured secret.
pub struct TokenKeys {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl: Duration,
}

impl TokenKeys {
  pub fn new(secret: &str, ttl_hours: i64) -> Result<Self, AppError> {
    let ttl = Some(ttl_hours)
      .filter(|h| (1..=MAX_JWT_TTL_HOURS as i64).contains(h))
      .and_then(Duration::try_hours)
      .ok_or_else(|| AppError::Config(format!("Token lifetime of {} hours is out of range", ttl_hours)))?;
    Ok(Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      ttl,
    })
  }

  #[instrument(name = "auth_service::issue_token", skip(self), err(Display))]
  pub fn issue(&self, username: &str, admin: bool) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
      sub: username.to_string(),
      admin,
      iat: now.timestamp(),
      exp: (now + self.ttl).timestamp(),
      jti: uuid::Uuid::new_v4().to_string(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
  }

  pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
      .map(|data| data.claims)
      .map_err(|e| {
        debug!(error = %e, "Rejected bearer token.");
        AppError::Auth("Invalid or expired session token.".to_string())
      })
  }
}
