// deckvault/server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Tokens live at most a year.
pub const MAX_JWT_TTL_HOURS: u64 = 24 * 365;
/// Version checks run at least once every 30 days.
pub const MAX_UPDATE_CHECK_INTERVAL_HOURS: u64 = 24 * 30;

/// A whole number of hours in `1..=max`.
fn parse_hours(var_name: &str, raw: &str, max: u64) -> Result<u64> {
  raw
    .trim()
    .parse::<u64>()
    .ok()
    .filter(|h| (1..=max).contains(h))
    .ok_or_else(|| AppError::Config(format!("Invalid {}: expected a whole number of hours between 1 and {}", var_name, max)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl LogFormat {
  /// Read on its own so `main` can set up tracing before the rest of the config is loaded.
  pub fn from_env() -> Result<Self> {
    match env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()).to_lowercase().as_str() {
      "pretty" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}': expected pretty or json", other))),
    }
  }
}

#[derive(Debug, Clone)] // Clone is useful if parts of config are passed around
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  pub jwt_secret: String,
  pub jwt_ttl_hours: i64,

  pub deck_catalog_path: PathBuf,
  pub guild_cut_percent: u8,

  // Seeded on startup when both are present
  pub admin_username: Option<String>,
  pub admin_password: Option<String>,

  // Update orchestration
  pub update_check_url: Option<String>,
  pub update_check_interval_hours: u64,
  pub update_script: PathBuf,
  pub rollback_script: PathBuf,

  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let get_opt = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL").unwrap_or_else(|_| "sqlite://deckvault.db".to_string());

    let jwt_secret = get_env("JWT_SECRET")?;
    if jwt_secret.len() < 16 {
      return Err(AppError::Config("JWT_SECRET must be at least 16 characters".to_string()));
    }
    let jwt_ttl_hours = parse_hours(
      "JWT_TTL_HOURS",
      &get_env("JWT_TTL_HOURS").unwrap_or_else(|_| "24".to_string()),
      MAX_JWT_TTL_HOURS,
    )? as i64;

    let deck_catalog_path = PathBuf::from(get_env("DECK_CATALOG_PATH").unwrap_or_else(|_| "config/decks.json".to_string()));
    let guild_cut_percent = get_env("GUILD_CUT_PERCENT")
      .unwrap_or_else(|_| "10".to_string())
      .parse::<u8>()
      .ok()
      .filter(|p| *p <= 100)
      .ok_or_else(|| AppError::Config("Invalid GUILD_CUT_PERCENT: expected 0-100".to_string()))?;

    let admin_username = get_opt("ADMIN_USERNAME");
    let admin_password = get_opt("ADMIN_PASSWORD");
    if admin_username.is_some() != admin_password.is_some() {
      tracing::warn!("Only one of ADMIN_USERNAME / ADMIN_PASSWORD is set; admin seeding is skipped.");
    }

    let update_check_url = get_opt("UPDATE_CHECK_URL");
    let update_check_interval_hours = parse_hours(
      "UPDATE_CHECK_INTERVAL_HOURS",
      &get_env("UPDATE_CHECK_INTERVAL_HOURS").unwrap_or_else(|_| "24".to_string()),
      MAX_UPDATE_CHECK_INTERVAL_HOURS,
    )?;
    let update_script = PathBuf::from(get_env("UPDATE_SCRIPT").unwrap_or_else(|_| "scripts/update.sh".to_string()));
    let rollback_script = PathBuf::from(get_env("ROLLBACK_SCRIPT").unwrap_or_else(|_| "scripts/rollback.sh".to_string()));

    let log_format = LogFormat::from_env()?;

    // Secrets (JWT key, admin password) are never logged.
    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      jwt_secret,
      jwt_ttl_hours,
      deck_catalog_path,
      guild_cut_percent,
      admin_username,
      admin_password,
      update_check_url,
      update_check_interval_hours,
      update_script,
      rollback_script,
      log_format,
    })
  }

  /// Seed credentials, only when both halves are configured.
  pub fn admin_seed(&self) -> Option<(&str, &str)> {
    match (&self.admin_username, &self.admin_password) {
      (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
      _ => None,
    }
  }
}
