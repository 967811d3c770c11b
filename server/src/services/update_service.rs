// deckvault/server/src/services/update_service.rs

//! Version checks and the update / rollback shell-outs.
//!
//! The scripts are opaque to the server: it runs `sh <script>`, records the combined output and
//! the exit status, and nothing more. There is no transactional guarantee around them.

use crate::errors::{AppError, Result as AppResult};
use crate::models::system_update::{ScheduledUpdate, SystemUpdate, SCHEDULED_UPDATE_COLUMNS, SYSTEM_UPDATE_COLUMNS};
use crate::models::UpdateKind;
use crate::services::activity_service;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Keeps the stored script output bounded.
const MAX_OUTPUT_BYTES: usize = 64 * 1024;
const SCHEDULER_TICK: Duration = Duration::from_secs(60);
const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
  pub latest: Option<String>,
  pub update_available: bool,
  pub checked_at: Option<DateTime<Utc>>,
  pub last_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestRelease {
  version: String,
}

/// Fetches the latest published version and caches the result in `state.update_status`.
#[instrument(name = "update_service::check_for_update", skip(state))]
pub async fn check_for_update(state: &AppState) -> AppResult<UpdateStatus> {
  let url = state
    .config
    .update_check_url
    .clone()
    .ok_or_else(|| AppError::Validation("UPDATE_CHECK_URL is not configured.".to_string()))?;

  let fetched = fetch_latest(&state.http_client, &url).await;
  let now = Utc::now();
  let status = {
    let mut guard = state.update_status.write();
    match &fetched {
      Ok(latest) => {
        guard.update_available = deckvault::is_newer(CURRENT_VERSION, latest);
        guard.latest = Some(latest.clone());
        guard.last_error = None;
      }
      Err(e) => guard.last_error = Some(e.to_string()),
    }
    guard.checked_at = Some(now);
    (*guard).clone()
  }; // guard dropped

  match fetched {
    Ok(latest) => {
      info!(current = CURRENT_VERSION, latest = %latest, update_available = status.update_available, "Version check finished.");
      Ok(status)
    }
    Err(e) => {
      warn!(error = %e, "Version check failed.");
      Err(e)
    }
  }
}

async fn fetch_latest(client: &reqwest::Client, url: &str) -> AppResult<String> {
  let release: LatestRelease = client
    .get(url)
    .timeout(VERSION_CHECK_TIMEOUT)
    .send()
    .await
    .and_then(|r| r.error_for_status())
    .map_err(|e| AppError::Webhook(format!("Version check request failed: {}", e)))?
    .json()
    .await
    .map_err(|e| AppError::Webhook(format!("Version check returned an unexpected body: {}", e)))?;
  Ok(release.version.trim().to_string())
}

/// Runs the update or rollback script. Only one may run at a time.
#[instrument(name = "update_service::run_script", skip(state, kind), fields(kind = kind.as_str()))]
pub async fn run_script(state: &AppState, kind: UpdateKind, started_by: Option<&str>) -> AppResult<SystemUpdate> {
  let _running = state
    .update_lock
    .try_lock()
    .map_err(|_| AppError::Conflict("An update or rollback is already running.".to_string()))?;

  let script = match kind {
    UpdateKind::Update => state.config.update_script.clone(),
    UpdateKind::Rollback => state.config.rollback_script.clone(),
  };

  let record: SystemUpdate = sqlx::query_as(&format!(
    "INSERT INTO system_updates (kind, from_version, status, started_by, started_at) VALUES (?, ?, 'running', ?, ?) RETURNING {}",
    SYSTEM_UPDATE_COLUMNS
  ))
  .bind(kind.as_str())
  .bind(CURRENT_VERSION)
  .bind(started_by)
  .bind(Utc::now())
  .fetch_one(&state.db_pool)
  .await?;
  info!(update_id = record.id, script = %script.display(), "Starting script.");

  let (status, output) = match tokio::process::Command::new("sh").arg(&script).output().await {
    Ok(out) => {
      let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
      text.push_str(&String::from_utf8_lossy(&out.stderr));
      let status = if out.status.success() { "succeeded" } else { "failed" };
      if !out.status.success() {
        warn!(update_id = record.id, exit = ?out.status.code(), "Script exited unsuccessfully.");
      }
      (status, truncate_output(text))
    }
    Err(e) => {
      error!(update_id = record.id, error = %e, "Script could not be started.");
      ("failed", format!("failed to start '{}': {}", script.display(), e))
    }
  };

  let finished: SystemUpdate = sqlx::query_as(&format!(
    "UPDATE system_updates SET status = ?, output = ?, finished_at = ? WHERE id = ? RETURNING {}",
    SYSTEM_UPDATE_COLUMNS
  ))
  .bind(status)
  .bind(&output)
  .bind(Utc::now())
  .bind(record.id)
  .fetch_one(&state.db_pool)
  .await?;

  activity_service::record(
    &state.db_pool,
    started_by,
    kind.as_str(),
    Some(format!("run #{} {}", finished.id, finished.status)),
  )
  .await;
  Ok(finished)
}

fn truncate_output(mut text: String) -> String {
  if text.len() > MAX_OUTPUT_BYTES {
    let mut cut = MAX_OUTPUT_BYTES;
    while !text.is_char_boundary(cut) {
      cut -= 1;
    }
    text.truncate(cut);
    text.push_str("\n[output truncated]");
  }
  text
}

/// Runs every pending scheduled update whose time has come.
/// A run that finds the update lock taken stays pending for the next tick.
pub async fn run_due_scheduled(state: &AppState) -> AppResult<usize> {
  let pending: Vec<ScheduledUpdate> = sqlx::query_as(&format!(
    "SELECT {} FROM scheduled_updates WHERE status = 'pending' ORDER BY id ASC",
    SCHEDULED_UPDATE_COLUMNS
  ))
  .fetch_all(&state.db_pool)
  .await?;

  let now = Utc::now();
  let mut ran = 0;
  for job in pending.into_iter().filter(|j| j.run_at <= now) {
    let (status, update_id) = match run_script(state, UpdateKind::Update, Some(job.created_by.as_str())).await {
      Ok(run) => (if run.status == "succeeded" { "done" } else { "failed" }, Some(run.id)),
      Err(AppError::Conflict(_)) => {
        info!(scheduled_id = job.id, "Update already running; scheduled run deferred.");
        continue;
      }
      Err(e) => {
        error!(scheduled_id = job.id, error = %e, "Scheduled update failed to run.");
        ("failed", None)
      }
    };
    sqlx::query("UPDATE scheduled_updates SET status = ?, update_id = ? WHERE id = ?")
      .bind(status)
      .bind(update_id)
      .bind(job.id)
      .execute(&state.db_pool)
      .await?;
    ran += 1;
  }
  Ok(ran)
}

/// Starts the periodic version checker and the scheduled-update runner.
/// Both live until the process exits.
pub fn spawn_background_tasks(state: AppState) {
  let checker = state.clone();
  tokio::spawn(async move {
    if checker.config.update_check_url.is_none() {
      info!("UPDATE_CHECK_URL not set; periodic version checks disabled.");
      return;
    }
    let period = Duration::from_secs(checker.config.update_check_interval_hours * 3600);
    let mut interval = tokio::time::interval(period);
    loop {
      interval.tick().await;
      // Errors are cached in UpdateStatus and logged by check_for_update.
      let _ = check_for_update(&checker).await;
    }
  });

  tokio::spawn(async move {
    let mut interval = tokio::time::interval(SCHEDULER_TICK);
    loop {
      interval.tick().await;
      match run_due_scheduled(&state).await {
        Ok(0) => {}
        Ok(n) => info!(count = n, "Scheduled updates processed."),
        Err(e) => warn!(error = %e, "Scheduled update runner failed."),
      }
    }
  });
}
