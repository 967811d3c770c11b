// tests/system_tests.rs

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use common::*;
use deckvault_server::services::update_service;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn write_script(name: &str, body: &str) -> PathBuf {
  let path = std::env::temp_dir().join(format!("deckvault-{}-{}.sh", name, uuid::Uuid::new_v4()));
  std::fs::write(&path, body).expect("write script");
  path
}

#[actix_web::test]
async fn test_update_run_is_recorded() {
  let mut config = test_config();
  config.update_script = write_script("update", "echo pulling release\nexit 0\n");
  config.rollback_script = write_script("rollback", "echo no previous release >&2\nexit 3\n");
  let state = state_from_config(config, Arc::new(RecordingSink::default())).await;
  create_user(&state, "warden", true, true).await;
  let app = test_app!(state);

  let (status, body) = send!(
    app,
    TestRequest::post().uri("/api/system/update").insert_header(bearer(&state, "warden", true))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["run"]["status"], "succeeded");
  assert!(body["run"]["output"].as_str().is_some_and(|o| o.contains("pulling release")));

  let (status, body) = send!(
    app,
    TestRequest::post().uri("/api/system/rollback").insert_header(bearer(&state, "warden", true))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["run"]["status"], "failed");
  assert!(body["run"]["output"].as_str().is_some_and(|o| o.contains("no previous release")));

  let (_, body) = send!(
    app,
    TestRequest::get().uri("/api/system/updates").insert_header(bearer(&state, "warden", true))
  );
  assert_eq!(body["updates"].as_array().map(Vec::len), Some(2));
  assert_eq!(body["updates"][0]["kind"], "rollback");
}

#[actix_web::test]
async fn test_update_is_refused_while_another_runs() {
  let (state, _sink) = test_state().await;
  let _running = state.update_lock.lock().await;

  let result = update_service::run_script(&state, deckvault_server::models::UpdateKind::Update, None).await;
  assert!(matches!(result, Err(deckvault_server::errors::AppError::Conflict(_))));
}

#[actix_web::test]
async fn test_version_check_without_url_is_bad_request() {
  let (state, _sink) = test_state().await;
  create_user(&state, "warden", true, true).await;
  let app = test_app!(state);

  let (status, _) = send!(
    app,
    TestRequest::post().uri("/api/system/check").insert_header(bearer(&state, "warden", true))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send!(
    app,
    TestRequest::get().uri("/api/system/version").insert_header(bearer(&state, "warden", true))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["current"], update_service::CURRENT_VERSION);
  assert_eq!(body["updateRunning"], false);
}

#[actix_web::test]
async fn test_scheduled_updates_must_be_in_the_future() {
  let (state, _sink) = test_state().await;
  create_user(&state, "warden", true, true).await;
  let app = test_app!(state);

  let past = chrono::Utc::now() - chrono::Duration::minutes(5);
  let (status, _) = send!(
    app,
    TestRequest::post()
      .uri("/api/system/scheduled-updates")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "runAt": past }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let future = chrono::Utc::now() + chrono::Duration::hours(6);
  let (status, body) = send!(
    app,
    TestRequest::post()
      .uri("/api/system/scheduled-updates")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "runAt": future }))
  );
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["scheduledUpdate"]["status"], "pending");
  let id = body["scheduledUpdate"]["id"].as_i64().expect("id");

  // Not due yet, so the runner leaves it alone.
  assert_eq!(update_service::run_due_scheduled(&state).await.expect("runner"), 0);

  let (status, _) = send!(
    app,
    TestRequest::delete()
      .uri(&format!("/api/system/scheduled-updates/{}", id))
      .insert_header(bearer(&state, "warden", true))
  );
  assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_failed_version_check_is_cached() {
  let mut config = test_config();
  config.update_check_url = Some("http://127.0.0.1:9/latest.json".to_string());
  let state = state_from_config(config, Arc::new(RecordingSink::default())).await;

  let result = update_service::check_for_update(&state).await;
  assert!(matches!(result, Err(deckvault_server::errors::AppError::Webhook(_))));

  let cached = state.update_status.read().clone();
  assert!(cached.checked_at.is_some());
  assert!(cached.last_error.is_some());
  assert!(!cached.update_available);
}
