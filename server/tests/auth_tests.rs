// tests/auth_tests.rs

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use common::*;
use serde_json::json;

#[actix_web::test]
async fn test_duplicate_registration_conflicts_without_new_row() {
  let (state, _sink) = test_state().await;
  let app = test_app!(state);

  let payload = json!({ "username": "kael", "password": PASSWORD });
  let (status, _) = send!(app, TestRequest::post().uri("/api/register").set_json(&payload));
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = send!(app, TestRequest::post().uri("/api/register").set_json(&payload));
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].is_string());
  assert_eq!(count(&state, "SELECT COUNT(*) FROM users").await, 1);
}

#[actix_web::test]
async fn test_registration_validates_input() {
  let (state, _sink) = test_state().await;
  let app = test_app!(state);

  let (status, _) = send!(
    app,
    TestRequest::post()
      .uri("/api/register")
      .set_json(json!({ "username": "no spaces", "password": PASSWORD }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send!(
    app,
    TestRequest::post()
      .uri("/api/register")
      .set_json(json!({ "username": "kael", "password": "short" }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send!(
    app,
    TestRequest::post()
      .uri("/api/register")
      .insert_header(("Content-Type", "application/json"))
      .set_payload("{not json")
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().is_some_and(|m| m.contains("Invalid JSON")));
}

#[actix_web::test]
async fn test_unapproved_user_cannot_log_in_until_approved() {
  let (state, _sink) = test_state().await;
  create_user(&state, "warden", true, true).await;
  let app = test_app!(state);

  let creds = json!({ "username": "kael", "password": PASSWORD });
  let (status, _) = send!(app, TestRequest::post().uri("/api/register").set_json(&creds));
  assert_eq!(status, StatusCode::CREATED);

  // Admins hear about the pending account.
  assert_eq!(
    count(&state, "SELECT COUNT(*) FROM notifications WHERE username = 'warden'").await,
    1
  );

  let (status, _) = send!(app, TestRequest::post().uri("/api/login").set_json(&creds));
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = send!(
    app,
    TestRequest::put()
      .uri("/api/admin/users/kael/approve")
      .insert_header(bearer(&state, "warden", true))
  );
  assert_eq!(status, StatusCode::OK);

  let (status, body) = send!(app, TestRequest::post().uri("/api/login").set_json(&creds));
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["username"], "kael");
  assert_eq!(body["isAdmin"], false);

  let token = body["token"].as_str().expect("token string");
  let claims = state.tokens.verify(token).expect("token verifies");
  assert_eq!(claims.sub, "kael");
  assert!(!claims.admin);

  // The approved user was told.
  assert_eq!(
    count(&state, "SELECT COUNT(*) FROM notifications WHERE username = 'kael'").await,
    1
  );
}

#[actix_web::test]
async fn test_wrong_password_is_unauthorized() {
  let (state, _sink) = test_state().await;
  create_user(&state, "kael", false, true).await;
  let app = test_app!(state);

  let (status, body) = send!(
    app,
    TestRequest::post()
      .uri("/api/login")
      .set_json(json!({ "username": "kael", "password": "not-the-password" }))
  );
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_admin_routes_require_admin() {
  let (state, _sink) = test_state().await;
  create_user(&state, "kael", false, true).await;
  let app = test_app!(state);

  let (status, _) = send!(app, TestRequest::get().uri("/api/admin/users"));
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = send!(
    app,
    TestRequest::get()
      .uri("/api/admin/users")
      .insert_header(bearer(&state, "kael", false))
  );
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_admin_cannot_delete_or_demote_self() {
  let (state, _sink) = test_state().await;
  create_user(&state, "warden", true, true).await;
  let app = test_app!(state);

  let (status, _) = send!(
    app,
    TestRequest::delete()
      .uri("/api/admin/users/warden")
      .insert_header(bearer(&state, "warden", true))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send!(
    app,
    TestRequest::put()
      .uri("/api/admin/users/warden/admin")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "isAdmin": false }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_deleting_user_removes_their_cards() {
  let (state, _sink) = test_state().await;
  create_user(&state, "warden", true, true).await;
  create_user(&state, "kael", false, true).await;
  add_card(&state, "kael", "Emberfall", "Ash Warden").await;
  let app = test_app!(state);

  let (status, _) = send!(
    app,
    TestRequest::delete()
      .uri("/api/admin/users/kael")
      .insert_header(bearer(&state, "warden", true))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(count(&state, "SELECT COUNT(*) FROM cards").await, 0);

  // Old tokens die with the account.
  let (status, _) = send!(
    app,
    TestRequest::get().uri("/api/me").insert_header(bearer(&state, "kael", false))
  );
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_revoked_approval_locks_the_account_out() {
  let (state, _sink) = test_state().await;
  create_user(&state, "warden", true, true).await;
  create_user(&state, "mira", false, true).await;
  let app = test_app!(state);
  let mira_token = bearer(&state, "mira", false);

  let (status, _) = send!(app, TestRequest::get().uri("/api/me").insert_header(mira_token.clone()));
  assert_eq!(status, StatusCode::OK);

  // No content type: the body still decides.
  let (status, body) = send!(
    app,
    TestRequest::put()
      .uri("/api/admin/users/mira/approve")
      .insert_header(bearer(&state, "warden", true))
      .set_payload(r#"{"approved": false}"#)
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["approved"], false);
  assert_eq!(
    count(&state, "SELECT COUNT(*) FROM users WHERE username = 'mira' AND approved = 0").await,
    1
  );

  // A malformed body changes nothing.
  let (status, body) = send!(
    app,
    TestRequest::put()
      .uri("/api/admin/users/mira/approve")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "approved": "no" }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().is_some());
  assert_eq!(
    count(&state, "SELECT COUNT(*) FROM users WHERE username = 'mira' AND approved = 0").await,
    1
  );

  let (status, _) = send!(app, TestRequest::get().uri("/api/me").insert_header(mira_token));
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let creds = json!({ "username": "mira", "password": PASSWORD });
  let (status, _) = send!(app, TestRequest::post().uri("/api/login").set_json(&creds));
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}
