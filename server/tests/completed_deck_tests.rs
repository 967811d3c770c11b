// tests/completed_deck_tests.rs

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use common::*;
use deckvault_server::state::AppState;
use serde_json::json;

/// kael holds six Emberfall cards, mira the other two plus a spare copy.
async fn seed_complete_emberfall(state: &AppState) {
  create_user(state, "warden", true, true).await;
  create_user(state, "kael", false, true).await;
  create_user(state, "mira", false, true).await;
  for name in &EMBERFALL[..6] {
    add_card(state, "kael", "Emberfall", name).await;
  }
  for name in &EMBERFALL[6..] {
    add_card(state, "mira", "Emberfall", name).await;
  }
  add_card(state, "mira", "Emberfall", EMBERFALL[0]).await;
}

#[actix_web::test]
async fn test_sold_without_price_is_rejected() {
  let (state, _sink) = test_state().await;
  seed_complete_emberfall(&state).await;
  let app = test_app!(state);

  let (status, body) = send!(
    app,
    TestRequest::post()
      .uri("/api/completed-decks")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "deck": "Emberfall", "disposition": "sold" }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
  assert_eq!(count(&state, "SELECT COUNT(*) FROM completed_decks").await, 0);
  assert_eq!(count(&state, "SELECT COUNT(*) FROM cards").await, 9);
}

#[actix_web::test]
async fn test_sold_with_price_records_payouts_and_consumes_cards() {
  let (state, _sink) = test_state().await;
  seed_complete_emberfall(&state).await;
  let app = test_app!(state);

  let (status, body) = send!(
    app,
    TestRequest::post()
      .uri("/api/completed-decks")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "deck": "Emberfall", "disposition": "sold", "salePrice": 1000 }))
  );
  assert_eq!(status, StatusCode::CREATED);
  let deck = &body["completedDeck"];
  assert_eq!(deck["disposition"], "sold");
  assert_eq!(deck["salePrice"], 1000);
  assert_eq!(deck["contributors"].as_array().map(Vec::len), Some(8));

  // 10% guild cut leaves 900 over 8 shares of 112; the 4 left over go to the guild.
  assert_eq!(deck["guildCut"], 104);
  assert_eq!(deck["payouts"]["kael"], 672);
  assert_eq!(deck["payouts"]["mira"], 224);

  // The eight oldest matching cards are gone; mira's spare copy stays.
  assert_eq!(count(&state, "SELECT COUNT(*) FROM cards").await, 1);
  assert_eq!(
    count(&state, "SELECT COUNT(*) FROM notifications WHERE username IN ('kael', 'mira')").await,
    2
  );

  let id = deck["id"].as_i64().expect("id");
  let (status, body) = send!(
    app,
    TestRequest::get()
      .uri(&format!("/api/completed-decks/{}/payouts", id))
      .insert_header(bearer(&state, "kael", false))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["payouts"]["kael"], 672);
}

#[actix_web::test]
async fn test_incomplete_deck_cannot_be_finalized() {
  let (state, _sink) = test_state().await;
  create_user(&state, "warden", true, true).await;
  add_card(&state, "warden", "Emberfall", EMBERFALL[0]).await;
  let app = test_app!(state);

  let (status, body) = send!(
    app,
    TestRequest::post()
      .uri("/api/completed-decks")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "deck": "Emberfall" }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().is_some_and(|m| m.contains("Smoke Oracle")));
  assert_eq!(count(&state, "SELECT COUNT(*) FROM cards").await, 1);
}

#[actix_web::test]
async fn test_finalizing_requires_admin() {
  let (state, _sink) = test_state().await;
  seed_complete_emberfall(&state).await;
  let app = test_app!(state);

  let (status, _) = send!(
    app,
    TestRequest::post()
      .uri("/api/completed-decks")
      .insert_header(bearer(&state, "kael", false))
      .set_json(json!({ "deck": "Emberfall" }))
  );
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_fulfilling_a_request_closes_it() {
  let (state, _sink) = test_state().await;
  seed_complete_emberfall(&state).await;
  create_user(&state, "tamsin", false, true).await;
  let app = test_app!(state);

  let (status, body) = send!(
    app,
    TestRequest::post()
      .uri("/api/deck-requests")
      .insert_header(bearer(&state, "tamsin", false))
      .set_json(json!({ "deck": "emberfall", "note": "for the raid" }))
  );
  assert_eq!(status, StatusCode::CREATED);
  let request_id = body["deckRequest"]["id"].as_i64().expect("request id");

  let (status, _) = send!(
    app,
    TestRequest::post()
      .uri("/api/completed-decks")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "deck": "Emberfall", "disposition": "fulfilled", "requestId": request_id }))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST, "fulfilled needs a recipient");

  let (status, body) = send!(
    app,
    TestRequest::post()
      .uri("/api/completed-decks")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({
          "deck": "Emberfall",
          "disposition": "fulfilled",
          "recipient": "tamsin",
          "requestId": request_id,
      }))
  );
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["completedDeck"]["recipient"], "tamsin");
  assert!(body["completedDeck"]["payouts"].is_null());

  let (_, body) = send!(
    app,
    TestRequest::get()
      .uri("/api/deck-requests?status=fulfilled")
      .insert_header(bearer(&state, "tamsin", false))
  );
  assert_eq!(body["deckRequests"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn test_updating_disposition_recomputes_payouts() {
  let (state, _sink) = test_state().await;
  seed_complete_emberfall(&state).await;
  let app = test_app!(state);

  let (_, body) = send!(
    app,
    TestRequest::post()
      .uri("/api/completed-decks")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "deck": "Emberfall" }))
  );
  let id = body["completedDeck"]["id"].as_i64().expect("id");
  assert_eq!(body["completedDeck"]["disposition"], "unallocated");

  let (status, _) = send!(
    app,
    TestRequest::get()
      .uri(&format!("/api/completed-decks/{}/payouts", id))
      .insert_header(bearer(&state, "kael", false))
  );
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send!(
    app,
    TestRequest::put()
      .uri(&format!("/api/completed-decks/{}", id))
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "disposition": "sold", "salePrice": 80 }))
  );
  assert_eq!(status, StatusCode::OK);
  // 8 to the guild, 72 over 8 cards.
  assert_eq!(body["completedDeck"]["guildCut"], 8);
  assert_eq!(body["completedDeck"]["payouts"]["kael"], 54);
  assert_eq!(body["completedDeck"]["payouts"]["mira"], 18);

  let (status, body) = send!(
    app,
    TestRequest::put()
      .uri(&format!("/api/completed-decks/{}", id))
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "disposition": "unallocated", "salePrice": 80 }))
  );
  assert_eq!(status, StatusCode::OK);
  assert!(body["completedDeck"]["salePrice"].is_null());
  assert!(body["completedDeck"]["payouts"].is_null());
}

#[actix_web::test]
async fn test_payout_preview_leaves_cards_alone() {
  let (state, _sink) = test_state().await;
  seed_complete_emberfall(&state).await;
  let app = test_app!(state);

  let (status, body) = send!(
    app,
    TestRequest::post()
      .uri("/api/payouts/preview")
      .insert_header(bearer(&state, "warden", true))
      .set_json(json!({ "deck": "Emberfall", "salePrice": 1000 }))
  );
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["split"]["guildCut"], 104);
  assert_eq!(count(&state, "SELECT COUNT(*) FROM cards").await, 9);
}
