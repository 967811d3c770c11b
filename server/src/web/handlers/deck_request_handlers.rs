// deckvault/server/src/web/handlers/deck_request_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::deck_request::{DeckRequest, RequestStatus, DECK_REQUEST_COLUMNS};
use crate::services::activity_service;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, Debug)]
pub struct ListDeckRequestsQuery {
  pub status: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateDeckRequestPayload {
  pub deck: String,
  pub note: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateDeckRequestPayload {
  pub status: Option<String>,
  pub note: Option<String>,
}

async fn find_request(app_state: &AppState, request_id: i64) -> Result<DeckRequest, AppError> {
  sqlx::query_as::<_, DeckRequest>(&format!("SELECT {} FROM deck_requests WHERE id = ?", DECK_REQUEST_COLUMNS))
    .bind(request_id)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Deck request {} not found.", request_id)))
}

fn clean_note(note: Option<String>) -> Option<String> {
  note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[instrument(name = "handler::list_deck_requests", skip(app_state, _auth_user, query))]
pub async fn list_deck_requests_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  query: web::Query<ListDeckRequestsQuery>,
) -> Result<HttpResponse, AppError> {
  let status = match query.status.as_deref().filter(|s| !s.trim().is_empty()) {
    Some(s) => Some(s.parse::<RequestStatus>()?),
    None => None,
  };
  let status = status.map(|s| s.as_str());

  let requests = sqlx::query_as::<_, DeckRequest>(&format!(
    "SELECT {} FROM deck_requests WHERE (? IS NULL OR status = ?) ORDER BY id DESC",
    DECK_REQUEST_COLUMNS
  ))
  .bind(status)
  .bind(status)
  .fetch_all(&app_state.db_pool)
  .await?;
  Ok(HttpResponse::Ok().json(json!({ "deckRequests": requests })))
}

#[instrument(
    name = "handler::create_deck_request",
    skip(app_state, auth_user, req_payload),
    fields(username = %auth_user.username, deck = %req_payload.deck)
)]
pub async fn create_deck_request_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CreateDeckRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let definition = app_state
    .catalog
    .resolve(&payload.deck)
    .ok_or_else(|| deckvault::DeckError::UnknownDeck { label: payload.deck.clone() })?;
  let now = chrono::Utc::now();

  let request: DeckRequest = sqlx::query_as(&format!(
    "INSERT INTO deck_requests (deck, username, note, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
    DECK_REQUEST_COLUMNS
  ))
  .bind(&definition.name)
  .bind(&auth_user.username)
  .bind(clean_note(payload.note))
  .bind(RequestStatus::Open.as_str())
  .bind(now)
  .bind(now)
  .fetch_one(&app_state.db_pool)
  .await?;
  info!(request_id = request.id, "Deck request created.");

  activity_service::record(
    &app_state.db_pool,
    Some(&auth_user.username),
    "request_deck",
    Some(format!("#{} {}", request.id, request.deck)),
  )
  .await;
  let message = format!("{} requested the deck '{}'.", auth_user.username, request.deck);
  if let Err(e) = app_state.notifier.notify_admins(&message, Some("/deck-requests")).await {
    warn!(error = %e, "Could not notify admins about a deck request.");
  }

  Ok(HttpResponse::Created().json(json!({ "message": "Deck request created.", "deckRequest": request })))
}

#[instrument(name = "handler::update_deck_request", skip(app_state, admin, path, req_payload), fields(admin = %admin.username()))]
pub async fn update_deck_request_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<i64>,
  req_payload: web::Json<UpdateDeckRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let request_id = path.into_inner();
  let existing = find_request(&app_state, request_id).await?;
  let payload = req_payload.into_inner();

  let status = match payload.status.as_deref() {
    Some(s) => s.parse::<RequestStatus>()?.as_str(),
    None => existing.status.as_str(),
  };
  let note = match payload.note {
    Some(note) => clean_note(Some(note)),
    None => existing.note.clone(),
  };

  let updated: DeckRequest = sqlx::query_as(&format!(
    "UPDATE deck_requests SET status = ?, note = ?, updated_at = ? WHERE id = ? RETURNING {}",
    DECK_REQUEST_COLUMNS
  ))
  .bind(status)
  .bind(note)
  .bind(chrono::Utc::now())
  .bind(request_id)
  .fetch_one(&app_state.db_pool)
  .await?;

  activity_service::record(
    &app_state.db_pool,
    Some(admin.username()),
    "update_deck_request",
    Some(format!("#{} {} -> {}", updated.id, existing.status, updated.status)),
  )
  .await;
  if updated.status != existing.status {
    let message = format!("Your request for '{}' is now {}.", updated.deck, updated.status);
    if let Err(e) = app_state.notifier.notify_user(&updated.username, &message, Some("/deck-requests")).await {
      warn!(error = %e, "Could not notify requester about a status change.");
    }
  }

  Ok(HttpResponse::Ok().json(json!({ "message": "Deck request updated.", "deckRequest": updated })))
}

#[instrument(name = "handler::delete_deck_request", skip(app_state, auth_user, path), fields(username = %auth_user.username))]
pub async fn delete_deck_request_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let request_id = path.into_inner();
  let request = find_request(&app_state, request_id).await?;
  if request.username != auth_user.username && !auth_user.is_admin {
    return Err(AppError::Forbidden("You can only delete your own requests.".to_string()));
  }

  sqlx::query("DELETE FROM deck_requests WHERE id = ?")
    .bind(request_id)
    .execute(&app_state.db_pool)
    .await?;
  activity_service::record(
    &app_state.db_pool,
    Some(&auth_user.username),
    "delete_deck_request",
    Some(format!("#{} {}", request.id, request.deck)),
  )
  .await;
  Ok(HttpResponse::Ok().json(json!({ "message": "Deck request deleted.", "id": request_id })))
}
