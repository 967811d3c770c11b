// deckvault/server/src/web/handlers/completed_deck_handlers.rs

//! Finalizing complete decks and managing what happened to them.
//!
//! Finalizing consumes the contributed card rows: the deck row, the card deletions and the
//! optional request fulfilment commit together or not at all.

use actix_web::{web, HttpResponse};
use deckvault::{Disposition, DispositionUpdate};
use serde::Deserialize;
use serde_json::json;
use sqlx::types::Json;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::models::card::{Card, CARD_COLUMNS};
use crate::models::completed_deck::{CompletedDeck, COMPLETED_DECK_COLUMNS};
use crate::models::deck_request::{DeckRequest, RequestStatus, DECK_REQUEST_COLUMNS};
use crate::services::activity_service;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompletedDeckPayload {
  pub deck: String,
  #[serde(default)]
  pub disposition: Option<Disposition>,
  #[serde(default)]
  pub sale_price: Option<i64>,
  #[serde(default)]
  pub recipient: Option<String>,
  #[serde(default)]
  pub request_id: Option<i64>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PayoutPreviewPayload {
  pub deck: String,
  pub sale_price: i64,
}

async fn find_completed_deck(app_state: &AppState, deck_id: i64) -> Result<CompletedDeck, AppError> {
  sqlx::query_as::<_, CompletedDeck>(&format!(
    "SELECT {} FROM completed_decks WHERE id = ?",
    COMPLETED_DECK_COLUMNS
  ))
  .bind(deck_id)
  .fetch_optional(&app_state.db_pool)
  .await?
  .ok_or_else(|| AppError::NotFound(format!("Completed deck {} not found.", deck_id)))
}

/// Payouts for a sold deck; `None` for any other disposition.
fn payouts_for(
  app_state: &AppState,
  update: &DispositionUpdate,
  contributors: &[String],
) -> Result<(Option<i64>, Option<BTreeMap<String, i64>>), AppError> {
  match (update.disposition, update.sale_price) {
    (Disposition::Sold, Some(price)) => {
      let split = app_state.payout_policy.split(price, contributors)?;
      Ok((Some(split.guild_cut), Some(split.payouts)))
    }
    _ => Ok((None, None)),
  }
}

fn disposition_summary(deck: &CompletedDeck) -> String {
  match (deck.disposition.as_str(), deck.sale_price, deck.recipient.as_deref()) {
    ("sold", Some(price), _) => format!("Deck '{}' was sold for {}.", deck.deck, price),
    ("fulfilled", _, Some(recipient)) => format!("Deck '{}' was given to {}.", deck.deck, recipient),
    _ => format!("Deck '{}' was finalized.", deck.deck),
  }
}

#[instrument(name = "handler::list_completed_decks", skip(app_state, _auth_user))]
pub async fn list_completed_decks_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let decks = sqlx::query_as::<_, CompletedDeck>(&format!(
    "SELECT {} FROM completed_decks ORDER BY id DESC",
    COMPLETED_DECK_COLUMNS
  ))
  .fetch_all(&app_state.db_pool)
  .await?;
  Ok(HttpResponse::Ok().json(json!({ "completedDecks": decks })))
}

#[instrument(name = "handler::get_completed_deck", skip(app_state, _auth_user, path), fields(deck_id = %path.as_ref()))]
pub async fn get_completed_deck_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let deck = find_completed_deck(&app_state, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "completedDeck": deck })))
}

#[instrument(
    name = "handler::create_completed_deck",
    skip(app_state, admin, req_payload),
    fields(admin = %admin.username(), deck = %req_payload.deck)
)]
pub async fn create_completed_deck_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  req_payload: web::Json<CreateCompletedDeckPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let definition = app_state
    .catalog
    .resolve(&payload.deck)
    .ok_or_else(|| deckvault::DeckError::UnknownDeck { label: payload.deck.clone() })?;
  let update = DispositionUpdate {
    disposition: payload.disposition.unwrap_or(Disposition::Unallocated),
    sale_price: payload.sale_price,
    recipient: payload.recipient,
  }
  .normalized()?;

  let mut tx = app_state.db_pool.begin().await?;

  let request = match payload.request_id {
    Some(request_id) => {
      let request = sqlx::query_as::<_, DeckRequest>(&format!(
        "SELECT {} FROM deck_requests WHERE id = ?",
        DECK_REQUEST_COLUMNS
      ))
      .bind(request_id)
      .fetch_optional(&mut *tx)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Deck request {} not found.", request_id)))?;
      if request.status != RequestStatus::Open.as_str() {
        return Err(AppError::Validation(format!("Deck request {} is not open.", request_id)));
      }
      if app_state.catalog.resolve(&request.deck).map(|d| &d.name) != Some(&definition.name) {
        return Err(AppError::Validation(format!(
          "Deck request {} is for '{}', not '{}'.",
          request_id, request.deck, definition.name
        )));
      }
      Some(request)
    }
    None => None,
  };

  let cards = sqlx::query_as::<_, Card>(&format!("SELECT {} FROM cards ORDER BY id ASC", CARD_COLUMNS))
    .fetch_all(&mut *tx)
    .await?;
  let contributions = deckvault::select_contributions(definition, &app_state.catalog, &cards)?;

  for contribution in &contributions {
    let deleted = sqlx::query("DELETE FROM cards WHERE id = ?")
      .bind(contribution.card_id)
      .execute(&mut *tx)
      .await?;
    if deleted.rows_affected() != 1 {
      error!(card_id = contribution.card_id, "Contributed card vanished while finalizing.");
      return Err(AppError::Conflict("Cards changed while finalizing; try again.".to_string()));
    }
  }

  let contributors: Vec<String> = contributions.iter().map(|c| c.owner.clone()).collect();
  let (guild_cut, payouts) = payouts_for(&app_state, &update, &contributors)?;
  let now = chrono::Utc::now();

  let completed: CompletedDeck = sqlx::query_as(&format!(
    "INSERT INTO completed_decks (deck, contributors, disposition, recipient, sale_price, guild_cut, payouts, request_id, completed_by, completed_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
    COMPLETED_DECK_COLUMNS
  ))
  .bind(&definition.name)
  .bind(Json(&contributors))
  .bind(update.disposition.as_str())
  .bind(update.recipient.as_deref())
  .bind(update.sale_price)
  .bind(guild_cut)
  .bind(payouts.as_ref().map(Json))
  .bind(request.as_ref().map(|r| r.id))
  .bind(admin.username())
  .bind(now)
  .bind(now)
  .fetch_one(&mut *tx)
  .await?;

  if let Some(request) = &request {
    sqlx::query("UPDATE deck_requests SET status = ?, updated_at = ? WHERE id = ?")
      .bind(RequestStatus::Fulfilled.as_str())
      .bind(now)
      .bind(request.id)
      .execute(&mut *tx)
      .await?;
  }

  tx.commit().await?;
  info!(completed_deck_id = completed.id, disposition = %completed.disposition, "Deck finalized.");

  activity_service::record(
    &app_state.db_pool,
    Some(admin.username()),
    "complete_deck",
    Some(format!("#{} {} ({})", completed.id, completed.deck, completed.disposition)),
  )
  .await;

  let link = format!("/completed-decks/{}", completed.id);
  let summary = disposition_summary(&completed);
  let distinct: BTreeSet<&str> = contributors.iter().map(String::as_str).collect();
  for contributor in distinct {
    let share = payouts.as_ref().and_then(|p| p.get(contributor)).copied();
    let message = match share {
      Some(amount) => format!("{} Your payout: {}.", summary, amount),
      None => format!("{} Thanks for contributing.", summary),
    };
    if let Err(e) = app_state.notifier.notify_user(contributor, &message, Some(&link)).await {
      warn!(error = %e, contributor, "Could not notify contributor.");
    }
  }
  if let Some(request) = &request {
    let message = format!("Your request for '{}' has been fulfilled.", definition.name);
    if let Err(e) = app_state.notifier.notify_user(&request.username, &message, Some(&link)).await {
      warn!(error = %e, requester = %request.username, "Could not notify requester.");
    }
  }
  app_state.notifier.broadcast_discord(&summary);

  Ok(HttpResponse::Created().json(json!({
      "message": "Deck finalized.",
      "completedDeck": completed,
      "contributions": contributions,
  })))
}

#[instrument(
    name = "handler::update_completed_deck",
    skip(app_state, admin, path, req_payload),
    fields(admin = %admin.username(), deck_id = %path.as_ref())
)]
pub async fn update_completed_deck_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<i64>,
  req_payload: web::Json<DispositionUpdate>,
) -> Result<HttpResponse, AppError> {
  let deck_id = path.into_inner();
  let existing = find_completed_deck(&app_state, deck_id).await?;
  let update = req_payload.into_inner().normalized()?;
  let (guild_cut, payouts) = payouts_for(&app_state, &update, &existing.contributors)?;

  let updated: CompletedDeck = sqlx::query_as(&format!(
    "UPDATE completed_decks SET disposition = ?, recipient = ?, sale_price = ?, guild_cut = ?, payouts = ?, updated_at = ? \
     WHERE id = ? RETURNING {}",
    COMPLETED_DECK_COLUMNS
  ))
  .bind(update.disposition.as_str())
  .bind(update.recipient.as_deref())
  .bind(update.sale_price)
  .bind(guild_cut)
  .bind(payouts.map(Json))
  .bind(chrono::Utc::now())
  .bind(deck_id)
  .fetch_one(&app_state.db_pool)
  .await?;

  activity_service::record(
    &app_state.db_pool,
    Some(admin.username()),
    "update_completed_deck",
    Some(format!("#{} {} -> {}", updated.id, existing.disposition, updated.disposition)),
  )
  .await;

  if updated.disposition != existing.disposition && update.disposition != Disposition::Unallocated {
    app_state.notifier.broadcast_discord(&disposition_summary(&updated));
  }

  Ok(HttpResponse::Ok().json(json!({ "message": "Completed deck updated.", "completedDeck": updated })))
}

#[instrument(name = "handler::delete_completed_deck", skip(app_state, admin, path), fields(admin = %admin.username()))]
pub async fn delete_completed_deck_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let deck_id = path.into_inner();
  let result = sqlx::query("DELETE FROM completed_decks WHERE id = ?")
    .bind(deck_id)
    .execute(&app_state.db_pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("Completed deck {} not found.", deck_id)));
  }

  activity_service::record(
    &app_state.db_pool,
    Some(admin.username()),
    "delete_completed_deck",
    Some(format!("#{}", deck_id)),
  )
  .await;
  Ok(HttpResponse::Ok().json(json!({ "message": "Completed deck deleted.", "id": deck_id })))
}

#[instrument(name = "handler::completed_deck_payouts", skip(app_state, _auth_user, path), fields(deck_id = %path.as_ref()))]
pub async fn completed_deck_payouts_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let deck = find_completed_deck(&app_state, path.into_inner()).await?;
  if deck.disposition()? != Disposition::Sold {
    return Err(AppError::Validation(format!(
      "Completed deck {} has not been sold.",
      deck.id
    )));
  }
  Ok(HttpResponse::Ok().json(json!({
      "id": deck.id,
      "deck": deck.deck,
      "salePrice": deck.sale_price,
      "guildCut": deck.guild_cut,
      "payouts": deck.payouts,
  })))
}

#[instrument(name = "handler::payout_preview", skip(app_state, _admin, req_payload), fields(deck = %req_payload.deck))]
pub async fn payout_preview_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  req_payload: web::Json<PayoutPreviewPayload>,
) -> Result<HttpResponse, AppError> {
  let definition = app_state
    .catalog
    .resolve(&req_payload.deck)
    .ok_or_else(|| deckvault::DeckError::UnknownDeck { label: req_payload.deck.clone() })?;
  let cards = super::card_handlers::load_cards(&app_state.db_pool).await?;
  let contributions = deckvault::select_contributions(definition, &app_state.catalog, &cards)?;
  let contributors: Vec<&str> = contributions.iter().map(|c| c.owner.as_str()).collect();
  let split = app_state.payout_policy.split(req_payload.sale_price, &contributors)?;

  Ok(HttpResponse::Ok().json(json!({
      "deck": definition.name,
      "guildCutPercent": app_state.payout_policy.guild_cut_percent(),
      "contributions": contributions,
      "split": split,
  })))
}
