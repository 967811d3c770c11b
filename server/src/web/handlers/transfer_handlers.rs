// deckvault/server/src/web/handlers/transfer_handlers.rs

//! Card export and bulk import.
//!
//! Imports validate every record before writing anything, then apply the whole batch in one
//! transaction.

use actix_web::{http::header, web, HttpResponse};
use deckvault::CardRecord;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use tracing::{info, instrument};

use super::card_handlers::load_cards;
use crate::errors::AppError;
use crate::models::completed_deck::{CompletedDeck, COMPLETED_DECK_COLUMNS};
use crate::models::deck_request::{DeckRequest, DECK_REQUEST_COLUMNS};
use crate::services::activity_service;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
pub struct ImportCardsPayload {
  pub cards: Vec<CardRecord>,
  #[serde(default)]
  pub replace: bool,
}

#[derive(Deserialize, Debug)]
pub struct ImportCsvQuery {
  #[serde(default)]
  pub replace: bool,
}

/// Canonicalizes every record or reports the first bad one.
async fn validate_records(app_state: &AppState, records: Vec<CardRecord>) -> Result<Vec<CardRecord>, AppError> {
  if records.is_empty() {
    return Err(AppError::Validation("Nothing to import.".to_string()));
  }
  let known: HashSet<String> = sqlx::query_scalar::<_, String>("SELECT username FROM users")
    .fetch_all(&app_state.db_pool)
    .await?
    .into_iter()
    .collect();

  records
    .into_iter()
    .enumerate()
    .map(|(index, record)| {
      let owner = record.owner.trim().to_string();
      if !known.contains(&owner) {
        return Err(AppError::Validation(format!("Record {}: unknown user '{}'.", index + 1, owner)));
      }
      let (definition, card) = app_state
        .catalog
        .canonical_card(&record.deck, &record.name)
        .map_err(|e| AppError::Validation(format!("Record {}: {}", index + 1, e)))?;
      Ok(CardRecord {
        name: card.to_string(),
        owner,
        deck: definition.name.clone(),
      })
    })
    .collect()
}

async fn import_records(
  app_state: &AppState,
  admin: &AdminUser,
  records: Vec<CardRecord>,
  replace: bool,
) -> Result<HttpResponse, AppError> {
  let records = validate_records(app_state, records).await?;

  let mut tx = app_state.db_pool.begin().await?;
  let removed = if replace {
    sqlx::query("DELETE FROM cards").execute(&mut *tx).await?.rows_affected()
  } else {
    0
  };
  let now = chrono::Utc::now();
  for record in &records {
    sqlx::query("INSERT INTO cards (name, username, deck, created_at) VALUES (?, ?, ?, ?)")
      .bind(&record.name)
      .bind(&record.owner)
      .bind(&record.deck)
      .bind(now)
      .execute(&mut *tx)
      .await?;
  }
  tx.commit().await?;
  info!(imported = records.len(), removed, replace, "Cards imported.");

  activity_service::record(
    &app_state.db_pool,
    Some(admin.username()),
    "import_cards",
    Some(format!("{} imported, {} removed", records.len(), removed)),
  )
  .await;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Import complete.",
      "imported": records.len(),
      "removed": removed,
  })))
}

#[instrument(name = "handler::export_cards_csv", skip(app_state, _admin))]
pub async fn export_cards_csv_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let records: Vec<CardRecord> = load_cards(&app_state.db_pool).await?.into_iter().map(CardRecord::from).collect();
  let body = deckvault::write_cards(&records);
  Ok(
    HttpResponse::Ok()
      .content_type("text/csv; charset=utf-8")
      .insert_header((header::CONTENT_DISPOSITION, "attachment; filename=\"cards.csv\""))
      .body(body),
  )
}

#[instrument(name = "handler::export_json", skip(app_state, _admin))]
pub async fn export_json_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  let cards = load_cards(&app_state.db_pool).await?;
  let completed_decks = sqlx::query_as::<_, CompletedDeck>(&format!(
    "SELECT {} FROM completed_decks ORDER BY id ASC",
    COMPLETED_DECK_COLUMNS
  ))
  .fetch_all(&app_state.db_pool)
  .await?;
  let deck_requests = sqlx::query_as::<_, DeckRequest>(&format!(
    "SELECT {} FROM deck_requests ORDER BY id ASC",
    DECK_REQUEST_COLUMNS
  ))
  .fetch_all(&app_state.db_pool)
  .await?;

  Ok(HttpResponse::Ok().json(json!({
      "exportedAt": chrono::Utc::now(),
      "cards": cards,
      "completedDecks": completed_decks,
      "deckRequests": deck_requests,
  })))
}

#[instrument(name = "handler::import_cards", skip(app_state, admin, req_payload), fields(admin = %admin.username()))]
pub async fn import_cards_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  req_payload: web::Json<ImportCardsPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  import_records(&app_state, &admin, payload.cards, payload.replace).await
}

#[instrument(name = "handler::import_cards_csv", skip(app_state, admin, query, body), fields(admin = %admin.username()))]
pub async fn import_cards_csv_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  query: web::Query<ImportCsvQuery>,
  body: String,
) -> Result<HttpResponse, AppError> {
  let records = deckvault::parse_cards(&body)?;
  import_records(&app_state, &admin, records, query.replace).await
}
