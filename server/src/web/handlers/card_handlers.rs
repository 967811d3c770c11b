// deckvault/server/src/web/handlers/card_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::card::{Card, CARD_COLUMNS};
use crate::services::activity_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct ListCardsQuery {
  pub deck: Option<String>,
  pub owner: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateCardPayload {
  pub name: String,
  pub deck: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCardPayload {
  pub name: Option<String>,
  pub deck: Option<String>,
  /// Reassigning a card is an admin operation.
  pub owner: Option<String>,
}

/// Every card, oldest first. Contribution selection relies on this order.
pub(crate) async fn load_cards(pool: &SqlitePool) -> Result<Vec<Card>, AppError> {
  let cards = sqlx::query_as::<_, Card>(&format!("SELECT {} FROM cards ORDER BY id ASC", CARD_COLUMNS))
    .fetch_all(pool)
    .await?;
  Ok(cards)
}

async fn find_card(pool: &SqlitePool, card_id: i64) -> Result<Card, AppError> {
  sqlx::query_as::<_, Card>(&format!("SELECT {} FROM cards WHERE id = ?", CARD_COLUMNS))
    .bind(card_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Card {} not found.", card_id)))
}

fn ensure_owner_or_admin(card: &Card, user: &AuthenticatedUser) -> Result<(), AppError> {
  if card.username != user.username && !user.is_admin {
    warn!(card_id = card.id, owner = %card.username, "User attempted to modify a card they do not own.");
    return Err(AppError::Forbidden("You can only modify your own cards.".to_string()));
  }
  Ok(())
}

#[instrument(name = "handler::list_cards", skip(app_state, _auth_user, query))]
pub async fn list_cards_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  query: web::Query<ListCardsQuery>,
) -> Result<HttpResponse, AppError> {
  let owner = query.owner.as_deref().map(str::trim).filter(|o| !o.is_empty());
  let mut cards = sqlx::query_as::<_, Card>(&format!(
    "SELECT {} FROM cards WHERE (? IS NULL OR username = ?) ORDER BY id ASC",
    CARD_COLUMNS
  ))
  .bind(owner)
  .bind(owner)
  .fetch_all(&app_state.db_pool)
  .await?;

  if let Some(label) = query.deck.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
    let wanted = app_state
      .catalog
      .resolve(label)
      .ok_or_else(|| deckvault::DeckError::UnknownDeck { label: label.to_string() })?;
    cards.retain(|c| app_state.catalog.resolve(&c.deck).is_some_and(|d| d.name == wanted.name));
  }

  info!("Fetched {} cards.", cards.len());
  Ok(HttpResponse::Ok().json(json!({ "cards": cards })))
}

#[instrument(name = "handler::my_cards", skip(app_state, auth_user), fields(username = %auth_user.username))]
pub async fn my_cards_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let cards = sqlx::query_as::<_, Card>(&format!(
    "SELECT {} FROM cards WHERE username = ? ORDER BY id ASC",
    CARD_COLUMNS
  ))
  .bind(&auth_user.username)
  .fetch_all(&app_state.db_pool)
  .await?;
  Ok(HttpResponse::Ok().json(json!({ "cards": cards })))
}

#[instrument(
    name = "handler::create_card",
    skip(app_state, auth_user, req_payload),
    fields(username = %auth_user.username, card = %req_payload.name)
)]
pub async fn create_card_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CreateCardPayload>,
) -> Result<HttpResponse, AppError> {
  let (definition, card_name) = app_state.catalog.canonical_card(&req_payload.deck, &req_payload.name)?;

  let card: Card = sqlx::query_as(&format!(
    "INSERT INTO cards (name, username, deck, created_at) VALUES (?, ?, ?, ?) RETURNING {}",
    CARD_COLUMNS
  ))
  .bind(card_name)
  .bind(&auth_user.username)
  .bind(&definition.name)
  .bind(chrono::Utc::now())
  .fetch_one(&app_state.db_pool)
  .await?;
  info!(card_id = card.id, deck = %card.deck, "Card added.");

  activity_service::record(
    &app_state.db_pool,
    Some(&auth_user.username),
    "add_card",
    Some(format!("{} ({})", card.name, card.deck)),
  )
  .await;

  // The completion event belongs to the insert that completes the deck in id order.
  let cards = load_cards(&app_state.db_pool).await?;
  let mut earlier: Vec<Card> = cards.iter().filter(|c| c.id < card.id).cloned().collect();
  let was_complete = deckvault::deck_status(definition, &app_state.catalog, &earlier).complete;
  earlier.push(card.clone());
  let completed_here = !was_complete && deckvault::deck_status(definition, &app_state.catalog, &earlier).complete;
  let status = deckvault::deck_status(definition, &app_state.catalog, &cards);
  if completed_here {
    let message = format!("Deck '{}' is complete and ready to be finalized.", definition.name);
    info!(deck = %definition.name, "Deck completed by new card.");
    if let Err(e) = app_state.notifier.notify_admins(&message, Some("/decks")).await {
      warn!(error = %e, "Could not notify admins about a completed deck.");
    }
    app_state.notifier.broadcast_discord(&message);
  }

  Ok(HttpResponse::Created().json(json!({
      "message": "Card added.",
      "card": card,
      "deckStatus": status,
  })))
}

#[instrument(name = "handler::update_card", skip(app_state, auth_user, path, req_payload), fields(username = %auth_user.username))]
pub async fn update_card_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
  req_payload: web::Json<UpdateCardPayload>,
) -> Result<HttpResponse, AppError> {
  let card_id = path.into_inner();
  let existing = find_card(&app_state.db_pool, card_id).await?;
  ensure_owner_or_admin(&existing, &auth_user)?;

  let payload = req_payload.into_inner();
  let deck_label = payload.deck.as_deref().unwrap_or(&existing.deck);
  let name = payload.name.as_deref().unwrap_or(&existing.name);
  let (definition, card_name) = app_state.catalog.canonical_card(deck_label, name)?;

  let owner = match payload.owner.map(|o| o.trim().to_string()) {
    Some(owner) if owner != existing.username => {
      if !auth_user.is_admin {
        return Err(AppError::Forbidden("Only admins can reassign cards.".to_string()));
      }
      let known = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
        .bind(&owner)
        .fetch_one(&app_state.db_pool)
        .await?;
      if !known {
        return Err(AppError::Validation(format!("Unknown user '{}'.", owner)));
      }
      owner
    }
    _ => existing.username.clone(),
  };

  let card: Card = sqlx::query_as(&format!(
    "UPDATE cards SET name = ?, deck = ?, username = ? WHERE id = ? RETURNING {}",
    CARD_COLUMNS
  ))
  .bind(card_name)
  .bind(&definition.name)
  .bind(&owner)
  .bind(card_id)
  .fetch_one(&app_state.db_pool)
  .await?;

  activity_service::record(
    &app_state.db_pool,
    Some(&auth_user.username),
    "update_card",
    Some(format!("#{} {} ({}) owner {}", card.id, card.name, card.deck, card.username)),
  )
  .await;
  Ok(HttpResponse::Ok().json(json!({ "message": "Card updated.", "card": card })))
}

#[instrument(name = "handler::delete_card", skip(app_state, auth_user, path), fields(username = %auth_user.username))]
pub async fn delete_card_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let card_id = path.into_inner();
  let card = find_card(&app_state.db_pool, card_id).await?;
  ensure_owner_or_admin(&card, &auth_user)?;

  sqlx::query("DELETE FROM cards WHERE id = ?")
    .bind(card_id)
    .execute(&app_state.db_pool)
    .await?;
  info!(card_id, "Card deleted.");

  activity_service::record(
    &app_state.db_pool,
    Some(&auth_user.username),
    "delete_card",
    Some(format!("#{} {} ({})", card.id, card.name, card.deck)),
  )
  .await;
  Ok(HttpResponse::Ok().json(json!({ "message": "Card deleted.", "id": card_id })))
}
