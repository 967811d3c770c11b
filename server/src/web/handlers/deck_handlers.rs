// deckvault/server/src/web/handlers/deck_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{instrument, warn};

use super::card_handlers::load_cards;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_decks", skip(app_state, _auth_user))]
pub async fn list_decks_handler(app_state: web::Data<AppState>, _auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let cards = load_cards(&app_state.db_pool).await?;
  let decks = deckvault::catalog_status(&app_state.catalog, &cards);
  Ok(HttpResponse::Ok().json(json!({ "decks": decks })))
}

#[instrument(name = "handler::deck_catalog", skip(app_state, _auth_user))]
pub async fn deck_catalog_handler(app_state: web::Data<AppState>, _auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let decks: Vec<_> = app_state.catalog.iter().collect();
  Ok(HttpResponse::Ok().json(json!({ "decks": decks })))
}

#[instrument(name = "handler::get_deck", skip(app_state, _auth_user, path), fields(deck = %path.as_str()))]
pub async fn get_deck_handler(
  app_state: web::Data<AppState>,
  _auth_user: AuthenticatedUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let label = path.into_inner();
  let definition = app_state.catalog.resolve(&label).ok_or_else(|| {
    warn!("Unknown deck requested.");
    AppError::NotFound(format!("Deck '{}' not found.", label))
  })?;

  let cards = load_cards(&app_state.db_pool).await?;
  let status = deckvault::deck_status(definition, &app_state.catalog, &cards);
  Ok(HttpResponse::Ok().json(json!({ "definition": definition, "status": status })))
}
