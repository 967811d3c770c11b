// deckvault/server/src/models/completed_deck.rs

use chrono::{DateTime, Utc};
use deckvault::{DeckResult, Disposition};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;

/// A deck an admin finalized. Only the disposition fields change after creation.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompletedDeck {
  pub id: i64,
  pub deck: String,
  /// One entry per contributed card, so a user can appear more than once.
  pub contributors: Json<Vec<String>>,
  pub disposition: String,
  pub recipient: Option<String>,
  pub sale_price: Option<i64>,
  pub guild_cut: Option<i64>,
  pub payouts: Option<Json<BTreeMap<String, i64>>>,
  pub request_id: Option<i64>,
  pub completed_by: String,
  pub completed_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

pub const COMPLETED_DECK_COLUMNS: &str = "id, deck, contributors, disposition, recipient, sale_price, guild_cut, payouts, request_id, completed_by, completed_at, updated_at";

impl CompletedDeck {
  pub fn disposition(&self) -> DeckResult<Disposition> {
    self.disposition.parse()
  }
}
