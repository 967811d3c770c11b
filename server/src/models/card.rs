// deckvault/server/src/models/card.rs

use chrono::{DateTime, Utc};
use deckvault::{CardRecord, Holding};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Card {
  pub id: i64,
  pub name: String,
  /// Owning user.
  pub username: String,
  pub deck: String,
  pub created_at: DateTime<Utc>,
}

pub const CARD_COLUMNS: &str = "id, name, username, deck, created_at";

impl Holding for Card {
  fn id(&self) -> i64 {
    self.id
  }

  fn card_name(&self) -> &str {
    &self.name
  }

  fn owner(&self) -> &str {
    &self.username
  }

  fn deck_label(&self) -> &str {
    &self.deck
  }
}

impl From<Card> for CardRecord {
  fn from(card: Card) -> Self {
    CardRecord {
      name: card.name,
      owner: card.username,
      deck: card.deck,
    }
  }
}
