// deckvault/src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeckError {
  #[error("Unknown deck: {label}")]
  UnknownDeck { label: String },

  #[error("Card '{card}' is not part of deck '{deck}'")]
  UnknownCard { deck: String, card: String },

  #[error("Invalid deck catalog: {0}")]
  InvalidCatalog(String),

  #[error("Deck '{deck}' is not complete; missing: {}", missing.join(", "))]
  Incomplete { deck: String, missing: Vec<String> },

  #[error("A sale price is required when a deck is sold")]
  MissingSalePrice,

  #[error("Sale price must be positive (got {0})")]
  InvalidSalePrice(i64),

  #[error("A recipient is required when a deck is fulfilled")]
  MissingRecipient,

  #[error("Invalid disposition: {0}")]
  InvalidDisposition(String),

  #[error("Invalid payout policy: {0}")]
  InvalidPolicy(String),

  #[error("CSV error on line {line}: {message}")]
  Csv { line: usize, message: String },

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type DeckResult<T, E = DeckError> = std::result::Result<T, E>;
