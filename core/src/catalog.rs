// deckvault/src/catalog.rs

//! The deck catalog: which decks exist and which eight cards make each of them.
//!
//! Card rows carry a free-form deck label. A label belongs to a deck when the deck's name is a
//! prefix of the label (ignoring case and surrounding whitespace), so "Emberfall (set 2)" still
//! counts toward "Emberfall". When several deck names match, the longest one wins.

use crate::error::{DeckError, DeckResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Every deck is made of exactly this many distinct cards.
pub const REQUIRED_CARDS_PER_DECK: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckDefinition {
  pub name: String,
  pub cards: Vec<String>,
}

impl DeckDefinition {
  /// Canonical spelling of `card_name` inside this deck, if it belongs to it.
  pub fn card(&self, card_name: &str) -> Option<&str> {
    let wanted = normalize(card_name);
    self.cards.iter().find(|c| normalize(c) == wanted).map(String::as_str)
  }

  fn validate(&self) -> DeckResult<()> {
    if self.name.trim().is_empty() {
      return Err(DeckError::InvalidCatalog("deck name cannot be blank".to_string()));
    }
    if self.cards.len() != REQUIRED_CARDS_PER_DECK {
      return Err(DeckError::InvalidCatalog(format!(
        "deck '{}' lists {} cards, expected {}",
        self.name,
        self.cards.len(),
        REQUIRED_CARDS_PER_DECK
      )));
    }
    let mut seen = HashSet::with_capacity(self.cards.len());
    for card in &self.cards {
      let key = normalize(card);
      if key.is_empty() {
        return Err(DeckError::InvalidCatalog(format!("deck '{}' has a blank card name", self.name)));
      }
      if !seen.insert(key) {
        return Err(DeckError::InvalidCatalog(format!(
          "deck '{}' lists card '{}' more than once",
          self.name, card
        )));
      }
    }
    Ok(())
  }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
  decks: Vec<DeckDefinition>,
}

#[derive(Debug, Clone, Default)]
pub struct DeckCatalog {
  decks: Vec<DeckDefinition>,
}

impl DeckCatalog {
  pub fn new(decks: Vec<DeckDefinition>) -> DeckResult<Self> {
    let mut names = HashSet::with_capacity(decks.len());
    for deck in &decks {
      deck.validate()?;
      if !names.insert(normalize(&deck.name)) {
        return Err(DeckError::InvalidCatalog(format!("deck '{}' is defined twice", deck.name)));
      }
    }
    debug!(deck_count = decks.len(), "Deck catalog validated.");
    Ok(Self { decks })
  }

  /// Parses `{"decks": [{"name": "...", "cards": ["...", ...]}, ...]}`.
  pub fn from_json_str(json: &str) -> DeckResult<Self> {
    let file: CatalogFile = serde_json::from_str(json)?;
    Self::new(file.decks)
  }

  #[instrument(name = "DeckCatalog::from_path", skip_all, fields(path = %path.as_ref().display()), err(Display))]
  pub fn from_path(path: impl AsRef<Path>) -> DeckResult<Self> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let catalog = Self::from_json_str(&raw)?;
    info!(deck_count = catalog.len(), "Deck catalog loaded.");
    Ok(catalog)
  }

  pub fn len(&self) -> usize {
    self.decks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.decks.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &DeckDefinition> {
    self.decks.iter()
  }

  /// Exact lookup by deck name (case-insensitive).
  pub fn get(&self, name: &str) -> Option<&DeckDefinition> {
    let wanted = normalize(name);
    self.decks.iter().find(|d| normalize(&d.name) == wanted)
  }

  /// Prefix resolution of a card's deck label.
  pub fn resolve(&self, label: &str) -> Option<&DeckDefinition> {
    let label = normalize(label);
    if label.is_empty() {
      return None;
    }
    self
      .decks
      .iter()
      .filter(|d| label.starts_with(&normalize(&d.name)))
      .max_by_key(|d| normalize(&d.name).len())
  }

  /// Resolves both the deck and the card, returning their canonical spellings.
  pub fn canonical_card(&self, deck_label: &str, card_name: &str) -> DeckResult<(&DeckDefinition, &str)> {
    let deck = self.resolve(deck_label).ok_or_else(|| DeckError::UnknownDeck {
      label: deck_label.trim().to_string(),
    })?;
    let card = deck.card(card_name).ok_or_else(|| DeckError::UnknownCard {
      deck: deck.name.clone(),
      card: card_name.trim().to_string(),
    })?;
    Ok((deck, card))
  }
}

pub(crate) fn normalize(s: &str) -> String {
  s.trim().to_lowercase()
}
