// deckvault/src/completion.rs

//! Deck completion: a deck is complete when every one of its required cards has at least one
//! owner among the holdings passed in. Nothing here is cached; callers recompute on every read.

use crate::catalog::{normalize, DeckCatalog, DeckDefinition};
use crate::error::{DeckError, DeckResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A single owned card as the caller stores it.
pub trait Holding {
  fn id(&self) -> i64;
  fn card_name(&self) -> &str;
  fn owner(&self) -> &str;
  fn deck_label(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStatus {
  pub deck: String,
  pub complete: bool,
  /// Required cards nobody owns, in catalog order.
  pub missing: Vec<String>,
  /// Number of distinct required cards owned.
  pub owned: usize,
  pub required: usize,
  /// Owned required card -> sorted, de-duplicated owners.
  pub owners: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
  pub card_id: i64,
  pub card_name: String,
  pub owner: String,
}

fn belongs_to<H: Holding>(holding: &H, definition: &DeckDefinition, catalog: &DeckCatalog) -> bool {
  catalog
    .resolve(holding.deck_label())
    .is_some_and(|d| normalize(&d.name) == normalize(&definition.name))
}

pub fn deck_status<H: Holding>(definition: &DeckDefinition, catalog: &DeckCatalog, holdings: &[H]) -> DeckStatus {
  let mut owners_by_key: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
  for holding in holdings.iter().filter(|h| belongs_to(*h, definition, catalog)) {
    owners_by_key
      .entry(normalize(holding.card_name()))
      .or_default()
      .insert(holding.owner().to_string());
  }

  let mut missing = Vec::new();
  let mut owners = BTreeMap::new();
  for card in &definition.cards {
    match owners_by_key.get(&normalize(card)) {
      Some(set) => {
        owners.insert(card.clone(), set.iter().cloned().collect());
      }
      None => missing.push(card.clone()),
    }
  }

  DeckStatus {
    deck: definition.name.clone(),
    complete: missing.is_empty(),
    owned: owners.len(),
    required: definition.cards.len(),
    missing,
    owners,
  }
}

pub fn catalog_status<H: Holding>(catalog: &DeckCatalog, holdings: &[H]) -> Vec<DeckStatus> {
  catalog.iter().map(|d| deck_status(d, catalog, holdings)).collect()
}

/// Picks one holding per required card, the first one in input order.
///
/// The returned list is in catalog order; its owners are the deck's contributors, with a user
/// listed once per card they gave.
pub fn select_contributions<H: Holding>(
  definition: &DeckDefinition,
  catalog: &DeckCatalog,
  holdings: &[H],
) -> DeckResult<Vec<Contribution>> {
  let mut picked = Vec::with_capacity(definition.cards.len());
  let mut missing = Vec::new();

  for card in &definition.cards {
    let key = normalize(card);
    let found = holdings
      .iter()
      .find(|h| normalize(h.card_name()) == key && belongs_to(*h, definition, catalog));
    match found {
      Some(h) => picked.push(Contribution {
        card_id: h.id(),
        card_name: card.clone(),
        owner: h.owner().to_string(),
      }),
      None => missing.push(card.clone()),
    }
  }

  if !missing.is_empty() {
    return Err(DeckError::Incomplete {
      deck: definition.name.clone(),
      missing,
    });
  }
  Ok(picked)
}
