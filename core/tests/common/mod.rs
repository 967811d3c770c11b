// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use deckvault::{DeckCatalog, DeckDefinition, Holding};
use tracing::Level;

// --- Fixture catalog ---
pub const EMBERFALL: [&str; 8] = [
  "Ash Warden",
  "Cinder Hound",
  "Kiln Priest",
  "Molten Oath",
  "Pyre Dancer",
  "Scorched Banner",
  "Slag Titan",
  "Smoke Oracle",
];

pub const TIDECALLER: [&str; 8] = [
  "Brine Witch",
  "Coral Sentinel",
  "Drowned Bell",
  "Kelp Strangler",
  "Pearl Oracle",
  "Salt Herald",
  "Undertow",
  "Wavebreaker",
];

pub fn fixture_catalog() -> DeckCatalog {
  DeckCatalog::new(vec![
    DeckDefinition {
      name: "Emberfall".to_string(),
      cards: EMBERFALL.iter().map(|s| s.to_string()).collect(),
    },
    DeckDefinition {
      name: "Tidecaller".to_string(),
      cards: TIDECALLER.iter().map(|s| s.to_string()).collect(),
    },
  ])
  .expect("fixture catalog is valid")
}

// --- Holdings ---
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCard {
  pub id: i64,
  pub name: String,
  pub owner: String,
  pub deck: String,
}

impl Holding for TestCard {
  fn id(&self) -> i64 {
    self.id
  }
  fn card_name(&self) -> &str {
    &self.name
  }
  fn owner(&self) -> &str {
    &self.owner
  }
  fn deck_label(&self) -> &str {
    &self.deck
  }
}

/// Builds holdings with ids assigned in insertion order.
#[derive(Default)]
pub struct Holdings {
  cards: Vec<TestCard>,
}

impl Holdings {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(mut self, owner: &str, deck: &str, name: &str) -> Self {
    let id = self.cards.len() as i64 + 1;
    self.cards.push(TestCard {
      id,
      name: name.to_string(),
      owner: owner.to_string(),
      deck: deck.to_string(),
    });
    self
  }

  /// Adds every card of `names` for `owner`, skipping the ones listed in `except`.
  pub fn add_all(mut self, owner: &str, deck: &str, names: &[&str], except: &[&str]) -> Self {
    for name in names.iter().filter(|n| !except.contains(*n)) {
      self = self.add(owner, deck, name);
    }
    self
  }

  pub fn build(self) -> Vec<TestCard> {
    self.cards
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
