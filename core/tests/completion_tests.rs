// tests/completion_tests.rs
mod common;

use common::*;
use deckvault::{catalog_status, deck_status, select_contributions, DeckError};

#[test]
fn test_seven_of_eight_lists_exactly_the_missing_card() {
  setup_tracing();
  let catalog = fixture_catalog();
  let emberfall = catalog.get("Emberfall").unwrap();
  let cards = Holdings::new()
    .add_all("kael", "Emberfall", &EMBERFALL, &["Slag Titan"])
    .build();

  let status = deck_status(emberfall, &catalog, &cards);
  assert!(!status.complete);
  assert_eq!(status.missing, vec!["Slag Titan".to_string()]);
  assert_eq!(status.owned, 7);
  assert_eq!(status.required, 8);
}

#[test]
fn test_duplicates_do_not_change_completion() {
  setup_tracing();
  let catalog = fixture_catalog();
  let emberfall = catalog.get("Emberfall").unwrap();
  let cards = Holdings::new()
    .add_all("kael", "Emberfall", &EMBERFALL, &[])
    .add("mira", "Emberfall", "Ash Warden")
    .add("kael", "Emberfall", "Ash Warden")
    .build();

  let status = deck_status(emberfall, &catalog, &cards);
  assert!(status.complete);
  assert!(status.missing.is_empty());
  assert_eq!(status.owned, 8);
  assert_eq!(
    status.owners.get("Ash Warden").unwrap(),
    &vec!["kael".to_string(), "mira".to_string()]
  );
}

#[test]
fn test_cards_count_through_prefix_labels_and_case() {
  setup_tracing();
  let catalog = fixture_catalog();
  let tidecaller = catalog.get("Tidecaller").unwrap();
  let cards = Holdings::new()
    .add_all("mira", "tidecaller (reprint)", &TIDECALLER, &["Undertow"])
    .add("oren", "TIDECALLER", "undertow")
    // Right name, wrong deck: does not count.
    .add("oren", "Emberfall", "Wavebreaker")
    .build();

  let status = deck_status(tidecaller, &catalog, &cards);
  assert!(status.complete);
  assert_eq!(status.owners.get("Undertow").unwrap(), &vec!["oren".to_string()]);
}

#[test]
fn test_catalog_status_reports_every_deck_in_order() {
  setup_tracing();
  let catalog = fixture_catalog();
  let cards = Holdings::new().add("kael", "Emberfall", "Kiln Priest").build();

  let statuses = catalog_status(&catalog, &cards);
  assert_eq!(statuses.len(), 2);
  assert_eq!(statuses[0].deck, "Emberfall");
  assert_eq!(statuses[0].owned, 1);
  assert_eq!(statuses[1].deck, "Tidecaller");
  assert_eq!(statuses[1].owned, 0);
  assert_eq!(statuses[1].missing.len(), 8);
}

#[test]
fn test_contributions_take_the_oldest_holding_per_card() {
  setup_tracing();
  let catalog = fixture_catalog();
  let emberfall = catalog.get("Emberfall").unwrap();
  let cards = Holdings::new()
    .add("mira", "Emberfall", "Ash Warden") // id 1, picked
    .add_all("kael", "Emberfall", &EMBERFALL, &[]) // ids 2..=9
    .build();

  let picked = select_contributions(emberfall, &catalog, &cards).unwrap();
  assert_eq!(picked.len(), 8);
  assert_eq!(picked[0].card_name, "Ash Warden");
  assert_eq!(picked[0].owner, "mira");
  assert_eq!(picked[0].card_id, 1);
  assert!(picked[1..].iter().all(|c| c.owner == "kael"));
}

#[test]
fn test_contributions_fail_for_incomplete_decks() {
  setup_tracing();
  let catalog = fixture_catalog();
  let emberfall = catalog.get("Emberfall").unwrap();
  let cards = Holdings::new()
    .add_all("kael", "Emberfall", &EMBERFALL, &["Molten Oath", "Smoke Oracle"])
    .build();

  match select_contributions(emberfall, &catalog, &cards) {
    Err(DeckError::Incomplete { deck, missing }) => {
      assert_eq!(deck, "Emberfall");
      assert_eq!(missing, vec!["Molten Oath".to_string(), "Smoke Oracle".to_string()]);
    }
    other => panic!("Expected DeckError::Incomplete, got {:?}", other),
  }
}
