// src/lib.rs

//! Deckvault: business rules for a guild's shared card collection.
//!
//! The crate does no I/O beyond loading a catalog file.
//! It covers:
//!  - A catalog of decks, each made of exactly eight named cards, resolved by deck-name prefix.
//!  - Completion checks over whatever card holdings the caller has loaded.
//!  - Picking which holdings are consumed when a complete deck is finalized.
//!  - Splitting a sale price between contributors and the guild.
//!  - Disposition rules for finalized decks (sold, fulfilled, unallocated).
//!  - The CSV format used to export and import cards.
//!  - Release version comparison for update checks.

pub mod card_csv;
pub mod catalog;
pub mod completion;
pub mod disposition;
pub mod error;
pub mod payout;
pub mod version;

// --- Re-exports for the Public API ---

pub use crate::card_csv::{parse_cards, write_cards, CardRecord};
pub use crate::catalog::{DeckCatalog, DeckDefinition, REQUIRED_CARDS_PER_DECK};
pub use crate::completion::{catalog_status, deck_status, select_contributions, Contribution, DeckStatus, Holding};
pub use crate::disposition::{Disposition, DispositionUpdate};
pub use crate::error::{DeckError, DeckResult};
pub use crate::payout::{PayoutPolicy, PayoutSplit};
pub use crate::version::{is_newer, Version};

/*
    Typical flow on the server side:
    1. Load a `DeckCatalog` once at startup (`DeckCatalog::from_path`).
    2. On every read, load card rows (types implementing `Holding`) and call
       `catalog_status` / `deck_status`. Nothing is cached.
    3. When an admin finalizes a deck, `select_contributions` decides which rows are consumed
       and who the contributors are.
    4. `DispositionUpdate::validate` gates the disposition fields and, for sold decks,
       `PayoutPolicy::split` produces the stored payouts.
*/
