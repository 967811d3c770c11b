// deckvault/server/src/models/mod.rs

//! Contains data structures representing database entities.

pub mod activity;
pub mod announcement;
pub mod card;
pub mod completed_deck;
pub mod deck_request;
pub mod notification;
pub mod system_update;
pub mod user;
pub mod webhook;

// Re-export the model structs for convenient access
pub use activity::Activity;
pub use announcement::Announcement;
pub use card::Card;
pub use completed_deck::CompletedDeck;
pub use deck_request::{DeckRequest, RequestStatus};
pub use notification::Notification;
pub use system_update::{ScheduledUpdate, SystemUpdate, UpdateKind};
pub use user::User;
pub use webhook::{DiscordWebhook, GotifyConfig};
