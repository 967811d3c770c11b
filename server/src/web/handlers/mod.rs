// deckvault/server/src/web/handlers/mod.rs

// Declare handler modules
pub mod admin_handlers;
pub mod announcement_handlers;
pub mod auth_handlers;
pub mod card_handlers;
pub mod completed_deck_handlers;
pub mod deck_handlers;
pub mod deck_request_handlers;
pub mod notification_handlers;
pub mod system_handlers;
pub mod transfer_handlers;
pub mod webhook_handlers; // Discord + Gotify push configuration
