// deckvault/server/src/lib.rs

//! HTTP API for tracking cards, deck completion and what happens to finished decks.
//!
//! The binary in `main.rs` wires these modules together; the integration tests mount the same
//! routes against an in-memory database.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod services;
pub mod state;
pub mod web;
