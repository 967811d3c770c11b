// deckvault/server/src/services/mod.rs

pub mod activity_service;
pub mod auth_service;
pub mod notify_service;
pub mod update_service;
