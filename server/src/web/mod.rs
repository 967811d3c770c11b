// deckvault/server/src/web/mod.rs

// Declare child modules
pub mod extractors;
pub mod handlers;
pub mod routes;

// Re-exported so main.rs and the integration tests can mount the API.
pub use routes::configure_app_routes;
