// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use deckvault::{DeckCatalog, DeckDefinition};
use deckvault_server::config::{AppConfig, LogFormat};
use deckvault_server::errors::{AppError, Result as AppResult};
use deckvault_server::services::auth_service;
use deckvault_server::services::notify_service::{self, PushSink, PushTarget};
use deckvault_server::state::AppState;
use parking_lot::Mutex;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::Level;

pub const PASSWORD: &str = "hunter2-but-longer";

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

/// Sends a request through the app and returns the status and the JSON body.
macro_rules! send {
  ($app:expr, $req:expr) => {{
    let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
    let status = resp.status();
    let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
    (status, body)
  }};
}

/// Builds the service under test from an `AppState`.
macro_rules! test_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(deckvault_server::web::configure_app_routes),
    )
    .await
  };
}

// --- Push sink that records instead of calling out ---
#[derive(Default)]
pub struct RecordingSink {
  pub pushes: Mutex<Vec<(PushTarget, String)>>,
  pub fail: bool,
}

impl RecordingSink {
  pub fn failing() -> Self {
    Self {
      pushes: Mutex::new(Vec::new()),
      fail: true,
    }
  }

  pub fn count(&self) -> usize {
    self.pushes.lock().len()
  }
}

#[async_trait]
impl PushSink for RecordingSink {
  async fn push(&self, target: &PushTarget, _title: &str, message: &str) -> AppResult<()> {
    self.pushes.lock().push((target.clone(), message.to_string()));
    if self.fail {
      return Err(AppError::Webhook("endpoint responded with 500".to_string()));
    }
    Ok(())
  }
}

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

pub fn test_config() -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: "sqlite::memory:".to_string(),
    jwt_secret: "integration-test-secret-0123456789".to_string(),
    jwt_ttl_hours: 1,
    deck_catalog_path: PathBuf::from("unused.json"),
    guild_cut_percent: 10,
    admin_username: None,
    admin_password: None,
    update_check_url: None,
    update_check_interval_hours: 24,
    update_script: PathBuf::from("scripts/update.sh"),
    rollback_script: PathBuf::from("scripts/rollback.sh"),
    log_format: LogFormat::Pretty,
  }
}

/// Fresh in-memory database with migrations applied.
/// A single connection that never expires, since every connection to `:memory:` is its own database.
pub async fn test_state_with(sink: Arc<RecordingSink>) -> AppState {
  state_from_config(test_config(), sink).await
}

pub async fn state_from_config(config: AppConfig, sink: Arc<RecordingSink>) -> AppState {
  setup_tracing();
  let options = SqliteConnectOptions::from_str("sqlite::memory:")
    .expect("valid sqlite url")
    .foreign_keys(true);
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .idle_timeout(None)
    .max_lifetime(None)
    .connect_with(options)
    .await
    .expect("in-memory sqlite");
  deckvault_server::db::migrate(&pool).await.expect("migrations apply");
  let http_client = notify_service::build_http_client().expect("http client");
  AppState::new(pool, Arc::new(config), fixture_catalog(), sink, http_client).expect("state builds")
}

pub async fn test_state() -> (AppState, Arc<RecordingSink>) {
  let sink = Arc::new(RecordingSink::default());
  (test_state_with(sink.clone()).await, sink)
}

/// Inserts a user directly, bypassing registration.
pub async fn create_user(state: &AppState, username: &str, is_admin: bool, approved: bool) {
  let hash = auth_service::hash_password(PASSWORD).expect("hash");
  sqlx::query("INSERT INTO users (username, password_hash, is_admin, approved, created_at) VALUES (?, ?, ?, ?, ?)")
    .bind(username)
    .bind(hash)
    .bind(is_admin)
    .bind(approved)
    .bind(chrono::Utc::now())
    .execute(&state.db_pool)
    .await
    .expect("insert user");
}

pub fn bearer(state: &AppState, username: &str, is_admin: bool) -> (&'static str, String) {
  let token = state.tokens.issue(username, is_admin).expect("token");
  ("Authorization", format!("Bearer {}", token))
}

/// Inserts a card row directly and returns its id.
pub async fn add_card(state: &AppState, owner: &str, deck: &str, name: &str) -> i64 {
  sqlx::query_scalar::<_, i64>("INSERT INTO cards (name, username, deck, created_at) VALUES (?, ?, ?, ?) RETURNING id")
    .bind(name)
    .bind(owner)
    .bind(deck)
    .bind(chrono::Utc::now())
    .fetch_one(&state.db_pool)
    .await
    .expect("insert card")
}

pub async fn count(state: &AppState, sql: &str) -> i64 {
  sqlx::query_scalar::<_, i64>(sql)
    .fetch_one(&state.db_pool)
    .await
    .expect("count query")
}

// --- Tracing ---
static TRACING_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  once_cell::sync::Lazy::force(&TRACING_INIT);
}
