// deckvault/server/src/state.rs
use crate::config::AppConfig;
use crate::services::auth_service::TokenKeys;
use crate::services::notify_service::{Notifier, PushSink};
use crate::services::update_service::UpdateStatus;
use deckvault::{DeckCatalog, PayoutPolicy};
use parking_lot::RwLock;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: SqlitePool,
  pub config: Arc<AppConfig>, // Share loaded config
  pub catalog: Arc<DeckCatalog>,
  pub payout_policy: PayoutPolicy,
  pub tokens: Arc<TokenKeys>,
  pub notifier: Notifier,
  pub http_client: reqwest::Client,
  /// Latest version check result, refreshed by the background checker.
  pub update_status: Arc<RwLock<UpdateStatus>>,
  /// Held for the duration of an update or rollback script.
  pub update_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
  pub fn new(
    db_pool: SqlitePool,
    config: Arc<AppConfig>,
    catalog: DeckCatalog,
    push_sink: Arc<dyn PushSink>,
    http_client: reqwest::Client,
  ) -> crate::errors::Result<Self> {
    let payout_policy = PayoutPolicy::new(config.guild_cut_percent)?;
    let tokens = Arc::new(TokenKeys::new(&config.jwt_secret, config.jwt_ttl_hours)?);
    let notifier = Notifier::new(db_pool.clone(), push_sink);
    Ok(Self {
      db_pool,
      config,
      catalog: Arc::new(catalog),
      payout_policy,
      tokens,
      notifier,
      http_client,
      update_status: Arc::new(RwLock::new(UpdateStatus::default())),
      update_lock: Arc::new(tokio::sync::Mutex::new(())),
    })
  }
}
