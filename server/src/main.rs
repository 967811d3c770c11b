// deckvault/server/src/main.rs

use deckvault::DeckCatalog;
use deckvault_server::config::{AppConfig, LogFormat};
use deckvault_server::services::notify_service::{build_http_client, HttpPushSink};
use deckvault_server::services::update_service;
use deckvault_server::state::AppState;
use deckvault_server::{db, web::configure_app_routes};

use actix_web::{web as actix_data, App, HttpServer}; // Renamed web to actix_data
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  // RUST_LOG overrides the default level.
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  match format {
    LogFormat::Pretty => builder.init(),
    LogFormat::Json => builder.json().init(),
  }
}

async fn run() -> anyhow::Result<()> {
  let app_config = Arc::new(AppConfig::from_env().context("Failed to load application configuration")?);

  let db_pool = db::connect(&app_config.database_url)
    .await
    .context("Failed to connect to the database")?;
  db::migrate(&db_pool).await.context("Failed to apply migrations")?;
  if let Some((username, password)) = app_config.admin_seed() {
    db::seed_admin(&db_pool, username, password)
      .await
      .context("Failed to seed the admin account")?;
  }

  let catalog = DeckCatalog::from_path(&app_config.deck_catalog_path)
    .with_context(|| format!("Failed to load deck catalog from {}", app_config.deck_catalog_path.display()))?;

  let http_client = build_http_client()?;
  let push_sink = Arc::new(HttpPushSink::new(http_client.clone()));
  let app_state = AppState::new(db_pool, app_config.clone(), catalog, push_sink, http_client)?;
  update_service::spawn_background_tasks(app_state.clone());

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await
  .context("HTTP server terminated with an error")?;

  Ok(())
}

#[actix_web::main]
async fn main() {
  // .env is read before the log format so LOG_FORMAT may live there too.
  dotenvy::dotenv().ok();
  let log_format = match LogFormat::from_env() {
    Ok(format) => format,
    Err(e) => {
      eprintln!("{}", e);
      std::process::exit(2);
    }
  };
  init_tracing(log_format);

  tracing::info!("Starting deckvault server...");
  if let Err(e) = run().await {
    tracing::error!(error = %format!("{:#}", e), "Server failed to start or stopped unexpectedly.");
    std::process::exit(1);
  }
}
