// deckvault/server/src/web/routes.rs

use actix_web::{error, web, HttpRequest, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{
  admin_handlers, announcement_handlers, auth_handlers, card_handlers, completed_deck_handlers, deck_handlers,
  deck_request_handlers, notification_handlers, system_handlers, transfer_handlers, webhook_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid JSON body: {}", err)).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid path parameter: {}", err)).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid query string: {}", err)).into()
}

// Called from main.rs and from the integration tests.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  // Extractor failures use the same {"error": ...} body as handler errors.
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error))
    .app_data(web::PathConfig::default().error_handler(path_error))
    .app_data(web::QueryConfig::default().error_handler(query_error));

  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      // Accounts
      .route("/register", web::post().to(auth_handlers::register_handler))
      .route("/login", web::post().to(auth_handlers::login_handler))
      .route("/me", web::get().to(auth_handlers::me_handler))
      .route("/me/password", web::put().to(auth_handlers::change_password_handler))
      // Cards; the literal segment is registered before the id route.
      .service(
        web::scope("/cards")
          .route("/mine", web::get().to(card_handlers::my_cards_handler))
          .service(
            web::resource("")
              .route(web::get().to(card_handlers::list_cards_handler))
              .route(web::post().to(card_handlers::create_card_handler)),
          )
          .service(
            web::resource("/{id}")
              .route(web::put().to(card_handlers::update_card_handler))
              .route(web::delete().to(card_handlers::delete_card_handler)),
          ),
      )
      // Deck status
      .service(
        web::scope("/decks")
          .route("", web::get().to(deck_handlers::list_decks_handler))
          .route("/catalog", web::get().to(deck_handlers::deck_catalog_handler))
          .route("/{name}", web::get().to(deck_handlers::get_deck_handler)),
      )
      .service(
        web::scope("/completed-decks")
          .service(
            web::resource("")
              .route(web::get().to(completed_deck_handlers::list_completed_decks_handler))
              .route(web::post().to(completed_deck_handlers::create_completed_deck_handler)),
          )
          .route(
            "/{id}/payouts",
            web::get().to(completed_deck_handlers::completed_deck_payouts_handler),
          )
          .service(
            web::resource("/{id}")
              .route(web::get().to(completed_deck_handlers::get_completed_deck_handler))
              .route(web::put().to(completed_deck_handlers::update_completed_deck_handler))
              .route(web::delete().to(completed_deck_handlers::delete_completed_deck_handler)),
          ),
      )
      .route(
        "/payouts/preview",
        web::post().to(completed_deck_handlers::payout_preview_handler),
      )
      .service(
        web::scope("/deck-requests")
          .service(
            web::resource("")
              .route(web::get().to(deck_request_handlers::list_deck_requests_handler))
              .route(web::post().to(deck_request_handlers::create_deck_request_handler)),
          )
          .service(
            web::resource("/{id}")
              .route(web::put().to(deck_request_handlers::update_deck_request_handler))
              .route(web::delete().to(deck_request_handlers::delete_deck_request_handler)),
          ),
      )
      .service(
        web::scope("/notifications")
          .service(
            web::resource("")
              .route(web::get().to(notification_handlers::list_notifications_handler))
              .route(web::delete().to(notification_handlers::delete_all_notifications_handler)),
          )
          .route("/read-all", web::put().to(notification_handlers::mark_all_read_handler))
          .route("/{id}/read", web::put().to(notification_handlers::mark_read_handler))
          .route("/{id}", web::delete().to(notification_handlers::delete_notification_handler)),
      )
      .service(
        web::scope("/announcements")
          .service(
            web::resource("")
              .route(web::get().to(announcement_handlers::list_announcements_handler))
              .route(web::post().to(announcement_handlers::create_announcement_handler)),
          )
          .service(
            web::resource("/{id}")
              .route(web::put().to(announcement_handlers::update_announcement_handler))
              .route(web::delete().to(announcement_handlers::delete_announcement_handler)),
          ),
      )
      .service(
        web::scope("/gotify")
          .service(
            web::resource("")
              .route(web::get().to(webhook_handlers::get_gotify_handler))
              .route(web::put().to(webhook_handlers::set_gotify_handler)),
          )
          .route("/test", web::post().to(webhook_handlers::test_gotify_handler)),
      )
      // Admin
      .service(
        web::scope("/admin")
          .service(
            web::resource("/discord-webhook")
              .route(web::get().to(webhook_handlers::get_discord_webhook_handler))
              .route(web::put().to(webhook_handlers::set_discord_webhook_handler)),
          )
          .route(
            "/discord-webhook/test",
            web::post().to(webhook_handlers::test_discord_webhook_handler),
          )
          .route("/users", web::get().to(admin_handlers::list_users_handler))
          .route("/users/{username}/approve", web::put().to(admin_handlers::approve_user_handler))
          .route("/users/{username}/admin", web::put().to(admin_handlers::set_admin_handler))
          .route("/users/{username}", web::delete().to(admin_handlers::delete_user_handler))
          .route("/activity", web::get().to(admin_handlers::activity_handler)),
      )
      // Export / import
      .route("/export/cards.csv", web::get().to(transfer_handlers::export_cards_csv_handler))
      .route("/export/json", web::get().to(transfer_handlers::export_json_handler))
      .route("/import/cards", web::post().to(transfer_handlers::import_cards_handler))
      .route("/import/cards.csv", web::post().to(transfer_handlers::import_cards_csv_handler))
      // Version and update orchestration
      .service(
        web::scope("/system")
          .route("/version", web::get().to(system_handlers::version_handler))
          .route("/check", web::post().to(system_handlers::check_handler))
          .route("/update", web::post().to(system_handlers::update_handler))
          .route("/rollback", web::post().to(system_handlers::rollback_handler))
          .route("/updates", web::get().to(system_handlers::list_updates_handler))
          .service(
            web::resource("/scheduled-updates")
              .route(web::get().to(system_handlers::list_scheduled_handler))
              .route(web::post().to(system_handlers::schedule_update_handler)),
          )
          .route(
            "/scheduled-updates/{id}",
            web::delete().to(system_handlers::cancel_scheduled_handler),
          ),
      ),
  );
}
