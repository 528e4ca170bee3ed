// hertrade/src/web/routes.rs

use actix_web::{middleware::DefaultHeaders, web};
use tracing::warn;

use crate::errors::AppError;

use crate::web::handlers::{
  admin_handlers, auth_handlers, cart_handlers, checkout_handlers, order_handlers, product_handlers, sms_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// CORS headers the SMS gateway expects on every relay response, errors included.
fn sms_cors_headers() -> DefaultHeaders {
  DefaultHeaders::new()
    .add(("Access-Control-Allow-Origin", "*"))
    .add(("Access-Control-Allow-Headers", "authorization, x-client-info, apikey, content-type"))
}

/// Malformed or mistyped JSON bodies get the same `{"error": ...}` envelope as every other failure.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, req| {
    warn!(path = %req.path(), error = %err, "Rejected request body.");
    AppError::Validation("Invalid request body.".to_string()).into()
  })
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .app_data(json_config())
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/signup", web::post().to(auth_handlers::signup_handler))
          .route("/signin", web::post().to(auth_handlers::signin_handler))
          .route("/me", web::get().to(auth_handlers::me_handler)),
      )
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          // Registered before "/{product_id}" so "mine" is not parsed as an id.
          .route("/mine", web::get().to(product_handlers::my_products_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
      )
      .route(
        "/suppliers/{supplier_id}",
        web::get().to(product_handlers::supplier_storefront_handler),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::view_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/items/{item_id}", web::patch().to(cart_handlers::update_cart_item_handler))
          .route("/items/{item_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
      )
      .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::buyer_orders_handler))
          .route("/{order_id}/accept", web::post().to(order_handlers::accept_order_handler))
          .route("/{order_id}/ready", web::post().to(order_handlers::mark_ready_handler)),
      )
      .service(
        web::scope("/supplier")
          .route("/orders", web::get().to(order_handlers::supplier_orders_handler))
          .route("/stats", web::get().to(order_handlers::supplier_stats_handler)),
      )
      .service(
        web::scope("/admin")
          .route("/stats", web::get().to(admin_handlers::platform_stats_handler))
          .route("/verifications", web::get().to(admin_handlers::pending_verifications_handler))
          .route(
            "/profiles/{profile_id}/verification",
            web::post().to(admin_handlers::set_verification_handler),
          ),
      )
      .service(
        web::scope("/sms")
          .wrap(sms_cors_headers())
          .route("", web::method(actix_web::http::Method::OPTIONS).to(sms_handlers::sms_preflight_handler))
          .route("", web::post().to(sms_handlers::sms_relay_handler)),
      ),
  );
}
