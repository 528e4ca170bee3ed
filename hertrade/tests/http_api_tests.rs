// tests/http_api_tests.rs
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::*;
use hertrade::config::AppConfig;
use hertrade::models::{OrderStatus, Role};
use hertrade::store::Store;
use hertrade::web::configure_app_routes;
use serde_json::{json, Value};

macro_rules! init_app {
  ($app:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($app.state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn bearer(token: &str) -> (header::HeaderName, String) {
  (header::AUTHORIZATION, format!("Bearer {}", token))
}

#[actix_rt::test]
async fn health_check_responds_ok() {
  let app = TestApp::new();
  let service = init_app!(app);

  let resp = test::call_service(&service, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn sms_preflight_carries_cors_headers() {
  let app = TestApp::new();
  let service = init_app!(app);

  let req = test::TestRequest::default()
    .method(actix_web::http::Method::OPTIONS)
    .uri("/api/v1/sms")
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
  assert!(resp
    .headers()
    .get("access-control-allow-headers")
    .unwrap()
    .to_str()
    .unwrap()
    .contains("apikey"));
}

#[actix_rt::test]
async fn sms_relay_over_http() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000040").await;
  let product = app.seed_product(supplier.id, "Agelgil", 40000).await;
  app.store.insert_cart_item(client.id, product.id, 1).await.unwrap();
  let orders = app
    .store
    .commit_checkout(
      client.id,
      hertrade::pricing::price_orders(
        client.id,
        &app.store.cart_lines(client.id).await.unwrap(),
        DELIVERY_FEE_CENTS,
        "Sarbet",
      ),
      Vec::new(),
    )
    .await
    .unwrap();
  let service = init_app!(app);

  // Legacy gateway field names: "message" for the keyword, plus an ignored orderId.
  let req = test::TestRequest::post()
    .uri("/api/v1/sms")
    .set_json(json!({ "phone": "+251900000040", "message": "A", "orderId": "ord-1" }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["success"], true);
  assert_eq!(body["updated_count"], 1);
  assert!(body["delivery_reference"].as_str().unwrap().starts_with("mock_delivery_"));
  assert_eq!(
    app.store.find_order(orders[0].id).await.unwrap().unwrap().status,
    OrderStatus::Ready
  );

  let req = test::TestRequest::post()
    .uri("/api/v1/sms")
    .set_json(json!({ "phone": "+251900000040", "keyword": "a" }))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["message"], "No pending orders");
  assert_eq!(body["updated_count"], 0);
}

#[actix_rt::test]
async fn sms_relay_errors_map_to_status_codes() {
  let app = TestApp::new();
  app.seed_sms_supplier("+251900000041").await;
  let service = init_app!(app);

  let req = test::TestRequest::post()
    .uri("/api/v1/sms")
    .set_json(json!({ "phone": "+251900000041", "keyword": "ok" }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Invalid keyword. Send \"a\" to confirm order is ready.");

  let req = test::TestRequest::post()
    .uri("/api/v1/sms")
    .set_json(json!({ "phone": "+251900009999", "keyword": "a" }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Supplier not found");
}

#[actix_rt::test]
async fn malformed_relay_body_gets_json_error_and_cors() {
  let app = TestApp::new();
  let service = init_app!(app);

  let bodies = [
    test::TestRequest::post()
      .uri("/api/v1/sms")
      .set_json(json!({ "phone": 251900000001_u64, "keyword": "a" })),
    test::TestRequest::post()
      .uri("/api/v1/sms")
      .insert_header((header::CONTENT_TYPE, "application/json"))
      .set_payload("{\"phone\": "),
  ];
  for req in bodies {
    let resp = test::call_service(&service, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
    assert!(resp
      .headers()
      .get(header::CONTENT_TYPE)
      .unwrap()
      .to_str()
      .unwrap()
      .starts_with("application/json"));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid request body.");
  }
}

#[actix_rt::test]
async fn sms_relay_requires_apikey_when_configured() {
  let app = TestApp::with_config(AppConfig {
    sms_relay_secret: Some("gateway-key".to_string()),
    ..test_config()
  });
  app.seed_sms_supplier("+251900000042").await;
  let service = init_app!(app);

  let req = test::TestRequest::post()
    .uri("/api/v1/sms")
    .set_json(json!({ "phone": "+251900000042", "keyword": "a" }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::post()
    .uri("/api/v1/sms")
    .insert_header(("apikey", "gateway-key"))
    .set_json(json!({ "phone": "+251900000042", "keyword": "a" }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn signup_signin_and_me() {
  let app = TestApp::new();
  let service = init_app!(app);

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signup")
    .set_json(json!({
      "email": "tigist@hertrade.test",
      "password": "injera-and-wot",
      "name": "Tigist",
      "phone": "+251911223344",
      "role": "supplier",
      "has_smartphone": false
    }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["profile"]["role"], "supplier");
  assert_eq!(body["profile"]["is_verified"], false);

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signin")
    .set_json(json!({ "email": "tigist@hertrade.test", "password": "wrong-password" }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::post()
    .uri("/api/v1/auth/signin")
    .set_json(json!({ "email": "tigist@hertrade.test", "password": "injera-and-wot" }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  let token = body["token"].as_str().unwrap().to_string();

  let req = test::TestRequest::get()
    .uri("/api/v1/auth/me")
    .insert_header(bearer(&token))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["name"], "Tigist");
  assert_eq!(body["has_smartphone"], false);
}

#[actix_rt::test]
async fn signup_rejects_admin_role_and_duplicate_email() {
  let app = TestApp::new();
  let service = init_app!(app);
  let payload = |role: &str| {
    json!({
      "email": "selam@hertrade.test",
      "password": "long-enough-pass",
      "name": "Selam",
      "phone": "+251911000777",
      "role": role
    })
  };

  let req = test::TestRequest::post().uri("/api/v1/auth/signup").set_json(payload("admin")).to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post().uri("/api/v1/auth/signup").set_json(payload("client")).to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::CREATED);

  let req = test::TestRequest::post().uri("/api/v1/auth/signup").set_json(payload("client")).to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn protected_routes_require_session_and_role() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let token = app.token_for(&client).await;
  let service = init_app!(app);

  let req = test::TestRequest::get().uri("/api/v1/auth/me").to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::get()
    .uri("/api/v1/cart")
    .insert_header(bearer("not-a-real-token"))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::post()
    .uri("/api/v1/products")
    .insert_header(bearer(&token))
    .set_json(json!({ "name": "Scarf", "price_cents": 1000, "stock": 1, "category": "Textiles" }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::get()
    .uri("/api/v1/admin/stats")
    .insert_header(bearer(&token))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn marketplace_cart_checkout_and_supplier_flow() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_profile(Role::Supplier, "+251900000043", true).await;
  let client_token = app.token_for(&client).await;
  let supplier_token = app.token_for(&supplier).await;
  let service = init_app!(app);

  let req = test::TestRequest::post()
    .uri("/api/v1/products")
    .insert_header(bearer(&supplier_token))
    .set_json(json!({ "name": "Cotton gabi", "price_cents": 10000, "stock": 4, "category": "Textiles" }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let product_id = body["product"]["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::get().uri("/api/v1/products?q=GABI").to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["products"].as_array().unwrap().len(), 1);
  assert_eq!(body["products"][0]["supplier_name"], "Test supplier");

  let add = || {
    test::TestRequest::post()
      .uri("/api/v1/cart/items")
      .insert_header(bearer(&client_token))
      .set_json(json!({ "product_id": product_id, "quantity": 2 }))
      .to_request()
  };
  assert_eq!(test::call_service(&service, add()).await.status(), StatusCode::CREATED);
  let resp = test::call_service(&service, add()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Item already in cart");

  let req = test::TestRequest::get()
    .uri("/api/v1/cart")
    .insert_header(bearer(&client_token))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["totals"]["total_cents"], 25000);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(bearer(&client_token))
    .set_json(json!({ "delivery_address": "CMC, Addis Ababa" }))
    .to_request();
  let resp = test::call_service(&service, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let order_id = body["orders"][0]["id"].as_str().unwrap().to_string();
  assert_eq!(body["orders"][0]["total_amount_cents"], 25000);

  let accept = || {
    test::TestRequest::post()
      .uri(&format!("/api/v1/orders/{}/accept", order_id))
      .insert_header(bearer(&supplier_token))
      .to_request()
  };
  let body: Value = test::read_body_json(test::call_service(&service, accept()).await).await;
  assert_eq!(body["applied"], true);
  assert_eq!(body["status"], "in_progress");

  let resp = test::call_service(&service, accept()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["applied"], false);
  assert_eq!(body["status"], "in_progress");
  assert!(body["delivery_reference"].is_null());

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/ready", order_id))
    .insert_header(bearer(&supplier_token))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["applied"], true);
  assert_eq!(body["status"], "ready");
  assert!(body["delivery_reference"].as_str().unwrap().starts_with("mock_delivery_"));

  let req = test::TestRequest::get()
    .uri("/api/v1/supplier/orders")
    .insert_header(bearer(&supplier_token))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["orders"][0]["client_name"], "Test client");

  let req = test::TestRequest::get()
    .uri("/api/v1/supplier/stats")
    .insert_header(bearer(&supplier_token))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["active_orders"], 1);
  assert_eq!(body["total_earnings_cents"], 20000);
}

#[actix_rt::test]
async fn admin_verifies_supplier() {
  let app = TestApp::new();
  let admin = app.seed_profile(Role::Admin, "+251900000044", true).await;
  let supplier = app.seed_sms_supplier("+251900000045").await;
  let admin_token = app.token_for(&admin).await;
  let service = init_app!(app);

  let req = test::TestRequest::get()
    .uri("/api/v1/admin/verifications")
    .insert_header(bearer(&admin_token))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["profiles"].as_array().unwrap().len(), 1);

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/admin/profiles/{}/verification", supplier.id))
    .insert_header(bearer(&admin_token))
    .set_json(json!({ "verified": true }))
    .to_request();
  assert_eq!(test::call_service(&service, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::get()
    .uri("/api/v1/admin/stats")
    .insert_header(bearer(&admin_token))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&service, req).await).await;
  assert_eq!(body["verified_suppliers"], 1);
  assert_eq!(body["pending_verifications"], 0);
}
