// tests/order_lifecycle_tests.rs
mod common;

use common::*;
use flow::ContextData;
use hertrade::config::AppConfig;
use hertrade::errors::AppError;
use hertrade::lifecycle::{TransitionActor, TransitionOutcome};
use hertrade::models::{NewOrder, Order, OrderStatus, Profile};
use hertrade::pipelines::contexts::{OrderTransitionCtxData, SmsRelayCtxData, SmsRelayOutcome};
use hertrade::store::Store;
use serial_test::serial;
use uuid::Uuid;

async fn place_orders(app: &TestApp, client: &Profile, supplier: &Profile, count: usize) -> Vec<Order> {
  let orders = (0..count)
    .map(|i| NewOrder {
      product_id: Uuid::new_v4(),
      user_id: client.id,
      supplier_id: supplier.id,
      amount_cents: 10000 * (i as i64 + 1),
      delivery_fee_cents: 0,
      total_amount_cents: 10000 * (i as i64 + 1),
      delivery_address: "Kazanchis".to_string(),
    })
    .collect();
  app.store.commit_checkout(client.id, orders, Vec::new()).await.unwrap()
}

async fn supplier_transition(
  app: &TestApp,
  supplier_id: Uuid,
  order_id: Uuid,
  from: OrderStatus,
  to: OrderStatus,
) -> Result<TransitionOutcome, AppError> {
  let ctx = ContextData::new(OrderTransitionCtxData::new(
    app.state.clone(),
    order_id,
    TransitionActor::Supplier,
    supplier_id,
    from,
    to,
  ));
  app.state.flow.run(ctx.clone()).await?;
  let outcome = ctx.read().outcome.clone();
  Ok(outcome.expect("transition sets an outcome"))
}

async fn sms_relay(app: &TestApp, phone: &str, keyword: &str, secret: Option<&str>) -> Result<SmsRelayOutcome, AppError> {
  let ctx = ContextData::new(SmsRelayCtxData::new(
    app.state.clone(),
    phone.to_string(),
    keyword.to_string(),
    secret.map(str::to_string),
  ));
  app.state.flow.run(ctx.clone()).await?;
  let outcome = ctx.read().outcome.clone();
  Ok(outcome.expect("relay sets an outcome"))
}

async fn status_of(app: &TestApp, order_id: Uuid) -> OrderStatus {
  app.store.find_order(order_id).await.unwrap().unwrap().status
}

#[tokio::test]
async fn supplier_accepts_then_marks_ready() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000020").await;
  let order = place_orders(&app, &client, &supplier, 1).await.remove(0);

  let outcome = supplier_transition(&app, supplier.id, order.id, OrderStatus::Pending, OrderStatus::InProgress)
    .await
    .unwrap();
  assert!(outcome.is_applied());
  let outcome = supplier_transition(&app, supplier.id, order.id, OrderStatus::InProgress, OrderStatus::Ready)
    .await
    .unwrap();
  assert!(outcome.is_applied());
  assert_eq!(status_of(&app, order.id).await, OrderStatus::Ready);
}

#[tokio::test]
async fn only_a_fresh_ready_hands_off_to_delivery() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000032").await;
  let order = place_orders(&app, &client, &supplier, 1).await.remove(0);

  let run = |from: OrderStatus, to: OrderStatus| {
    let ctx = ContextData::new(OrderTransitionCtxData::new(
      app.state.clone(),
      order.id,
      TransitionActor::Supplier,
      supplier.id,
      from,
      to,
    ));
    let flow = app.state.flow.clone();
    async move {
      flow.run(ctx.clone()).await.unwrap();
      let guard = ctx.read();
      (guard.outcome.clone().unwrap(), guard.delivery_reference.clone())
    }
  };

  let (outcome, reference) = run(OrderStatus::Pending, OrderStatus::InProgress).await;
  assert!(outcome.is_applied());
  assert!(reference.is_none());

  let (outcome, reference) = run(OrderStatus::InProgress, OrderStatus::Ready).await;
  assert!(outcome.is_applied());
  assert!(reference.is_some_and(|r| r.starts_with("mock_delivery_")));

  // A stale repeat must not dispatch a second courier.
  let (outcome, reference) = run(OrderStatus::InProgress, OrderStatus::Ready).await;
  assert!(!outcome.is_applied());
  assert!(reference.is_none());
}

#[tokio::test]
async fn repeated_accept_is_stale_not_an_error() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000021").await;
  let order = place_orders(&app, &client, &supplier, 1).await.remove(0);

  supplier_transition(&app, supplier.id, order.id, OrderStatus::Pending, OrderStatus::InProgress)
    .await
    .unwrap();
  let outcome = supplier_transition(&app, supplier.id, order.id, OrderStatus::Pending, OrderStatus::InProgress)
    .await
    .unwrap();
  assert!(matches!(outcome, TransitionOutcome::Stale { current: Some(OrderStatus::InProgress) }));
}

#[tokio::test]
async fn supplier_cannot_skip_or_touch_others_orders() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000022").await;
  let rival = app.seed_sms_supplier("+251900000023").await;
  let order = place_orders(&app, &client, &supplier, 1).await.remove(0);

  let err = supplier_transition(&app, supplier.id, order.id, OrderStatus::Pending, OrderStatus::Ready)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));

  let err = supplier_transition(&app, rival.id, order.id, OrderStatus::Pending, OrderStatus::InProgress)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::Forbidden(_)));

  let err = supplier_transition(&app, supplier.id, Uuid::new_v4(), OrderStatus::Pending, OrderStatus::InProgress)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)));
  assert_eq!(status_of(&app, order.id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn sms_keyword_marks_every_open_order_ready() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000024").await;
  let orders = place_orders(&app, &client, &supplier, 2).await;

  let outcome = sms_relay(&app, "+251900000024", " A ", None).await.unwrap();
  assert_eq!(outcome, SmsRelayOutcome::OrdersMarkedReady { count: 2 });
  for order in &orders {
    assert_eq!(status_of(&app, order.id).await, OrderStatus::Ready);
  }

  // A replayed message finds nothing left to move.
  let outcome = sms_relay(&app, "+251900000024", "a", None).await.unwrap();
  assert_eq!(outcome, SmsRelayOutcome::NoPendingOrders);
}

#[tokio::test]
async fn sms_relay_leaves_other_suppliers_and_finished_orders_alone() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000025").await;
  let other = app.seed_sms_supplier("+251900000026").await;
  let mine = place_orders(&app, &client, &supplier, 2).await;
  let theirs = place_orders(&app, &client, &other, 1).await.remove(0);

  supplier_transition(&app, supplier.id, mine[0].id, OrderStatus::Pending, OrderStatus::InProgress)
    .await
    .unwrap();
  supplier_transition(&app, supplier.id, mine[0].id, OrderStatus::InProgress, OrderStatus::Ready)
    .await
    .unwrap();

  let outcome = sms_relay(&app, "+251900000025", "a", None).await.unwrap();
  assert_eq!(outcome, SmsRelayOutcome::OrdersMarkedReady { count: 1 });
  assert_eq!(status_of(&app, mine[1].id).await, OrderStatus::Ready);
  assert_eq!(status_of(&app, theirs.id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn sms_relay_rejects_bad_keyword_and_unknown_phone() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000027").await;
  let order = place_orders(&app, &client, &supplier, 1).await.remove(0);

  let err = sms_relay(&app, "+251900000027", "yes", None).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(ref m) if m.contains("Send \"a\"")));

  let err = sms_relay(&app, "+251999999999", "a", None).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(ref m) if m == "Supplier not found"));

  // Suppliers with a smartphone use the web buttons, not the relay.
  app.seed_profile(hertrade::models::Role::Supplier, "+251900000028", true).await;
  let err = sms_relay(&app, "+251900000028", "a", None).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)));

  assert_eq!(status_of(&app, order.id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn sms_relay_checks_configured_secret() {
  let app = TestApp::with_config(AppConfig {
    sms_relay_secret: Some("gateway-key".to_string()),
    ..test_config()
  });
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000029").await;
  place_orders(&app, &client, &supplier, 1).await;

  for secret in [None, Some("wrong")] {
    let err = sms_relay(&app, "+251900000029", "a", secret).await.unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
  }
  let outcome = sms_relay(&app, "+251900000029", "a", Some("gateway-key")).await.unwrap();
  assert_eq!(outcome, SmsRelayOutcome::OrdersMarkedReady { count: 1 });
}

#[tokio::test]
#[serial]
async fn racing_web_and_sms_ready_apply_exactly_once() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000030").await;

  for _ in 0..20 {
    let order = place_orders(&app, &client, &supplier, 1).await.remove(0);
    supplier_transition(&app, supplier.id, order.id, OrderStatus::Pending, OrderStatus::InProgress)
      .await
      .unwrap();

    let (web, sms) = tokio::join!(
      supplier_transition(&app, supplier.id, order.id, OrderStatus::InProgress, OrderStatus::Ready),
      sms_relay(&app, "+251900000030", "a", None),
    );
    let web_applied = web.unwrap().is_applied();
    let sms_applied = matches!(sms.unwrap(), SmsRelayOutcome::OrdersMarkedReady { count: 1 });
    assert!(web_applied ^ sms_applied, "exactly one actor must win the transition");
    assert_eq!(status_of(&app, order.id).await, OrderStatus::Ready);
  }
}

#[tokio::test]
async fn supplier_stats_count_active_orders_and_earnings() {
  let app = TestApp::new();
  let client = app.seed_client().await;
  let supplier = app.seed_sms_supplier("+251900000031").await;
  app.seed_product(supplier.id, "Habesha kemis", 90000).await;
  let orders = place_orders(&app, &client, &supplier, 3).await;

  app
    .store
    .transition_order(orders[0].id, OrderStatus::Pending, OrderStatus::Cancelled, None)
    .await
    .unwrap();

  let stats = app.store.supplier_stats(supplier.id).await.unwrap();
  assert_eq!(stats.total_products, 1);
  assert_eq!(stats.active_orders, 2);
  assert_eq!(stats.total_earnings_cents, 20000 + 30000);
}
