// hertrade/src/pipelines/contexts.rs

//! Context structs the workflow pipelines run over. Handlers receive them wrapped in
//! `flow::ContextData`; HTTP handlers read the results back out once a run finishes.

use crate::lifecycle::{TransitionActor, TransitionOutcome};
use crate::models::{Account, CartItem, CartLine, NewOrder, Order, OrderStatus, Profile, Role, Session};
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct SignupCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub name: String,
  pub phone: String,
  pub role: Role,
  pub has_smartphone: bool,
  pub bio: Option<String>,
  pub created_profile: Option<Profile>,
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub account: Option<Account>,
  pub profile: Option<Profile>,
  pub session: Option<Session>,
}

#[derive(Debug, Clone)]
pub enum AddToCartOutcome {
  Added(CartItem),
  /// The buyer already had this product in the cart. Nothing was written.
  AlreadyInCart,
}

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub outcome: Option<AddToCartOutcome>,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub delivery_address: String,
  pub cart_lines: Vec<CartLine>,
  pub priced_orders: Vec<NewOrder>,
  pub created_orders: Vec<Order>,
}

#[derive(Clone)]
pub struct OrderTransitionCtxData {
  pub app_state: AppState,
  pub order_id: Uuid,
  pub actor: TransitionActor,
  /// Profile acting on the order. Supplier writes are restricted to this supplier's orders.
  pub actor_profile_id: Uuid,
  pub from: OrderStatus,
  pub to: OrderStatus,
  pub order: Option<Order>,
  pub outcome: Option<TransitionOutcome>,
  /// Set when the order was just moved to `ready` and handed to delivery.
  pub delivery_reference: Option<String>,
}

impl OrderTransitionCtxData {
  pub fn new(app_state: AppState, order_id: Uuid, actor: TransitionActor, actor_profile_id: Uuid, from: OrderStatus, to: OrderStatus) -> Self {
    Self {
      app_state,
      order_id,
      actor,
      actor_profile_id,
      from,
      to,
      order: None,
      outcome: None,
      delivery_reference: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmsRelayOutcome {
  OrdersMarkedReady { count: usize },
  NoPendingOrders,
}

#[derive(Clone)]
pub struct SmsRelayCtxData {
  pub app_state: AppState,
  pub phone: String,
  pub keyword: String,
  /// Value of the `apikey` header, if any.
  pub provided_secret: Option<String>,
  pub supplier: Option<Profile>,
  pub updated_orders: Vec<Order>,
  pub outcome: Option<SmsRelayOutcome>,
  pub delivery_reference: Option<String>,
}

impl SmsRelayCtxData {
  pub fn new(app_state: AppState, phone: String, keyword: String, provided_secret: Option<String>) -> Self {
    Self {
      app_state,
      phone,
      keyword,
      provided_secret,
      supplier: None,
      updated_orders: Vec::new(),
      outcome: None,
      delivery_reference: None,
    }
  }
}
