// hertrade/src/store/mod.rs

//! Storage collaborator behind every workflow.
//!
//! Implementations must honour three guarantees:
//! - at most one cart item per `(user_id, product_id)`; a duplicate insert is a no-op returning `None`
//! - `commit_checkout` inserts every order and removes the checked-out cart items, or changes nothing;
//!   if any listed cart item is already gone (or not the buyer's) it fails with `CART_CHANGED_MESSAGE`
//! - status writes are compare-and-set on the expected current status (and the owning supplier when
//!   one is given), evaluated atomically by the store

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::errors::Result;
use crate::models::{
  Account, BuyerOrderView, CartItem, CartLine, NewAccount, NewOrder, NewProduct, Order, OrderStatus, Product,
  ProductFilter, ProductListing, Profile, Session, SupplierOrderView,
};
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// Returned when a checkout's cart items were already consumed, e.g. by a concurrent checkout.
pub const CART_CHANGED_MESSAGE: &str = "Your cart changed; please review it and try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SupplierStats {
  pub total_products: i64,
  /// Orders neither delivered nor cancelled.
  pub active_orders: i64,
  /// Σ line amount over orders that were not cancelled.
  pub total_earnings_cents: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlatformStats {
  pub total_profiles: i64,
  pub verified_suppliers: i64,
  pub total_orders: i64,
  pub pending_verifications: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
  // --- accounts, profiles, sessions ---

  /// Creates the account and its profile together. A taken email is a `Validation` error.
  async fn create_account_with_profile(&self, new: NewAccount) -> Result<Profile>;
  async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;
  async fn find_profile_by_account(&self, account_id: Uuid) -> Result<Option<Profile>>;
  async fn find_profile(&self, profile_id: Uuid) -> Result<Option<Profile>>;
  /// Supplier without a smartphone registered under `phone`.
  async fn find_sms_supplier_by_phone(&self, phone: &str) -> Result<Option<Profile>>;
  async fn insert_session(&self, session: Session) -> Result<()>;
  async fn find_session(&self, token: &str) -> Result<Option<Session>>;

  // --- products ---

  async fn insert_product(&self, new: NewProduct) -> Result<Product>;
  async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>>;
  async fn list_marketplace(&self, filter: &ProductFilter) -> Result<Vec<ProductListing>>;
  async fn list_supplier_products(&self, supplier_id: Uuid, active_only: bool) -> Result<Vec<Product>>;

  // --- cart ---

  /// `None` when the buyer already has this product in the cart.
  async fn insert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Option<CartItem>>;
  /// `None` when the item does not exist or belongs to someone else.
  async fn update_cart_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>>;
  async fn delete_cart_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool>;
  /// Cart items joined with product price and supplier, oldest first.
  async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>>;

  // --- checkout ---

  async fn commit_checkout(&self, user_id: Uuid, orders: Vec<NewOrder>, cart_item_ids: Vec<Uuid>) -> Result<Vec<Order>>;

  // --- orders ---

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>>;
  /// `UPDATE … WHERE id = order_id AND status = expected [AND supplier_id = supplier]`.
  /// `None` when the predicate matched nothing.
  async fn transition_order(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
    supplier_id: Option<Uuid>,
  ) -> Result<Option<Order>>;
  /// Moves every order of `supplier_id` whose status is in `from` to `next` in one write and
  /// returns the rows that changed.
  async fn bulk_transition_supplier_orders(
    &self,
    supplier_id: Uuid,
    from: &[OrderStatus],
    next: OrderStatus,
  ) -> Result<Vec<Order>>;
  async fn list_buyer_orders(&self, user_id: Uuid) -> Result<Vec<BuyerOrderView>>;
  async fn list_supplier_orders(&self, supplier_id: Uuid) -> Result<Vec<SupplierOrderView>>;
  async fn supplier_stats(&self, supplier_id: Uuid) -> Result<SupplierStats>;

  // --- admin ---

  async fn platform_stats(&self) -> Result<PlatformStats>;
  /// Unverified profiles other than admins, newest first.
  async fn pending_verifications(&self) -> Result<Vec<Profile>>;
  async fn set_profile_verified(&self, profile_id: Uuid, verified: bool) -> Result<Option<Profile>>;
}
