// hertrade/src/store/memory.rs

//! In-process store for local runs and tests.
//!
//! All tables sit behind one `parking_lot::Mutex`, so every method observes and mutates a
//! consistent snapshot, which is what gives compare-and-set its meaning here.

use super::{PlatformStats, Store, SupplierStats, CART_CHANGED_MESSAGE};
use crate::errors::{AppError, Result};
use crate::models::{
  Account, BuyerOrderView, CartItem, CartLine, NewAccount, NewOrder, NewProduct, Order, OrderStatus, Product,
  ProductFilter, ProductListing, ProductStatus, Profile, Role, Session, SupplierOrderView,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  accounts: HashMap<Uuid, Account>,
  profiles: HashMap<Uuid, Profile>,
  sessions: HashMap<String, Session>,
  products: HashMap<Uuid, Product>,
  cart_items: HashMap<Uuid, CartItem>,
  orders: HashMap<Uuid, Order>,
}

impl Tables {
  fn profile_name(&self, profile_id: Uuid) -> String {
    self.profiles.get(&profile_id).map(|p| p.name.clone()).unwrap_or_default()
  }

  fn product_name(&self, product_id: Uuid) -> String {
    self.products.get(&product_id).map(|p| p.name.clone()).unwrap_or_default()
  }
}

#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
  /// 1-based index of the order insert that should fail during the next checkout.
  fail_order_insert_at: Mutex<Option<usize>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes the `n`-th order insert of the next checkout fail with a store error.
  pub fn fail_nth_order_insert(&self, n: usize) {
    *self.fail_order_insert_at.lock() = Some(n);
  }

  pub fn order_count(&self) -> usize {
    self.tables.lock().orders.len()
  }

  pub fn cart_item_count(&self, user_id: Uuid) -> usize {
    self.tables.lock().cart_items.values().filter(|c| c.user_id == user_id).count()
  }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid)) {
  rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
  #[instrument(name = "memory_store::create_account_with_profile", skip(self, new), fields(email = %new.email))]
  async fn create_account_with_profile(&self, new: NewAccount) -> Result<Profile> {
    let mut tables = self.tables.lock();
    if tables.accounts.values().any(|a| a.email.eq_ignore_ascii_case(&new.email)) {
      return Err(AppError::Validation("An account with this email already exists.".to_string()));
    }
    let now = Utc::now();
    let account = Account {
      id: Uuid::new_v4(),
      email: new.email,
      password_hash: new.password_hash,
      created_at: now,
    };
    let profile = Profile {
      id: Uuid::new_v4(),
      account_id: account.id,
      name: new.name,
      phone: new.phone,
      role: new.role,
      is_verified: false,
      has_smartphone: new.has_smartphone,
      bio: new.bio,
      avatar_url: None,
      created_at: now,
    };
    tables.accounts.insert(account.id, account);
    tables.profiles.insert(profile.id, profile.clone());
    Ok(profile)
  }

  async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
    let tables = self.tables.lock();
    Ok(tables.accounts.values().find(|a| a.email.eq_ignore_ascii_case(email)).cloned())
  }

  async fn find_profile_by_account(&self, account_id: Uuid) -> Result<Option<Profile>> {
    let tables = self.tables.lock();
    Ok(tables.profiles.values().find(|p| p.account_id == account_id).cloned())
  }

  async fn find_profile(&self, profile_id: Uuid) -> Result<Option<Profile>> {
    Ok(self.tables.lock().profiles.get(&profile_id).cloned())
  }

  async fn find_sms_supplier_by_phone(&self, phone: &str) -> Result<Option<Profile>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .profiles
        .values()
        .find(|p| p.phone == phone && p.role == Role::Supplier && !p.has_smartphone)
        .cloned(),
    )
  }

  async fn insert_session(&self, session: Session) -> Result<()> {
    self.tables.lock().sessions.insert(session.token.clone(), session);
    Ok(())
  }

  async fn find_session(&self, token: &str) -> Result<Option<Session>> {
    Ok(self.tables.lock().sessions.get(token).cloned())
  }

  async fn insert_product(&self, new: NewProduct) -> Result<Product> {
    let product = Product {
      id: Uuid::new_v4(),
      supplier_id: new.supplier_id,
      name: new.name,
      description: new.description,
      price_cents: new.price_cents,
      stock: new.stock,
      category: new.category,
      status: ProductStatus::Active,
      image: new.image,
      created_at: Utc::now(),
    };
    self.tables.lock().products.insert(product.id, product.clone());
    Ok(product)
  }

  async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.lock().products.get(&product_id).cloned())
  }

  async fn list_marketplace(&self, filter: &ProductFilter) -> Result<Vec<ProductListing>> {
    let tables = self.tables.lock();
    let mut listings: Vec<ProductListing> = tables
      .products
      .values()
      .filter(|p| p.status == ProductStatus::Active)
      .filter_map(|p| {
        let supplier = tables.profiles.get(&p.supplier_id)?;
        Some(ProductListing {
          product: p.clone(),
          supplier_name: supplier.name.clone(),
          supplier_verified: supplier.is_verified,
        })
      })
      .filter(|l| filter.matches(l))
      .collect();
    newest_first(&mut listings, |l| (l.product.created_at, l.product.id));
    Ok(listings)
  }

  async fn list_supplier_products(&self, supplier_id: Uuid, active_only: bool) -> Result<Vec<Product>> {
    let tables = self.tables.lock();
    let mut products: Vec<Product> = tables
      .products
      .values()
      .filter(|p| p.supplier_id == supplier_id && (!active_only || p.status == ProductStatus::Active))
      .cloned()
      .collect();
    newest_first(&mut products, |p| (p.created_at, p.id));
    Ok(products)
  }

  async fn insert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let mut tables = self.tables.lock();
    if tables
      .cart_items
      .values()
      .any(|c| c.user_id == user_id && c.product_id == product_id)
    {
      return Ok(None);
    }
    let item = CartItem {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      quantity,
      added_at: Utc::now(),
    };
    tables.cart_items.insert(item.id, item.clone());
    Ok(Some(item))
  }

  async fn update_cart_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let mut tables = self.tables.lock();
    match tables.cart_items.get_mut(&item_id) {
      Some(item) if item.user_id == user_id => {
        item.quantity = quantity;
        Ok(Some(item.clone()))
      }
      _ => Ok(None),
    }
  }

  async fn delete_cart_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    let owned = tables.cart_items.get(&item_id).is_some_and(|c| c.user_id == user_id);
    if owned {
      tables.cart_items.remove(&item_id);
    }
    Ok(owned)
  }

  async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
    let tables = self.tables.lock();
    let mut items: Vec<&CartItem> = tables.cart_items.values().filter(|c| c.user_id == user_id).collect();
    items.sort_by_key(|c| (c.added_at, c.id));
    Ok(
      items
        .into_iter()
        .filter_map(|item| {
          let product = tables.products.get(&item.product_id)?;
          Some(CartLine {
            item_id: item.id,
            product_id: product.id,
            product_name: product.name.clone(),
            supplier_id: product.supplier_id,
            supplier_name: tables.profile_name(product.supplier_id),
            unit_price_cents: product.price_cents,
            quantity: item.quantity,
          })
        })
        .collect(),
    )
  }

  #[instrument(name = "memory_store::commit_checkout", skip(self, orders, cart_item_ids), fields(order_count = orders.len()))]
  async fn commit_checkout(&self, user_id: Uuid, orders: Vec<NewOrder>, cart_item_ids: Vec<Uuid>) -> Result<Vec<Order>> {
    let fail_at = self.fail_order_insert_at.lock().take();
    let mut tables = self.tables.lock();

    let missing = cart_item_ids
      .iter()
      .filter(|id| !tables.cart_items.get(*id).is_some_and(|c| c.user_id == user_id))
      .count();
    if missing > 0 {
      warn!(%user_id, missing, "Cart changed during checkout; nothing committed.");
      return Err(AppError::Validation(CART_CHANGED_MESSAGE.to_string()));
    }

    // Staged first; the tables are only touched once every insert has succeeded.
    let now = Utc::now();
    let mut staged = Vec::with_capacity(orders.len());
    for (index, new) in orders.into_iter().enumerate() {
      if fail_at == Some(index + 1) {
        warn!(insert_index = index + 1, "Injected order insert failure; discarding staged checkout.");
        return Err(AppError::Store(format!("order insert {} failed", index + 1)));
      }
      staged.push(Order {
        id: Uuid::new_v4(),
        product_id: new.product_id,
        user_id: new.user_id,
        supplier_id: new.supplier_id,
        amount_cents: new.amount_cents,
        delivery_fee_cents: new.delivery_fee_cents,
        total_amount_cents: new.total_amount_cents,
        delivery_address: new.delivery_address,
        status: OrderStatus::Pending,
        created_at: now,
      });
    }

    for order in &staged {
      tables.orders.insert(order.id, order.clone());
    }
    for item_id in &cart_item_ids {
      tables.cart_items.remove(item_id);
    }
    debug!(committed = staged.len(), "Checkout committed.");
    Ok(staged)
  }

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.lock().orders.get(&order_id).cloned())
  }

  async fn transition_order(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
    supplier_id: Option<Uuid>,
  ) -> Result<Option<Order>> {
    let mut tables = self.tables.lock();
    match tables.orders.get_mut(&order_id) {
      Some(order) if order.status == expected && supplier_id.map_or(true, |s| s == order.supplier_id) => {
        order.status = next;
        Ok(Some(order.clone()))
      }
      _ => Ok(None),
    }
  }

  async fn bulk_transition_supplier_orders(
    &self,
    supplier_id: Uuid,
    from: &[OrderStatus],
    next: OrderStatus,
  ) -> Result<Vec<Order>> {
    let mut tables = self.tables.lock();
    let mut changed: Vec<Order> = tables
      .orders
      .values_mut()
      .filter(|o| o.supplier_id == supplier_id && from.contains(&o.status))
      .map(|o| {
        o.status = next;
        o.clone()
      })
      .collect();
    newest_first(&mut changed, |o| (o.created_at, o.id));
    Ok(changed)
  }

  async fn list_buyer_orders(&self, user_id: Uuid) -> Result<Vec<BuyerOrderView>> {
    let tables = self.tables.lock();
    let mut views: Vec<BuyerOrderView> = tables
      .orders
      .values()
      .filter(|o| o.user_id == user_id)
      .map(|o| BuyerOrderView {
        order: o.clone(),
        product_name: tables.product_name(o.product_id),
        supplier_name: tables.profile_name(o.supplier_id),
      })
      .collect();
    newest_first(&mut views, |v| (v.order.created_at, v.order.id));
    Ok(views)
  }

  async fn list_supplier_orders(&self, supplier_id: Uuid) -> Result<Vec<SupplierOrderView>> {
    let tables = self.tables.lock();
    let mut views: Vec<SupplierOrderView> = tables
      .orders
      .values()
      .filter(|o| o.supplier_id == supplier_id)
      .map(|o| SupplierOrderView {
        order: o.clone(),
        product_name: tables.product_name(o.product_id),
        client_name: tables.profile_name(o.user_id),
      })
      .collect();
    newest_first(&mut views, |v| (v.order.created_at, v.order.id));
    Ok(views)
  }

  async fn supplier_stats(&self, supplier_id: Uuid) -> Result<SupplierStats> {
    let tables = self.tables.lock();
    let total_products = tables.products.values().filter(|p| p.supplier_id == supplier_id).count() as i64;
    let orders = tables.orders.values().filter(|o| o.supplier_id == supplier_id);
    let mut stats = SupplierStats {
      total_products,
      ..SupplierStats::default()
    };
    for order in orders {
      if !order.status.is_terminal() {
        stats.active_orders += 1;
      }
      if order.status != OrderStatus::Cancelled {
        stats.total_earnings_cents += order.amount_cents;
      }
    }
    Ok(stats)
  }

  async fn platform_stats(&self) -> Result<PlatformStats> {
    let tables = self.tables.lock();
    Ok(PlatformStats {
      total_profiles: tables.profiles.len() as i64,
      verified_suppliers: tables
        .profiles
        .values()
        .filter(|p| p.role == Role::Supplier && p.is_verified)
        .count() as i64,
      total_orders: tables.orders.len() as i64,
      pending_verifications: tables
        .profiles
        .values()
        .filter(|p| p.role != Role::Admin && !p.is_verified)
        .count() as i64,
    })
  }

  async fn pending_verifications(&self) -> Result<Vec<Profile>> {
    let tables = self.tables.lock();
    let mut pending: Vec<Profile> = tables
      .profiles
      .values()
      .filter(|p| p.role != Role::Admin && !p.is_verified)
      .cloned()
      .collect();
    newest_first(&mut pending, |p| (p.created_at, p.id));
    Ok(pending)
  }

  async fn set_profile_verified(&self, profile_id: Uuid, verified: bool) -> Result<Option<Profile>> {
    let mut tables = self.tables.lock();
    Ok(tables.profiles.get_mut(&profile_id).map(|p| {
      p.is_verified = verified;
      p.clone()
    }))
  }
}
