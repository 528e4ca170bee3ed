// hertrade/src/store/postgres.rs

use super::{PlatformStats, Store, SupplierStats, CART_CHANGED_MESSAGE};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::{
  Account, BuyerOrderView, CartItem, CartLine, NewAccount, NewOrder, NewProduct, Order, OrderStatus, Product,
  ProductFilter, ProductListing, Profile, Session, SupplierOrderView,
};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "o.id, o.product_id, o.user_id, o.supplier_id, o.amount_cents, o.delivery_fee_cents, \
   o.total_amount_cents, o.delivery_address, o.status, o.created_at";

/// Postgres-backed store. Runtime `query`/`query_as` only, so building needs no live database.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
  err.as_database_error().is_some_and(|db| db.is_unique_violation())
}

/// Escapes LIKE metacharacters so user input only ever matches literally.
fn like_pattern(q: &str) -> String {
  let escaped = q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
  format!("%{}%", escaped)
}

fn status_labels(statuses: &[OrderStatus]) -> Vec<String> {
  statuses.iter().map(|s| s.as_str().to_string()).collect()
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(config: &AppConfig) -> Result<Self> {
    let url = config
      .database_url
      .as_deref()
      .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
    let pool = PgPoolOptions::new()
      .max_connections(config.database_max_connections)
      .connect(url)
      .await
      .map_err(|e| {
        error!(error = %e, "Failed to connect to the database.");
        AppError::Sqlx(e)
      })?;
    info!(max_connections = config.database_max_connections, "Connected to the database.");
    Ok(Self::new(pool))
  }

  pub async fn run_migrations(&self) -> Result<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await.map_err(|e| {
      error!(error = %e, "Database migration failed.");
      AppError::Store(format!("migration failed: {}", e))
    })?;
    info!("Database migrations applied.");
    Ok(())
  }
}

#[async_trait]
impl Store for PgStore {
  #[instrument(name = "pg_store::create_account_with_profile", skip(self, new), fields(email = %new.email))]
  async fn create_account_with_profile(&self, new: NewAccount) -> Result<Profile> {
    let mut tx = self.pool.begin().await?;

    let account_id = Uuid::new_v4();
    let inserted = sqlx::query("INSERT INTO accounts (id, email, password_hash) VALUES ($1, $2, $3)")
      .bind(account_id)
      .bind(&new.email)
      .bind(&new.password_hash)
      .execute(&mut *tx)
      .await;
    if let Err(e) = inserted {
      if is_unique_violation(&e) {
        return Err(AppError::Validation("An account with this email already exists.".to_string()));
      }
      return Err(AppError::Sqlx(e));
    }

    let profile: Profile = sqlx::query_as(
      "INSERT INTO profiles (id, account_id, name, phone, role, has_smartphone, bio) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(account_id)
    .bind(&new.name)
    .bind(&new.phone)
    .bind(new.role)
    .bind(new.has_smartphone)
    .bind(&new.bio)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(profile)
  }

  async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
    let account = sqlx::query_as("SELECT * FROM accounts WHERE lower(email) = lower($1)")
      .bind(email)
      .fetch_optional(&self.pool)
      .await?;
    Ok(account)
  }

  async fn find_profile_by_account(&self, account_id: Uuid) -> Result<Option<Profile>> {
    let profile = sqlx::query_as("SELECT * FROM profiles WHERE account_id = $1")
      .bind(account_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(profile)
  }

  async fn find_profile(&self, profile_id: Uuid) -> Result<Option<Profile>> {
    let profile = sqlx::query_as("SELECT * FROM profiles WHERE id = $1")
      .bind(profile_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(profile)
  }

  async fn find_sms_supplier_by_phone(&self, phone: &str) -> Result<Option<Profile>> {
    let profile = sqlx::query_as(
      "SELECT * FROM profiles WHERE phone = $1 AND role = 'supplier' AND NOT has_smartphone \
       ORDER BY created_at LIMIT 1",
    )
    .bind(phone)
    .fetch_optional(&self.pool)
    .await?;
    Ok(profile)
  }

  async fn insert_session(&self, session: Session) -> Result<()> {
    sqlx::query("INSERT INTO sessions (token, profile_id, created_at, expires_at) VALUES ($1, $2, $3, $4)")
      .bind(&session.token)
      .bind(session.profile_id)
      .bind(session.created_at)
      .bind(session.expires_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn find_session(&self, token: &str) -> Result<Option<Session>> {
    let session = sqlx::query_as("SELECT token, profile_id, created_at, expires_at FROM sessions WHERE token = $1")
      .bind(token)
      .fetch_optional(&self.pool)
      .await?;
    Ok(session)
  }

  async fn insert_product(&self, new: NewProduct) -> Result<Product> {
    let product = sqlx::query_as(
      "INSERT INTO products (id, supplier_id, name, description, price_cents, stock, category, image) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(new.supplier_id)
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.price_cents)
    .bind(new.stock)
    .bind(&new.category)
    .bind(&new.image)
    .fetch_one(&self.pool)
    .await?;
    Ok(product)
  }

  async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1")
      .bind(product_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(product)
  }

  async fn list_marketplace(&self, filter: &ProductFilter) -> Result<Vec<ProductListing>> {
    let listings = sqlx::query_as(
      "SELECT p.*, s.name AS supplier_name, s.is_verified AS supplier_verified \
       FROM products p JOIN profiles s ON s.id = p.supplier_id \
       WHERE p.status = 'active' \
         AND ($1::text IS NULL OR lower(p.category) = lower($1)) \
         AND ($2::text IS NULL OR p.name ILIKE $2 OR s.name ILIKE $2) \
       ORDER BY p.created_at DESC, p.id DESC",
    )
    .bind(&filter.category)
    .bind(filter.search.as_deref().map(like_pattern))
    .fetch_all(&self.pool)
    .await?;
    Ok(listings)
  }

  async fn list_supplier_products(&self, supplier_id: Uuid, active_only: bool) -> Result<Vec<Product>> {
    let products = sqlx::query_as(
      "SELECT * FROM products WHERE supplier_id = $1 AND (NOT $2 OR status = 'active') \
       ORDER BY created_at DESC, id DESC",
    )
    .bind(supplier_id)
    .bind(active_only)
    .fetch_all(&self.pool)
    .await?;
    Ok(products)
  }

  async fn insert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let item = sqlx::query_as(
      "INSERT INTO cart_items (id, user_id, product_id, quantity) VALUES ($1, $2, $3, $4) \
       ON CONFLICT (user_id, product_id) DO NOTHING RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&self.pool)
    .await?;
    Ok(item)
  }

  async fn update_cart_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let item = sqlx::query_as("UPDATE cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2 RETURNING *")
      .bind(item_id)
      .bind(user_id)
      .bind(quantity)
      .fetch_optional(&self.pool)
      .await?;
    Ok(item)
  }

  async fn delete_cart_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
      .bind(item_id)
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
    let lines = sqlx::query_as(
      "SELECT c.id AS item_id, p.id AS product_id, p.name AS product_name, p.supplier_id, \
              s.name AS supplier_name, p.price_cents AS unit_price_cents, c.quantity \
       FROM cart_items c \
       JOIN products p ON p.id = c.product_id \
       JOIN profiles s ON s.id = p.supplier_id \
       WHERE c.user_id = $1 \
       ORDER BY c.added_at, c.id",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(lines)
  }

  #[instrument(name = "pg_store::commit_checkout", skip(self, orders, cart_item_ids), fields(order_count = orders.len()))]
  async fn commit_checkout(&self, user_id: Uuid, orders: Vec<NewOrder>, cart_item_ids: Vec<Uuid>) -> Result<Vec<Order>> {
    // Dropping `tx` on any early return rolls every insert back.
    let mut tx = self.pool.begin().await?;

    // Claiming the cart rows first serialises concurrent checkouts of the same cart: the loser
    // waits on the row locks and then deletes nothing.
    let claimed = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND id = ANY($2)")
      .bind(user_id)
      .bind(&cart_item_ids)
      .execute(&mut *tx)
      .await?
      .rows_affected();
    if claimed != cart_item_ids.len() as u64 {
      warn!(%user_id, claimed, expected = cart_item_ids.len(), "Cart changed during checkout; rolling back.");
      return Err(AppError::Validation(CART_CHANGED_MESSAGE.to_string()));
    }

    let mut created = Vec::with_capacity(orders.len());
    for new in orders {
      let order: Order = sqlx::query_as(
        "INSERT INTO orders (id, product_id, user_id, supplier_id, amount_cents, delivery_fee_cents, \
                             total_amount_cents, delivery_address, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending') RETURNING *",
      )
      .bind(Uuid::new_v4())
      .bind(new.product_id)
      .bind(new.user_id)
      .bind(new.supplier_id)
      .bind(new.amount_cents)
      .bind(new.delivery_fee_cents)
      .bind(new.total_amount_cents)
      .bind(&new.delivery_address)
      .fetch_one(&mut *tx)
      .await?;
      created.push(order);
    }

    tx.commit().await?;
    Ok(created)
  }

  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  #[instrument(name = "pg_store::transition_order", skip(self))]
  async fn transition_order(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
    supplier_id: Option<Uuid>,
  ) -> Result<Option<Order>> {
    let order = sqlx::query_as(
      "UPDATE orders SET status = $3 \
       WHERE id = $1 AND status = $2 AND ($4::uuid IS NULL OR supplier_id = $4) \
       RETURNING *",
    )
    .bind(order_id)
    .bind(expected)
    .bind(next)
    .bind(supplier_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(order)
  }

  #[instrument(name = "pg_store::bulk_transition_supplier_orders", skip(self))]
  async fn bulk_transition_supplier_orders(
    &self,
    supplier_id: Uuid,
    from: &[OrderStatus],
    next: OrderStatus,
  ) -> Result<Vec<Order>> {
    let mut changed: Vec<Order> = sqlx::query_as(
      "UPDATE orders SET status = $3 \
       WHERE supplier_id = $1 AND status::text = ANY($2) \
       RETURNING *",
    )
    .bind(supplier_id)
    .bind(status_labels(from))
    .bind(next)
    .fetch_all(&self.pool)
    .await?;
    changed.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    Ok(changed)
  }

  async fn list_buyer_orders(&self, user_id: Uuid) -> Result<Vec<BuyerOrderView>> {
    let sql = format!(
      "SELECT {ORDER_COLUMNS}, p.name AS product_name, s.name AS supplier_name \
       FROM orders o \
       JOIN products p ON p.id = o.product_id \
       JOIN profiles s ON s.id = o.supplier_id \
       WHERE o.user_id = $1 \
       ORDER BY o.created_at DESC, o.id DESC"
    );
    let views = sqlx::query_as(&sql).bind(user_id).fetch_all(&self.pool).await?;
    Ok(views)
  }

  async fn list_supplier_orders(&self, supplier_id: Uuid) -> Result<Vec<SupplierOrderView>> {
    let sql = format!(
      "SELECT {ORDER_COLUMNS}, p.name AS product_name, c.name AS client_name \
       FROM orders o \
       JOIN products p ON p.id = o.product_id \
       JOIN profiles c ON c.id = o.user_id \
       WHERE o.supplier_id = $1 \
       ORDER BY o.created_at DESC, o.id DESC"
    );
    let views = sqlx::query_as(&sql).bind(supplier_id).fetch_all(&self.pool).await?;
    Ok(views)
  }

  async fn supplier_stats(&self, supplier_id: Uuid) -> Result<SupplierStats> {
    let (total_products, active_orders, total_earnings_cents): (i64, i64, i64) = sqlx::query_as(
      "SELECT \
         (SELECT COUNT(*) FROM products WHERE supplier_id = $1), \
         (SELECT COUNT(*) FROM orders WHERE supplier_id = $1 AND status NOT IN ('delivered', 'cancelled')), \
         (SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM orders WHERE supplier_id = $1 AND status <> 'cancelled')",
    )
    .bind(supplier_id)
    .fetch_one(&self.pool)
    .await?;
    Ok(SupplierStats {
      total_products,
      active_orders,
      total_earnings_cents,
    })
  }

  async fn platform_stats(&self) -> Result<PlatformStats> {
    let (total_profiles, verified_suppliers, total_orders, pending_verifications): (i64, i64, i64, i64) =
      sqlx::query_as(
        "SELECT \
           (SELECT COUNT(*) FROM profiles), \
           (SELECT COUNT(*) FROM profiles WHERE role = 'supplier' AND is_verified), \
           (SELECT COUNT(*) FROM orders), \
           (SELECT COUNT(*) FROM profiles WHERE role <> 'admin' AND NOT is_verified)",
      )
      .fetch_one(&self.pool)
      .await?;
    Ok(PlatformStats {
      total_profiles,
      verified_suppliers,
      total_orders,
      pending_verifications,
    })
  }

  async fn pending_verifications(&self) -> Result<Vec<Profile>> {
    let profiles = sqlx::query_as(
      "SELECT * FROM profiles WHERE role <> 'admin' AND NOT is_verified ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(profiles)
  }

  async fn set_profile_verified(&self, profile_id: Uuid, verified: bool) -> Result<Option<Profile>> {
    let profile = sqlx::query_as("UPDATE profiles SET is_verified = $2 WHERE id = $1 RETURNING *")
      .bind(profile_id)
      .bind(verified)
      .fetch_optional(&self.pool)
      .await?;
    Ok(profile)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("bask"), "%bask%");
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
  }
}
