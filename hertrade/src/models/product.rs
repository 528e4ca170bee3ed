// hertrade/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[sqlx(type_name = "product_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
  Active,
  Inactive,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub supplier_id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub stock: i32,
  pub category: String,
  pub status: ProductStatus,
  pub image: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
  pub supplier_id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub stock: i32,
  pub category: String,
  pub image: Option<String>,
}

/// Marketplace row: an active product joined with its supplier's public profile.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductListing {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub product: Product,
  pub supplier_name: String,
  pub supplier_verified: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
  pub category: Option<String>,
  /// Case-insensitive match on product name or supplier name.
  pub search: Option<String>,
}

impl ProductFilter {
  pub fn matches(&self, listing: &ProductListing) -> bool {
    if let Some(category) = &self.category {
      if !listing.product.category.eq_ignore_ascii_case(category) {
        return false;
      }
    }
    if let Some(q) = &self.search {
      let q = q.to_lowercase();
      return listing.product.name.to_lowercase().contains(&q) || listing.supplier_name.to_lowercase().contains(&q);
    }
    true
  }
}
