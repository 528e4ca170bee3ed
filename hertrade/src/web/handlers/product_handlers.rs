// hertrade/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{NewProduct, ProductFilter, Role};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedProfile;

#[derive(Deserialize, Debug, Default)]
pub struct ListProductsQuery {
  pub category: Option<String>,
  pub q: Option<String>,
}

impl ListProductsQuery {
  fn into_filter(self) -> ProductFilter {
    let non_blank = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    ProductFilter {
      category: non_blank(self.category).filter(|c| !c.eq_ignore_ascii_case("all")),
      search: non_blank(self.q),
    }
  }
}

#[derive(Deserialize, Debug)]
pub struct CreateProductPayload {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price_cents: i64,
  pub stock: i32,
  pub category: String,
  #[serde(default)]
  pub image: Option<String>,
}

impl CreateProductPayload {
  fn validate(&self) -> Result<(), AppError> {
    if self.name.trim().is_empty() {
      return Err(AppError::Validation("Product name is required.".to_string()));
    }
    if self.price_cents <= 0 {
      return Err(AppError::Validation("Price must be greater than zero.".to_string()));
    }
    if self.stock < 0 {
      return Err(AppError::Validation("Stock cannot be negative.".to_string()));
    }
    if self.category.trim().is_empty() {
      return Err(AppError::Validation("Category is required.".to_string()));
    }
    Ok(())
  }
}

#[instrument(name = "handler::list_products", skip(app_state, query_params))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query_params: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let filter = query_params.into_inner().into_filter();
  let products = app_state.store.list_marketplace(&filter).await?;
  info!(count = products.len(), "Marketplace products fetched.");
  Ok(HttpResponse::Ok().json(json!({ "products": products })))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  match app_state.store.find_product(product_id).await? {
    Some(product) => Ok(HttpResponse::Ok().json(json!({ "product": product }))),
    None => {
      warn!(%product_id, "Product not found.");
      Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)))
    }
  }
}

#[instrument(name = "handler::create_product", skip(app_state, caller, req_payload), fields(supplier_id = %caller.profile_id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
  req_payload: web::Json<CreateProductPayload>,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Supplier)?;
  let payload = req_payload.into_inner();
  payload.validate()?;

  let product = app_state
    .store
    .insert_product(NewProduct {
      supplier_id: caller.profile_id,
      name: payload.name.trim().to_string(),
      description: payload.description,
      price_cents: payload.price_cents,
      stock: payload.stock,
      category: payload.category.trim().to_string(),
      image: payload.image,
    })
    .await?;
  info!(product_id = %product.id, "Product created.");
  Ok(HttpResponse::Created().json(json!({
    "message": "Product added successfully.",
    "product": product,
  })))
}

#[instrument(name = "handler::my_products", skip(app_state, caller), fields(supplier_id = %caller.profile_id))]
pub async fn my_products_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedProfile,
) -> Result<HttpResponse, AppError> {
  caller.require_role(Role::Supplier)?;
  let products = app_state.store.list_supplier_products(caller.profile_id, false).await?;
  Ok(HttpResponse::Ok().json(json!({ "products": products })))
}

#[instrument(name = "handler::supplier_storefront", skip(app_state, path), fields(supplier_id = %path.as_ref()))]
pub async fn supplier_storefront_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let supplier_id = path.into_inner();
  let supplier = app_state
    .store
    .find_profile(supplier_id)
    .await?
    .filter(|p| p.role == Role::Supplier)
    .ok_or_else(|| AppError::NotFound(format!("Supplier with ID {} not found.", supplier_id)))?;
  let products = app_state.store.list_supplier_products(supplier_id, true).await?;
  Ok(HttpResponse::Ok().json(json!({
    "supplier": supplier,
    "products": products,
  })))
}
