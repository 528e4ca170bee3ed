// hertrade/src/pipelines/cart_pipeline.rs

use crate::errors::AppError;
use crate::models::ProductStatus;
use crate::pipelines::contexts::{AddToCartCtxData, AddToCartOutcome};
use flow::{ContextData, Flow, Pipeline, PipelineControl};
use tracing::{info, warn};

pub fn register_add_to_cart_pipeline(flow_registry: &Flow<AppError>) {
  let mut p = Pipeline::<AddToCartCtxData, AppError>::new(&[
    ("validate_cart_input", false, None),
    ("fetch_product_for_cart", false, None),
    ("insert_cart_item_db", false, None),
  ]);

  p.on_step("validate_cart_input", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let quantity = ctx_data.read().quantity;
    if quantity < 1 {
      warn!(quantity, "Add to cart with non-positive quantity.");
      return Err(AppError::Validation("Quantity must be at least 1.".to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  p.on_step("fetch_product_for_cart", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (product_id, store) = {
      let guard = ctx_data.read();
      (guard.product_id, guard.app_state.store.clone())
    };

    match store.find_product(product_id).await? {
      Some(product) if product.status == ProductStatus::Active => Ok(PipelineControl::Continue),
      _ => {
        warn!(%product_id, "Add to cart for a missing or inactive product.");
        Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)))
      }
    }
  });

  p.on_step("insert_cart_item_db", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (user_id, product_id, quantity, store) = {
      let guard = ctx_data.read();
      (guard.user_id, guard.product_id, guard.quantity, guard.app_state.store.clone())
    };

    // A duplicate (user, product) pair is a benign no-op, never an error.
    let outcome = match store.insert_cart_item(user_id, product_id, quantity).await? {
      Some(item) => {
        info!(%user_id, %product_id, item_id = %item.id, "Item added to cart.");
        AddToCartOutcome::Added(item)
      }
      None => {
        info!(%user_id, %product_id, "Product already in cart.");
        AddToCartOutcome::AlreadyInCart
      }
    };
    ctx_data.write().outcome = Some(outcome);
    Ok::<_, AppError>(PipelineControl::Continue)
  });

  flow_registry.register_pipeline(p);
  info!("Add to Cart pipeline registered.");
}
