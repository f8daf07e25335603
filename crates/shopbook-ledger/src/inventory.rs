//! # Inventory Management
//!
//! Product create / edit / delete. Stock changes made here are manual
//! corrections by the owner; sales go through [`crate::workflow`].

use chrono::Utc;
use shopbook_core::validation::{validate_new_product, validate_product_patch};
use shopbook_core::{NewProduct, Product, ProductPatch};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult, WorkflowStep};
use crate::session::SessionContext;
use crate::store::ProductStore;

/// Adds a product to the session owner's inventory.
///
/// A missing low-stock threshold falls back to `default_low_stock_alert`.
pub async fn add_product<S>(
    store: &S,
    ctx: &SessionContext,
    input: NewProduct,
    default_low_stock_alert: i64,
) -> LedgerResult<Product>
where
    S: ProductStore + ?Sized,
{
    validate_new_product(&input)?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        user_id: ctx.user_id.clone(),
        name: input.name.trim().to_string(),
        quantity: input.quantity,
        cost_price_cents: input.cost_price_cents,
        selling_price_cents: input.selling_price_cents,
        low_stock_alert: input.low_stock_alert.unwrap_or(default_low_stock_alert),
        created_at: now,
        updated_at: now,
    };

    store.create_product(ctx, &product).await.map_err(|e| {
        error!(name = %product.name, error = %e, "Failed to add product");
        LedgerError::from_store(WorkflowStep::SaveProduct, e)
    })?;

    info!(product_id = %product.id, name = %product.name, quantity = product.quantity, "Product added");
    Ok(product)
}

/// Applies a partial edit to a product.
pub async fn update_product<S>(
    store: &S,
    ctx: &SessionContext,
    id: &str,
    patch: &ProductPatch,
) -> LedgerResult<Product>
where
    S: ProductStore + ?Sized,
{
    validate_product_patch(patch)?;

    let product = store
        .update_product(ctx, id, patch, Utc::now())
        .await
        .map_err(|e| {
            error!(product_id = %id, error = %e, "Failed to update product");
            LedgerError::from_store(WorkflowStep::SaveProduct, e)
        })?
        .ok_or_else(|| LedgerError::not_found("product", id))?;

    info!(product_id = %product.id, quantity = product.quantity, "Product updated");
    Ok(product)
}

/// Deletes a product. Past sales keep their name and price snapshot.
pub async fn delete_product<S>(store: &S, ctx: &SessionContext, id: &str) -> LedgerResult<()>
where
    S: ProductStore + ?Sized,
{
    let deleted = store
        .delete_product(ctx, id)
        .await
        .map_err(|e| LedgerError::from_store(WorkflowStep::SaveProduct, e))?;

    if !deleted {
        return Err(LedgerError::not_found("product", id));
    }
    info!(product_id = %id, "Product deleted");
    Ok(())
}
