//! Product business logic - Handles all catalog and stock operations.
//!
//! This module provides functions for creating, retrieving, updating, and
//! deleting products, plus the atomic stock decrement used by the sale flow.
//! Stock never goes negative: decrements are conditional updates guarded by
//! the current quantity and clamp at zero when a concurrent sale raced the
//! same units. All functions are async and return Result types for proper
//! error handling throughout the system.

use crate::{
    entities::{Product, product},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::warn;

/// Input for creating a new catalog product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    /// Store the product belongs to; None for unassigned entries
    pub store_id: Option<i64>,
    /// Display name
    pub name: String,
    /// Catalog category
    pub category: String,
    /// Manufacturer brand
    pub brand: String,
    /// Model designation
    pub model: String,
    /// Unit price
    pub price: f64,
    /// Initial stock quantity
    pub quantity: i32,
    /// Free-form description
    pub description: Option<String>,
    /// Scannable barcode
    pub barcode: Option<String>,
}

/// Partial update for an existing product; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    /// New display name
    pub name: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New brand
    pub brand: Option<String>,
    /// New model designation
    pub model: Option<String>,
    /// New unit price
    pub price: Option<f64>,
    /// New stock quantity
    pub quantity: Option<i32>,
    /// New description
    pub description: Option<Option<String>>,
    /// New barcode
    pub barcode: Option<Option<String>>,
}

/// Retrieves products, optionally scoped to one store, ordered by name.
///
/// Owners pass `None` and see the whole catalog; sellers pass their store id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_products(
    db: &DatabaseConnection,
    store_id: Option<i64>,
) -> Result<Vec<product::Model>> {
    let mut query = Product::find().order_by_asc(product::Column::Name);
    if let Some(store_id) = store_id {
        query = query.filter(product::Column::StoreId.eq(store_id));
    }
    query.all(db).await.map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new catalog product.
///
/// # Errors
/// Returns an error if the insert fails.
pub async fn create_product(
    db: &DatabaseConnection,
    input: ProductInput,
) -> Result<product::Model> {
    let model = product::ActiveModel {
        store_id: Set(input.store_id),
        name: Set(input.name),
        category: Set(input.category),
        brand: Set(input.brand),
        model: Set(input.model),
        price: Set(input.price),
        quantity: Set(input.quantity.max(0)),
        description: Set(input.description),
        barcode: Set(input.barcode),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Applies a partial update to a product and returns the updated row.
///
/// # Errors
/// Returns an error if the product does not exist or the update fails.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    patch: ProductPatch,
) -> Result<Option<product::Model>> {
    let Some(existing) = Product::find_by_id(product_id).one(db).await? else {
        return Ok(None);
    };

    let mut active: product::ActiveModel = existing.into();
    if let Some(name) = patch.name {
        active.name = Set(name);
    }
    if let Some(category) = patch.category {
        active.category = Set(category);
    }
    if let Some(brand) = patch.brand {
        active.brand = Set(brand);
    }
    if let Some(model) = patch.model {
        active.model = Set(model);
    }
    if let Some(price) = patch.price {
        active.price = Set(price);
    }
    if let Some(quantity) = patch.quantity {
        active.quantity = Set(quantity.max(0));
    }
    if let Some(description) = patch.description {
        active.description = Set(description);
    }
    if let Some(barcode) = patch.barcode {
        active.barcode = Set(barcode);
    }

    active.update(db).await.map(Some).map_err(Into::into)
}

/// Deletes a product from the catalog.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    Product::delete_by_id(product_id).exec(db).await?;
    Ok(())
}

/// Atomically decrements a product's stock by the sold quantity.
///
/// The decrement is a conditional update guarded by `quantity >= sold`, so
/// concurrent sales of the same units cannot take the stock negative. When
/// the guard fails (another sale raced the remaining units) the quantity is
/// clamped to zero instead; a missing product is logged and skipped.
///
/// # Errors
/// Returns an error if the update statement fails.
pub async fn decrement_stock<C>(db: &C, product_id: i64, sold: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Product::update_many()
        .col_expr(
            product::Column::Quantity,
            Expr::col(product::Column::Quantity).sub(sold),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Quantity.gte(sold))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let clamped = Product::update_many()
            .col_expr(product::Column::Quantity, Expr::value(0))
            .filter(product::Column::Id.eq(product_id))
            .exec(db)
            .await?;

        if clamped.rows_affected == 0 {
            warn!("Stock decrement skipped: product {product_id} no longer exists");
        } else {
            warn!("Stock for product {product_id} clamped at zero ({sold} requested)");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_and_list_products_scoped_by_store() -> Result<()> {
        let db = setup_test_db().await?;
        let store_a = create_test_store(&db, "Store A").await?;
        let store_b = create_test_store(&db, "Store B").await?;

        create_test_product(&db, Some(store_a.id), "Case", 5).await?;
        create_test_product(&db, Some(store_a.id), "Charger", 3).await?;
        create_test_product(&db, Some(store_b.id), "Screen", 1).await?;

        let all = list_products(&db, None).await?;
        assert_eq!(all.len(), 3);

        let scoped = list_products(&db, Some(store_a.id)).await?;
        assert_eq!(scoped.len(), 2);
        assert!(scoped.iter().all(|p| p.store_id == Some(store_a.id)));

        // Ordered alphabetically by name
        assert_eq!(scoped[0].name, "Case");
        assert_eq!(scoped[1].name, "Charger");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_partial_patch() -> Result<()> {
        let db = setup_test_db().await?;
        let store = create_test_store(&db, "Store").await?;
        let product = create_test_product(&db, Some(store.id), "Phone", 4).await?;

        let updated = update_product(
            &db,
            product.id,
            ProductPatch {
                price: Some(799.0),
                barcode: Some(Some("4820000000001".to_string())),
                ..Default::default()
            },
        )
        .await?
        .unwrap();

        assert_eq!(updated.price, 799.0);
        assert_eq!(updated.barcode.as_deref(), Some("4820000000001"));
        // Untouched fields survive
        assert_eq!(updated.name, "Phone");
        assert_eq!(updated.quantity, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_product_returns_none() -> Result<()> {
        let db = setup_test_db().await?;
        let updated = update_product(&db, 999, ProductPatch::default()).await?;
        assert!(updated.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_stock_normal() -> Result<()> {
        let db = setup_test_db().await?;
        let store = create_test_store(&db, "Store").await?;
        let product = create_test_product(&db, Some(store.id), "Phone", 5).await?;

        decrement_stock(&db, product.id, 2).await?;

        let updated = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(updated.quantity, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_stock_clamps_at_zero() -> Result<()> {
        let db = setup_test_db().await?;
        let store = create_test_store(&db, "Store").await?;
        let product = create_test_product(&db, Some(store.id), "Phone", 1).await?;

        // Requesting more than is left clamps rather than going negative
        decrement_stock(&db, product.id, 3).await?;

        let updated = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(updated.quantity, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_stock_missing_product_is_skipped() -> Result<()> {
        let db = setup_test_db().await?;
        // Must not error; the sale flow logs and continues
        decrement_stock(&db, 12345, 1).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_stock_never_negative_across_sequence() -> Result<()> {
        let db = setup_test_db().await?;
        let store = create_test_store(&db, "Store").await?;
        let product = create_test_product(&db, Some(store.id), "Cable", 4).await?;

        for _ in 0..5 {
            decrement_stock(&db, product.id, 2).await?;
            let current = get_product_by_id(&db, product.id).await?.unwrap();
            assert!(current.quantity >= 0);
        }

        let final_state = get_product_by_id(&db, product.id).await?.unwrap();
        assert_eq!(final_state.quantity, 0);
        Ok(())
    }
}
