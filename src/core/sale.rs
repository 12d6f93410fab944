//! Sale business logic - visit creation and the transactional checkout flow.
//!
//! The two-phase flow of the client — open a visit, later complete a sale
//! against it — commits in a single database transaction: the sale insert,
//! the visit linkage, and the per-item stock decrements either all land or
//! none do, so a sale row can never exist without its visit link. All
//! validation (empty cart, non-positive total, item/total mismatch,
//! oversell) happens before the first write.

use crate::{
    core::product,
    entities::{PaymentMethod, Sale, SaleItem, SaleItems, Visit, sale, visit},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

/// Tolerance for comparing submitted totals against item sums.
const AMOUNT_EPSILON: f64 = 0.005;

/// A sale as submitted by the checkout flow, before it has an id.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    /// Client-generated idempotency and display token
    pub receipt_number: String,
    /// Line items; must be non-empty
    pub items: Vec<SaleItem>,
    /// Total charged; must be positive and match the item sum net of discount
    pub total_amount: f64,
    /// Discount subtracted from the item sum before submission
    pub discount: f64,
    /// How the buyer paid
    pub payment_method: PaymentMethod,
}

/// Generates a receipt number from the submission timestamp plus a random
/// suffix. Unique enough to serve as the human-readable idempotency token.
#[must_use]
pub fn generate_receipt_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("RCP-{millis}-{suffix:04}")
}

/// Retrieves visits, optionally scoped to one store, oldest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_visits(
    db: &DatabaseConnection,
    store_id: Option<i64>,
) -> Result<Vec<visit::Model>> {
    let mut query = Visit::find().order_by_asc(visit::Column::CreatedAt);
    if let Some(store_id) = store_id {
        query = query.filter(visit::Column::StoreId.eq(store_id));
    }
    query.all(db).await.map_err(Into::into)
}

/// Retrieves sales, optionally scoped to one store, oldest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_sales(
    db: &DatabaseConnection,
    store_id: Option<i64>,
) -> Result<Vec<sale::Model>> {
    let mut query = Sale::find().order_by_asc(sale::Column::CreatedAt);
    if let Some(store_id) = store_id {
        query = query.filter(sale::Column::StoreId.eq(store_id));
    }
    query.all(db).await.map_err(Into::into)
}

/// Retrieves all sales of one seller in one store whose creation timestamp
/// falls within `[start, end]`. This is the source-of-truth window used to
/// compute shift totals.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn sales_in_window(
    db: &DatabaseConnection,
    store_id: i64,
    seller_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<sale::Model>> {
    Sale::find()
        .filter(sale::Column::StoreId.eq(store_id))
        .filter(sale::Column::SellerId.eq(seller_id))
        .filter(sale::Column::CreatedAt.gte(start))
        .filter(sale::Column::CreatedAt.lte(end))
        .order_by_asc(sale::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes every visit of a store. Used when a shift starts or ends.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn purge_visits<C>(db: &C, store_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Visit::delete_many()
        .filter(visit::Column::StoreId.eq(store_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Creates a visit with a sequential display title for the store.
///
/// The title is derived count-then-label from the store's current visit
/// count. Not strictly race-free against concurrent sessions, which is
/// acceptable because visits are per-seller-session in practice.
///
/// # Errors
/// Returns an error if the count query or the insert fails.
pub async fn create_visit(
    db: &DatabaseConnection,
    store_id: i64,
    seller_id: Option<i64>,
) -> Result<visit::Model> {
    let count = Visit::find()
        .filter(visit::Column::StoreId.eq(store_id))
        .count(db)
        .await?;

    let model = visit::ActiveModel {
        store_id: Set(store_id),
        seller_id: Set(seller_id),
        title: Set(format!("Visit #{}", count + 1)),
        sale_amount: Set(0.0),
        payment_method: Set(None),
        sale_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Validates a sale draft before anything is written.
///
/// # Errors
/// Returns [`Error::EmptyCart`], [`Error::InvalidAmount`] or
/// [`Error::TotalMismatch`] for the corresponding violations.
pub fn validate_draft(draft: &SaleDraft) -> Result<()> {
    if draft.items.is_empty() {
        return Err(Error::EmptyCart);
    }

    if draft.total_amount <= 0.0 || !draft.total_amount.is_finite() {
        return Err(Error::InvalidAmount {
            amount: draft.total_amount,
        });
    }

    let items_total: f64 = draft.items.iter().map(|item| item.total).sum();
    if (items_total - draft.discount - draft.total_amount).abs() > AMOUNT_EPSILON {
        return Err(Error::TotalMismatch {
            items_total,
            discount: draft.discount,
            total_amount: draft.total_amount,
        });
    }

    Ok(())
}

/// Completes a sale against an open visit.
///
/// Order of operations: validate the draft, check the visit is open, reject
/// oversells against current stock, then in one transaction insert the sale
/// row (the insert returns its canonical id directly), link the visit
/// (sale id, amount, payment method), and decrement each sold product's
/// stock with the atomic clamp-at-zero update. Individual decrements of
/// unknown products are logged and skipped without aborting the rest.
///
/// Returns the created sale; its id and payment method drive the receipt.
///
/// # Errors
/// Returns a validation error before any write, [`Error::VisitNotFound`] /
/// [`Error::VisitAlreadyCompleted`] for bad visit references, or a database
/// error if the transaction fails (in which case nothing was committed).
pub async fn complete_sale(
    db: &DatabaseConnection,
    visit_id: i64,
    store_id: i64,
    seller_id: Option<i64>,
    draft: SaleDraft,
) -> Result<sale::Model> {
    validate_draft(&draft)?;

    let current_visit = Visit::find_by_id(visit_id)
        .one(db)
        .await?
        .ok_or(Error::VisitNotFound { id: visit_id })?;
    if current_visit.sale_id.is_some() {
        return Err(Error::VisitAlreadyCompleted { id: visit_id });
    }

    for item in &draft.items {
        match product::get_product_by_id(db, item.product_id).await? {
            Some(known) if known.quantity < item.quantity => {
                return Err(Error::InsufficientStock {
                    name: known.name,
                    available: known.quantity,
                    requested: item.quantity,
                });
            }
            Some(_) => {}
            None => {
                warn!(
                    "Sale references unknown product {}; stock will not be adjusted",
                    item.product_id
                );
            }
        }
    }

    let txn = db.begin().await?;

    let sale_model = sale::ActiveModel {
        store_id: Set(store_id),
        seller_id: Set(seller_id),
        receipt_number: Set(draft.receipt_number.clone()),
        total_amount: Set(draft.total_amount),
        discount: Set(draft.discount),
        payment_method: Set(draft.payment_method),
        items_data: Set(SaleItems(draft.items.clone())),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = sale_model.insert(&txn).await?;

    let mut visit_active: visit::ActiveModel = current_visit.into();
    visit_active.sale_id = Set(Some(created.id));
    visit_active.sale_amount = Set(created.total_amount);
    visit_active.payment_method = Set(Some(created.payment_method));
    visit_active.update(&txn).await?;

    for item in &draft.items {
        product::decrement_stock(&txn, item.product_id, item.quantity).await?;
    }

    txn.commit().await?;

    info!(
        "Completed sale {} ({}) for visit {visit_id}",
        created.id, created.receipt_number
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{product::get_product_by_id, shift};
    use crate::test_utils::*;
    use sea_orm::EntityTrait;

    #[tokio::test]
    async fn test_create_visit_sequential_titles() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;

        let first = create_visit(&db, store.id, Some(seller.id)).await?;
        let second = create_visit(&db, store.id, Some(seller.id)).await?;

        assert_eq!(first.title, "Visit #1");
        assert_eq!(second.title, "Visit #2");
        Ok(())
    }

    #[tokio::test]
    async fn test_fresh_visit_upholds_linkage_invariant() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;

        let fresh = create_visit(&db, store.id, Some(seller.id)).await?;

        assert!(fresh.sale_id.is_none());
        assert_eq!(fresh.sale_amount, 0.0);
        assert!(fresh.payment_method.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sale_links_visit_and_decrements_stock() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;
        let phone = create_test_product(&db, Some(store.id), "Phone", 5).await?;
        let case = create_test_product(&db, Some(store.id), "Case", 9).await?;
        let opened = create_visit(&db, store.id, Some(seller.id)).await?;

        let draft = SaleDraft {
            receipt_number: generate_receipt_number(),
            items: vec![
                make_sale_item(&phone, 1, 450.0),
                make_sale_item(&case, 2, 25.0),
            ],
            total_amount: 500.0,
            discount: 0.0,
            payment_method: PaymentMethod::Cash,
        };

        let created = complete_sale(&db, opened.id, store.id, Some(seller.id), draft).await?;
        assert_eq!(created.total_amount, 500.0);
        assert_eq!(created.items_data.0.len(), 2);

        // Visit is linked exactly once, with amount and payment method set
        let linked = Visit::find_by_id(opened.id).one(&db).await?.unwrap();
        assert_eq!(linked.sale_id, Some(created.id));
        assert_eq!(linked.sale_amount, 500.0);
        assert_eq!(linked.payment_method, Some(PaymentMethod::Cash));

        // Stock went down by the sold quantities
        assert_eq!(get_product_by_id(&db, phone.id).await?.unwrap().quantity, 4);
        assert_eq!(get_product_by_id(&db, case.id).await?.unwrap().quantity, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sale_rejects_empty_cart() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;
        let opened = create_visit(&db, store.id, Some(seller.id)).await?;

        let draft = SaleDraft {
            receipt_number: generate_receipt_number(),
            items: vec![],
            total_amount: 100.0,
            discount: 0.0,
            payment_method: PaymentMethod::Cash,
        };
        let result = complete_sale(&db, opened.id, store.id, Some(seller.id), draft).await;
        assert!(matches!(result, Err(Error::EmptyCart)));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sale_rejects_non_positive_total() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;
        let phone = create_test_product(&db, Some(store.id), "Phone", 5).await?;
        let opened = create_visit(&db, store.id, Some(seller.id)).await?;

        let draft = SaleDraft {
            receipt_number: generate_receipt_number(),
            items: vec![make_sale_item(&phone, 1, 0.0)],
            total_amount: 0.0,
            discount: 0.0,
            payment_method: PaymentMethod::Cash,
        };
        let result = complete_sale(&db, opened.id, store.id, Some(seller.id), draft).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount }) if amount == 0.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sale_rejects_total_mismatch() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;
        let phone = create_test_product(&db, Some(store.id), "Phone", 5).await?;
        let opened = create_visit(&db, store.id, Some(seller.id)).await?;

        let draft = SaleDraft {
            receipt_number: generate_receipt_number(),
            items: vec![make_sale_item(&phone, 1, 450.0)],
            total_amount: 500.0,
            discount: 0.0,
            payment_method: PaymentMethod::Cash,
        };
        let result = complete_sale(&db, opened.id, store.id, Some(seller.id), draft).await;
        assert!(matches!(result, Err(Error::TotalMismatch { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sale_honors_discount_in_validation() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;
        let phone = create_test_product(&db, Some(store.id), "Phone", 5).await?;
        let opened = create_visit(&db, store.id, Some(seller.id)).await?;

        let draft = SaleDraft {
            receipt_number: generate_receipt_number(),
            items: vec![make_sale_item(&phone, 1, 500.0)],
            total_amount: 450.0,
            discount: 50.0,
            payment_method: PaymentMethod::Terminal,
        };
        let created = complete_sale(&db, opened.id, store.id, Some(seller.id), draft).await?;
        assert_eq!(created.total_amount, 450.0);
        assert_eq!(created.discount, 50.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sale_rejects_oversell_before_any_write() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;
        let phone = create_test_product(&db, Some(store.id), "Phone", 1).await?;
        let opened = create_visit(&db, store.id, Some(seller.id)).await?;

        let draft = SaleDraft {
            receipt_number: generate_receipt_number(),
            items: vec![make_sale_item(&phone, 2, 450.0)],
            total_amount: 900.0,
            discount: 0.0,
            payment_method: PaymentMethod::Cash,
        };
        let result = complete_sale(&db, opened.id, store.id, Some(seller.id), draft).await;
        assert!(matches!(result, Err(Error::InsufficientStock { .. })));

        // No sale row was written, the visit stayed open, stock untouched
        assert!(Sale::find().all(&db).await?.is_empty());
        let untouched = Visit::find_by_id(opened.id).one(&db).await?.unwrap();
        assert!(untouched.sale_id.is_none());
        assert_eq!(get_product_by_id(&db, phone.id).await?.unwrap().quantity, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sale_twice_rejected() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;
        let phone = create_test_product(&db, Some(store.id), "Phone", 5).await?;
        let opened = create_visit(&db, store.id, Some(seller.id)).await?;

        let draft = SaleDraft {
            receipt_number: generate_receipt_number(),
            items: vec![make_sale_item(&phone, 1, 450.0)],
            total_amount: 450.0,
            discount: 0.0,
            payment_method: PaymentMethod::Cash,
        };
        complete_sale(&db, opened.id, store.id, Some(seller.id), draft.clone()).await?;

        let second = SaleDraft {
            receipt_number: generate_receipt_number(),
            ..draft
        };
        let result = complete_sale(&db, opened.id, store.id, Some(seller.id), second).await;
        assert!(matches!(result, Err(Error::VisitAlreadyCompleted { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sale_unknown_visit() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;
        let phone = create_test_product(&db, Some(store.id), "Phone", 5).await?;

        let draft = SaleDraft {
            receipt_number: generate_receipt_number(),
            items: vec![make_sale_item(&phone, 1, 450.0)],
            total_amount: 450.0,
            discount: 0.0,
            payment_method: PaymentMethod::Cash,
        };
        let result = complete_sale(&db, 777, store.id, Some(seller.id), draft).await;
        assert!(matches!(result, Err(Error::VisitNotFound { id: 777 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_full_shift_scenario_one_sale_of_two_items() -> Result<()> {
        let (db, store, seller) = setup_with_store_and_seller().await?;
        let phone = create_test_product(&db, Some(store.id), "Phone", 3).await?;
        let case = create_test_product(&db, Some(store.id), "Case", 3).await?;

        let opened_shift = shift::start_shift(&db, seller.id, store.id).await?;
        let opened_visit = create_visit(&db, store.id, Some(seller.id)).await?;

        let draft = SaleDraft {
            receipt_number: generate_receipt_number(),
            items: vec![
                make_sale_item(&phone, 1, 400.0),
                make_sale_item(&case, 1, 100.0),
            ],
            total_amount: 500.0,
            discount: 0.0,
            payment_method: PaymentMethod::Cash,
        };
        complete_sale(&db, opened_visit.id, store.id, Some(seller.id), draft).await?;

        let closed = shift::close_shift(&db, &opened_shift).await?;

        assert_eq!(closed.total_sales, 500.0);
        assert_eq!(Sale::find().all(&db).await?.len(), 1);
        assert!(Visit::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_receipt_numbers_have_expected_shape() {
        let receipt = generate_receipt_number();
        assert!(receipt.starts_with("RCP-"));
        let parts: Vec<&str> = receipt.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 4);
    }
}
