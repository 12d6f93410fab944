//! Shared test utilities for the session core.
//!
//! This module provides common helper functions for setting up test
//! databases and creating test entities with sensible defaults. The test
//! database is an in-memory `SQLite` instance with all tables created from
//! the entity definitions.

use crate::{
    cache::LocalCache,
    config,
    connectivity::ConnectivityMonitor,
    core::{product, sale, store, user},
    diagnostics::DiagnosticsSink,
    entities::{self, PaymentMethod, Role, SaleItem, SaleItems},
    errors::Result,
    session::SessionController,
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, prelude::*};
use std::sync::atomic::{AtomicU64, Ordering};

/// Password used by every factory-created account.
pub const TEST_PASSWORD: &str = "password";

static RECEIPT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test store with the given name.
pub async fn create_test_store(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::store::Model> {
    store::create_store(db, name.to_string(), None, None).await
}

/// Creates a test seller account attached to a store.
///
/// # Defaults
/// * password: [`TEST_PASSWORD`]
/// * role: seller
pub async fn create_test_user(
    db: &DatabaseConnection,
    login: &str,
    store_id: Option<i64>,
) -> Result<entities::user::Model> {
    user::register_user(
        db,
        login,
        TEST_PASSWORD,
        login.to_string(),
        Role::Seller,
        store_id,
    )
    .await
}

/// Creates a test owner account with no store binding.
pub async fn create_test_owner(
    db: &DatabaseConnection,
    login: &str,
) -> Result<entities::user::Model> {
    user::register_user(db, login, TEST_PASSWORD, login.to_string(), Role::Owner, None).await
}

/// Creates a test product with the given stock quantity.
///
/// # Defaults
/// * price: 100.0
/// * category/brand/model: generic placeholders
pub async fn create_test_product(
    db: &DatabaseConnection,
    store_id: Option<i64>,
    name: &str,
    quantity: i32,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        product::ProductInput {
            store_id,
            name: name.to_string(),
            category: "phones".to_string(),
            brand: "Acme".to_string(),
            model: "X1".to_string(),
            price: 100.0,
            quantity,
            description: None,
            barcode: None,
        },
    )
    .await
}

/// Creates a visit for a store through the normal coordinator path.
pub async fn create_test_visit(
    db: &DatabaseConnection,
    store_id: i64,
    seller_id: Option<i64>,
) -> Result<entities::visit::Model> {
    sale::create_visit(db, store_id, seller_id).await
}

/// Builds a sale line item for a product at a given unit price.
#[must_use]
pub fn make_sale_item(
    item_product: &entities::product::Model,
    quantity: i32,
    unit_price: f64,
) -> SaleItem {
    SaleItem {
        product_id: item_product.id,
        product_name: item_product.name.clone(),
        brand: item_product.brand.clone(),
        model: item_product.model.clone(),
        price: unit_price,
        quantity,
        total: unit_price * f64::from(quantity),
    }
}

/// Inserts a sale row directly, bypassing the coordinator. Used by tests
/// that need sales on the books without driving the checkout flow.
pub async fn create_test_sale(
    db: &DatabaseConnection,
    store_id: i64,
    seller_id: Option<i64>,
    amount: f64,
    payment_method: PaymentMethod,
) -> Result<entities::sale::Model> {
    let counter = RECEIPT_COUNTER.fetch_add(1, Ordering::Relaxed);
    let model = entities::sale::ActiveModel {
        store_id: Set(store_id),
        seller_id: Set(seller_id),
        receipt_number: Set(format!("RCP-TEST-{counter}")),
        total_amount: Set(amount),
        discount: Set(0.0),
        payment_method: Set(payment_method),
        items_data: Set(SaleItems(vec![])),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Sets up a complete test environment with a store and a seller.
/// Returns (db, store, seller) for common test scenarios.
pub async fn setup_with_store_and_seller() -> Result<(
    DatabaseConnection,
    entities::store::Model,
    entities::user::Model,
)> {
    let db = setup_test_db().await?;
    let test_store = create_test_store(&db, "Test Store").await?;
    let seller = create_test_user(&db, "seller", Some(test_store.id)).await?;
    Ok((db, test_store, seller))
}

/// A fully wired controller over an in-memory database, plus the handles
/// tests use to drive it.
pub struct SessionHarness {
    /// The controller under test
    pub controller: SessionController,
    /// Connectivity publisher feeding the controller
    pub monitor: ConnectivityMonitor,
    /// The shared database handle
    pub db: DatabaseConnection,
    /// Pre-created store
    pub store: entities::store::Model,
    /// Pre-created seller ("seller" / [`TEST_PASSWORD`])
    pub seller: entities::user::Model,
    /// Cache directory backing the controller; kept alive for its lifetime
    pub cache_dir: tempfile::TempDir,
}

/// Sets up a session controller with a store, a seller, an online
/// connectivity monitor, and a temporary cache directory.
pub async fn setup_session() -> Result<SessionHarness> {
    let (db, test_store, seller) = setup_with_store_and_seller().await?;
    let monitor = ConnectivityMonitor::new(true);
    let cache_dir = tempfile::tempdir()?;
    let controller = SessionController::new(
        db.clone(),
        monitor.subscribe(),
        LocalCache::new(cache_dir.path()),
        DiagnosticsSink::new(None),
    );
    Ok(SessionHarness {
        controller,
        monitor,
        db,
        store: test_store,
        seller,
        cache_dir,
    })
}
