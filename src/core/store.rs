//! Store directory queries.
//!
//! The store list is the first thing a client loads; it backs the login
//! store picker and is snapshotted to the local cache so a restart can show
//! it while offline.

use crate::{
    entities::{Store, store},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Retrieves all stores, ordered alphabetically by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_stores(db: &DatabaseConnection) -> Result<Vec<store::Model>> {
    Store::find()
        .order_by_asc(store::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific store by its unique ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_store_by_id(
    db: &DatabaseConnection,
    store_id: i64,
) -> Result<Option<store::Model>> {
    Store::find_by_id(store_id).one(db).await.map_err(Into::into)
}

/// Creates a new store.
///
/// # Errors
/// Returns an error if the insert fails.
pub async fn create_store(
    db: &DatabaseConnection,
    name: String,
    address: Option<String>,
    phone: Option<String>,
) -> Result<store::Model> {
    let model = store::ActiveModel {
        name: Set(name),
        address: Set(address),
        phone: Set(phone),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}
