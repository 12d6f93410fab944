//! Product entity - Represents one catalog item with tracked stock.
//!
//! Quantity is decremented by the sale coordinator when a sale completes.
//! The decrement clamps at zero; oversell attempts are rejected before the
//! sale is submitted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Store this product belongs to; None for unassigned catalog entries
    pub store_id: Option<i64>,
    /// Display name of the product
    pub name: String,
    /// Catalog category (e.g. "phones", "accessories")
    pub category: String,
    /// Manufacturer brand
    pub brand: String,
    /// Model designation
    pub model: String,
    /// Unit price
    pub price: f64,
    /// Units currently in stock; never negative
    pub quantity: i32,
    /// Free-form description, if any
    pub description: Option<String>,
    /// Scannable barcode, if assigned
    pub barcode: Option<String>,
    /// When the product was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product may belong to one store
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
