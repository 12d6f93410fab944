//! Visit entity - Placeholder for an in-progress or completed sale.
//!
//! A visit is created when a seller opens the checkout flow and is updated
//! exactly once when the linked sale is finalized. `sale_id` is null exactly
//! when `sale_amount` is zero and `payment_method` is null. Visits are
//! purged per store when a shift starts or ends.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sale::PaymentMethod;

/// Visit database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "visits")]
pub struct Model {
    /// Unique identifier for the visit
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Store the visit happened in
    pub store_id: i64,
    /// Seller who opened the visit, if known
    pub seller_id: Option<i64>,
    /// Sequential display label ("Visit #7")
    pub title: String,
    /// Amount of the linked sale; 0.0 until completed
    pub sale_amount: f64,
    /// Payment method of the linked sale; None until completed
    pub payment_method: Option<PaymentMethod>,
    /// Linked sale; None until a sale is finalized
    pub sale_id: Option<i64>,
    /// When the visit was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Visit and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each visit belongs to one store
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
    /// Each visit may link to one completed sale
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
