//! Sale entity - Represents an immutable completed transaction.
//!
//! A sale is created exactly once when a seller completes the checkout flow
//! and is never updated or deleted by the session core. The item list is
//! persisted as a JSON column; the receipt number is a client-generated
//! idempotency and display token.

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// How the buyer paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentMethod {
    /// Paid in cash at the counter
    #[sea_orm(string_value = "cash")]
    Cash,
    /// Paid by card through the terminal
    #[sea_orm(string_value = "terminal")]
    Terminal,
}

/// One line item of a sale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    /// Catalog id of the sold product
    pub product_id: i64,
    /// Product name at the time of sale
    pub product_name: String,
    /// Brand at the time of sale
    pub brand: String,
    /// Model at the time of sale
    pub model: String,
    /// Unit price charged
    pub price: f64,
    /// Units sold
    pub quantity: i32,
    /// Line total (`price * quantity`)
    pub total: f64,
}

/// Item list payload stored in the `items_data` JSON column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct SaleItems(pub Vec<SaleItem>);

/// Sale database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Store the sale happened in
    pub store_id: i64,
    /// Seller who completed the sale, if known
    pub seller_id: Option<i64>,
    /// Globally unique display string, generated client-side at submission
    #[sea_orm(unique)]
    pub receipt_number: String,
    /// Total amount charged; always positive
    pub total_amount: f64,
    /// Discount subtracted from the item sum before submission
    pub discount: f64,
    /// How the buyer paid
    pub payment_method: PaymentMethod,
    /// Line items sold
    #[sea_orm(column_type = "Json")]
    pub items_data: SaleItems,
    /// When the sale was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sale belongs to one store
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
    /// Each sale may reference the seller who made it
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SellerId",
        to = "super::user::Column::Id"
    )]
    Seller,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
