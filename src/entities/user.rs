//! User entity - Represents sellers and owners.
//!
//! Sellers belong to a single store and record visits and sales there.
//! Owners have no store binding and see aggregated data across all stores.
//! Credentials are stored as SHA-256 digests, never in the clear.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Access role of a user account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    /// Reviews aggregated analytics across every store
    #[sea_orm(string_value = "owner")]
    Owner,
    /// Records visits and sales for one store
    #[sea_orm(string_value = "seller")]
    Seller,
}

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Store the user works in; None for owners
    pub store_id: Option<i64>,
    /// Unique login name, stored trimmed and lowercased
    #[sea_orm(unique)]
    pub login: String,
    /// SHA-256 hex digest of the password
    pub password_digest: String,
    /// Display name shown on receipts and statistics
    pub name: String,
    /// Access role: `owner` or `seller`
    pub role: Role,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each user may belong to one store
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
    /// One user works many shifts
    #[sea_orm(has_many = "super::shift::Entity")]
    Shifts,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::shift::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shifts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
