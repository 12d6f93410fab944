//! Shift entity - Represents one work session of a seller in a store.
//!
//! At most one shift is active per (user, store) pair, and a user never
//! holds an active shift in two stores at once. Shifts are created on an
//! explicit start action, mutated only by the close operation, and never
//! hard-deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shift database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shifts")]
pub struct Model {
    /// Unique identifier for the shift
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Store the shift is worked in
    pub store_id: i64,
    /// User working the shift
    pub user_id: i64,
    /// When the shift started
    pub start_time: DateTimeUtc,
    /// When the shift ended; None while the shift is open
    pub end_time: Option<DateTimeUtc>,
    /// Whether the shift is currently open
    pub is_active: bool,
    /// Accumulated sales total, computed once at close
    pub total_sales: f64,
    /// When the row was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Shift and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each shift belongs to one store
    #[sea_orm(
        belongs_to = "super::store::Entity",
        from = "Column::StoreId",
        to = "super::store::Column::Id"
    )]
    Store,
    /// Each shift is worked by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Store.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
