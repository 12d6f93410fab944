//! Store entity - Represents one retail location.
//!
//! Stores scope products, sales, visits and shifts. Sellers are attached to
//! exactly one store; owners see every store.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Store database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    /// Unique identifier for the store
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the store
    pub name: String,
    /// Street address, if recorded
    pub address: Option<String>,
    /// Contact phone number, if recorded
    pub phone: Option<String>,
    /// When the store was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Store and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One store has many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    /// One store has many sales
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
    /// One store has many shifts
    #[sea_orm(has_many = "super::shift::Entity")]
    Shifts,
    /// One store has many visits
    #[sea_orm(has_many = "super::visit::Entity")]
    Visits,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl Related<super::shift::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shifts.def()
    }
}

impl Related<super::visit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Visits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
