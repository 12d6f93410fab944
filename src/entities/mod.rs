//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the backend tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod product;
pub mod sale;
pub mod shift;
pub mod store;
pub mod user;
pub mod visit;

// Re-export specific types to avoid conflicts
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use sale::{
    Column as SaleColumn, Entity as Sale, Model as SaleModel, PaymentMethod, SaleItem, SaleItems,
};
pub use shift::{Column as ShiftColumn, Entity as Shift, Model as ShiftModel};
pub use store::{Column as StoreColumn, Entity as Store, Model as StoreModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
pub use visit::{Column as VisitColumn, Entity as Visit, Model as VisitModel};
