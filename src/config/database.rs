//! Database configuration module for the session core.
//!
//! This module handles backend connection and table creation using `SeaORM`.
//! Production deployments point `DATABASE_URL` at the hosted Postgres
//! backend; tests and offline development fall back to a local `SQLite`
//! file. Table creation uses `SeaORM`'s `Schema::create_table_from_entity`
//! so the schema always matches the entity definitions without manual SQL.

use crate::entities::{Product, Sale, Shift, Store, User, Visit};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns the default
/// local `SQLite` path.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/tillpoint.sqlite?mode=rwc".to_string())
}

/// Establishes a connection to the configured backend.
///
/// # Errors
/// Returns an error if the connection cannot be established.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all necessary tables using `SeaORM`'s schema generation from the
/// entity definitions.
///
/// Hosted backends normally have the schema migrated out-of-band; this is
/// used for local `SQLite` databases and the in-memory test databases.
///
/// # Errors
/// Returns an error if any `CREATE TABLE` statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Referenced tables first: visits carry a foreign key to sales
    let store_table = schema.create_table_from_entity(Store);
    let user_table = schema.create_table_from_entity(User);
    let product_table = schema.create_table_from_entity(Product);
    let shift_table = schema.create_table_from_entity(Shift);
    let sale_table = schema.create_table_from_entity(Sale);
    let visit_table = schema.create_table_from_entity(Visit);

    db.execute(builder.build(&store_table)).await?;
    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&product_table)).await?;
    db.execute(builder.build(&shift_table)).await?;
    db.execute(builder.build(&sale_table)).await?;
    db.execute(builder.build(&visit_table)).await?;

    Ok(())
}
