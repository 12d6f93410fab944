//! Account business logic - lookups, credential checks, and user management.
//!
//! Passwords are stored as SHA-256 hex digests and compared digest-to-digest;
//! the clear text never leaves the login call. Registration normalizes the
//! login (trimmed, lowercased) and enforces uniqueness before inserting.

use crate::{
    entities::{Role, User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use sha2::{Digest, Sha256};

/// Computes the SHA-256 hex digest used for stored credentials.
#[must_use]
pub fn password_digest(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Normalizes a login the way it is stored: trimmed and lowercased.
#[must_use]
pub fn normalize_login(login: &str) -> String {
    login.trim().to_lowercase()
}

/// Retrieves all user accounts, ordered by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an account by its normalized login.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_user_by_login(
    db: &DatabaseConnection,
    login: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Login.eq(normalize_login(login)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Checks a login/password pair and returns the matching account.
///
/// # Errors
/// Returns [`Error::InvalidCredentials`] when the login is unknown or the
/// password digest does not match, or a database error if the lookup fails.
pub async fn verify_credentials(
    db: &DatabaseConnection,
    login: &str,
    password: &str,
) -> Result<user::Model> {
    let user = find_user_by_login(db, login)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if user.password_digest != password_digest(password) {
        return Err(Error::InvalidCredentials);
    }

    Ok(user)
}

/// Registers a new seller account.
///
/// The login is normalized and checked for uniqueness first; the password is
/// digested before it is stored.
///
/// # Errors
/// Returns [`Error::LoginTaken`] when the login already exists, or a
/// database error if the insert fails.
pub async fn register_user(
    db: &DatabaseConnection,
    login: &str,
    password: &str,
    name: String,
    role: Role,
    store_id: Option<i64>,
) -> Result<user::Model> {
    let login = normalize_login(login);

    if find_user_by_login(db, &login).await?.is_some() {
        return Err(Error::LoginTaken { login });
    }

    let model = user::ActiveModel {
        store_id: Set(store_id),
        login: Set(login),
        password_digest: Set(password_digest(password)),
        name: Set(name),
        role: Set(role),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Deletes a user account by id.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    User::delete_by_id(user_id).exec(db).await?;
    Ok(())
}
