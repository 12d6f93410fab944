//! Unified error types and result handling for the session core.
//!
//! Gateway-level failures are converted into these domain errors before they
//! reach any caller; raw transport errors never escape the core. Validation
//! and invariant violations are rejected before any network write is
//! attempted.

use thiserror::Error;

/// All errors the session core can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or parsing failed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of what went wrong
        message: String,
    },

    /// A mutating operation was attempted while offline
    #[error("Cannot reach the backend while offline")]
    Offline,

    /// No user is logged in for an operation that requires one
    #[error("No authenticated user")]
    NotAuthenticated,

    /// No store is selected for a store-scoped operation
    #[error("No store selected")]
    NoStoreSelected,

    /// Login failed: unknown login or wrong password
    #[error("Unknown login or wrong password")]
    InvalidCredentials,

    /// Registration rejected because the login is already taken
    #[error("Login '{login}' is already taken")]
    LoginTaken {
        /// The conflicting login
        login: String,
    },

    /// A sale total must be positive and finite
    #[error("Invalid sale amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A sale was submitted with no items
    #[error("Cannot complete a sale with no items")]
    EmptyCart,

    /// Item line totals do not add up to the submitted total
    #[error("Items sum to {items_total} with discount {discount}, but total is {total_amount}")]
    TotalMismatch {
        /// Sum of the item line totals
        items_total: f64,
        /// Discount applied before submission
        discount: f64,
        /// Total the caller submitted
        total_amount: f64,
    },

    /// A sale would take a product's stock below zero
    #[error("Not enough stock for '{name}': {available} left, {requested} requested")]
    InsufficientStock {
        /// Product display name
        name: String,
        /// Units currently in stock
        available: i32,
        /// Units the sale asked for
        requested: i32,
    },

    /// A shift is already active for this session
    #[error("Shift {shift_id} is already active")]
    ShiftAlreadyActive {
        /// The active shift's id
        shift_id: i64,
    },

    /// An operation that needs an active shift found none
    #[error("No active shift")]
    NoActiveShift,

    /// A debounced operation was repeated inside its cooldown window
    #[error("Please wait {remaining_ms}ms before repeating this action")]
    CooldownActive {
        /// Milliseconds left in the cooldown window
        remaining_ms: u64,
    },

    /// An overlapping call was rejected by the in-flight guard
    #[error("Another {operation} is still in progress")]
    OperationInFlight {
        /// Name of the guarded operation
        operation: &'static str,
    },

    /// The referenced visit does not exist
    #[error("Visit {id} not found")]
    VisitNotFound {
        /// The missing visit's id
        id: i64,
    },

    /// The referenced visit already has a linked sale
    #[error("Visit {id} already has a completed sale")]
    VisitAlreadyCompleted {
        /// The visit's id
        id: i64,
    },

    /// Persistence gateway failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Local cache or filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local cache serialization failure
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
