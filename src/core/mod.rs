//! Core business logic - framework-agnostic session operations.
//!
//! These modules implement the shift lifecycle, the visit/sale coordination
//! flow, product stock management, account handling, and the pure statistics
//! derivations. Nothing in here knows about the UI layer; everything is
//! reachable through the session controller.

/// Product catalog queries, mutations, and atomic stock decrements
pub mod product;
/// Visit creation and the transactional sale completion flow
pub mod sale;
/// Shift lifecycle: start, close, restore, and the midnight boundary
pub mod shift;
/// Pure statistics derivations over the in-memory sales collection
pub mod stats;
/// Store directory queries
pub mod store;
/// Account lookups, credential checks, and user management
pub mod user;
