//! `Tillpoint` - The session core of a retail point-of-sale client
//!
//! This crate implements the shift/visit/sale lifecycle over a hosted
//! relational backend: sellers start and end work shifts, record visits and
//! completed sales against a product catalog, and owners review aggregated
//! statistics. The core is offline-aware - mutating operations gate on a
//! connectivity signal, a local cache keeps the last-known stores list and
//! active shift across restarts, and shift closure obligations that arise
//! while offline are retried until connectivity returns.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    // Documentation - missing docs should be added gradually
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,
    clippy::nursery,

    // Performance
    clippy::inefficient_to_string,
    clippy::large_types_passed_by_value,
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Complexity and readability
    clippy::cognitive_complexity,
    clippy::large_enum_variant,
    clippy::match_same_arms,
    clippy::too_many_lines,

    // Style consistency
    clippy::enum_glob_use,
    clippy::inconsistent_struct_constructor,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::missing_panics_doc,        // Will add gradually
)]

/// Local JSON snapshot cache for restart and offline resilience
pub mod cache;
/// Configuration management for database and application settings
pub mod config;
/// Connectivity monitor publishing the online/offline signal
pub mod connectivity;
/// Core business logic - shift, sale, product, and statistics operations
pub mod core;
/// Best-effort diagnostics sink for opaque gateway errors
pub mod diagnostics;
/// SeaORM entity definitions for backend tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Session state and the controller that owns it
pub mod session;

#[cfg(test)]
pub mod test_utils;
