//! Common types and utilities for the Kestrel type checker.
//!
//! This crate provides foundational types used across all kestrel crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Diagnostic records and the message table
//! - Checker limits and thresholds

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostic records, codes and message templates
pub mod diagnostics;

// Centralized limits and thresholds
pub mod limits;

/// Abort on a broken checker invariant.
///
/// These are bugs in the checker itself, never user errors, so they are kept
/// distinguishable from diagnostics by a fixed message prefix.
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        panic!("internal checker error: {}", format_args!($($arg)*))
    };
}
