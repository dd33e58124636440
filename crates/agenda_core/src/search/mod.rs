//! Text search over record titles and descriptions.
//!
//! # Invariants
//! - Matching is a case-insensitive substring test; blank queries match all.

pub mod text;

pub use text::TextQuery;
