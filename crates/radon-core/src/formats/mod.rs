//! # Formats Module
//!
//! Serialization formats for persisted campaign data.
//!
//! Pure transformations only: byte and string conversion lives here, file
//! and database I/O lives in [`crate::storage`] and in the app layer.

mod persistence;

pub use persistence::*;
