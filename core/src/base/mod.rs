//! Base numeric types and helpers

mod common;

// Re-export
pub use common::*;
