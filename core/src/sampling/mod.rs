//! Sampling

mod common;
mod reduce;
mod scan;

// Re-export
pub use common::*;
pub use reduce::*;
pub use scan::*;
