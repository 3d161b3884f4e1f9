//! Parallel execution helpers

mod atomic_float;
mod launch;

// Re-export
pub use atomic_float::*;
pub use launch::*;
