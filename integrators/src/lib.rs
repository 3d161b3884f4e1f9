//! Integrators

#[macro_use]
extern crate log;

mod bdpt;
mod mlt;
mod path;
mod sbdpt;

// Re-export.
pub use bdpt::*;
pub use mlt::*;
pub use path::*;
pub use sbdpt::*;
