//! Geometry

mod frame;
mod ray;
mod vector3;

// Re-export
pub use frame::*;
pub use ray::*;
pub use vector3::*;
