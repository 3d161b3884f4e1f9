//! Core

#[macro_use]
extern crate hexf;
#[macro_use]
extern crate log;

// Re-export.
pub mod app;
pub mod base;
pub mod camera;
pub mod error;
pub mod geometry;
pub mod image_io;
pub mod integrator;
pub mod interaction;
pub mod parallel;
pub mod rng;
pub mod sampling;
pub mod scene;
pub mod screen;
pub mod spectrum;
