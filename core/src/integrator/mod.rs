//! Integrator

use crate::error::*;
use crate::scene::Scene;
use crate::spectrum::*;

/// Integrator interface used by the orchestration layer.
pub trait Integrator {
    /// Returns a short name for logging.
    fn name(&self) -> &'static str;

    /// Run whole passes. Cancellation is only possible between passes.
    ///
    /// * `scene`      - The scene.
    /// * `pass_count` - Number of passes to run.
    fn run_pass(&mut self, scene: &dyn Scene, pass_count: usize) -> RenderResult<()>;

    /// Resolve the accumulated estimate into an image buffer.
    ///
    /// * `out` - Output buffer with one entry per pixel.
    fn get_image(&self, out: &mut [Spectrum]) -> RenderResult<()>;

    /// Returns the number of pixels of the image.
    fn pixel_count(&self) -> usize;
}
