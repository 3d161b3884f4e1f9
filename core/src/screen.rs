//! Screen accumulator

use crate::base::*;
use crate::error::*;
use crate::parallel::*;
use crate::spectrum::*;
use std::sync::atomic::Ordering;

/// How accumulated sums turn into pixel values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ResolveMode {
    /// Per-pixel weighted average. With unit weights and one sample per pixel per pass this is the running
    /// average with weight `1/(spp+1)` for the newest pass.
    Average,

    /// Sums scaled by a global factor; used for splatting integrators.
    Splat { scale: Float },
}

/// One pixel of the accumulator.
#[derive(Clone, Default)]
struct AccumPixel {
    /// Weighted RGB sums.
    rgb: [AtomicFloat; RGB_SAMPLES],

    /// Sum of the weights.
    weight: AtomicFloat,
}

/// Per-pixel radiance sums. Updates are atomic additions only so passes can splat concurrently and in any
/// order.
pub struct ScreenAccumulator {
    /// Image width.
    pub width: usize,

    /// Image height.
    pub height: usize,

    /// Pixels.
    pixels: Vec<AccumPixel>,
}

impl ScreenAccumulator {
    /// Create a new accumulator with all sums zero.
    ///
    /// * `width`  - Image width.
    /// * `height` - Image height.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![AccumPixel::default(); width * height],
        }
    }

    /// Returns the number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Merge a weighted contribution into a pixel. Non-finite contributions are dropped.
    ///
    /// * `contribution` - Radiance sample.
    /// * `pixel`        - Pixel index.
    /// * `weight`       - Weight of the sample.
    pub fn accumulate(&self, contribution: &Spectrum, pixel: usize, weight: Float) {
        let Some(p) = self.pixels.get(pixel) else {
            warn!("Contribution for pixel {pixel} outside of the {}x{} screen", self.width, self.height);
            return;
        };
        if contribution.has_nans() || !weight.is_finite() {
            return;
        }
        for (sum, c) in p.rgb.iter().zip(contribution.c.iter()) {
            if *c != 0.0 {
                sum.add(c * weight);
            }
        }
        p.weight.add(weight);
    }

    /// Returns the weighted sum and the weight of a pixel.
    ///
    /// * `pixel` - Pixel index.
    pub fn pixel_sum(&self, pixel: usize) -> (Spectrum, Float) {
        let p = &self.pixels[pixel];
        let rgb = Spectrum::from_rgb(
            p.rgb[0].load(Ordering::Relaxed),
            p.rgb[1].load(Ordering::Relaxed),
            p.rgb[2].load(Ordering::Relaxed),
        );
        (rgb, p.weight.load(Ordering::Relaxed))
    }

    /// Resolve the sums into an image buffer.
    ///
    /// * `mode` - Resolve mode.
    /// * `out`  - Output buffer with one entry per pixel.
    pub fn get_image(&self, mode: ResolveMode, out: &mut [Spectrum]) -> RenderResult<()> {
        if out.len() != self.pixels.len() {
            return Err(RenderError::BufferSizeMismatch {
                expected: self.pixels.len(),
                actual: out.len(),
            });
        }
        self.resolve_into(mode, out);
        Ok(())
    }

    /// Resolve the sums into a new image buffer.
    ///
    /// * `mode` - Resolve mode.
    pub fn resolve(&self, mode: ResolveMode) -> Vec<Spectrum> {
        let mut out = vec![Spectrum::ZERO; self.pixels.len()];
        self.resolve_into(mode, &mut out);
        out
    }

    fn resolve_into(&self, mode: ResolveMode, out: &mut [Spectrum]) {
        for (i, o) in out.iter_mut().enumerate() {
            let (sum, weight) = self.pixel_sum(i);
            *o = match mode {
                ResolveMode::Average if weight > 0.0 => sum / weight,
                ResolveMode::Average => Spectrum::ZERO,
                ResolveMode::Splat { scale } => sum * scale,
            };
        }
    }

    /// Clear all sums.
    pub fn reset(&self) {
        for p in self.pixels.iter() {
            for c in p.rgb.iter() {
                c.store(0.0, Ordering::Relaxed);
            }
            p.weight.store(0.0, Ordering::Relaxed);
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
