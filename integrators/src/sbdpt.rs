//! Stratified Bidirectional Path Tracer

use crate::bdpt::*;
use light_core::app::*;
use light_core::base::*;
use light_core::camera::*;
use light_core::error::*;
use light_core::integrator::*;
use light_core::parallel::*;
use light_core::rng::*;
use light_core::scene::*;
use light_core::screen::*;
use light_core::spectrum::*;
use rayon::prelude::*;

/// Stratified BDPT settings.
#[derive(Clone, Debug, PartialEq)]
pub struct SbdptConfig {
    /// Minimum number of scattering vertices.
    pub min_bounce: usize,

    /// Maximum number of scattering vertices.
    pub max_bounce: usize,

    /// Number of paths per pass; rounded down to whole dispatch blocks per depth.
    pub n_samples: usize,

    /// Seed of the primary sample streams.
    pub seed: u64,
}

impl Default for SbdptConfig {
    fn default() -> Self {
        Self {
            min_bounce: 1,
            max_bounce: 5,
            n_samples: 256 * 256,
            seed: 0,
        }
    }
}

/// Bidirectional path tracer that draws fresh primary sample vectors every pass and splats every path with unit
/// weight. Depths are stratified uniformly over the sample slots.
pub struct SbdptIntegrator {
    /// Settings.
    config: SbdptConfig,

    /// Path evaluator.
    evaluator: SbdptEvaluator,

    /// Depth assignments.
    split: Vec<SplitData>,

    /// Dispatch sizes and normalization.
    tables: DepthTables,

    /// Primary sample vectors of the current pass.
    pss: Vec<Float>,

    /// Results of the current pass.
    samples: Vec<PathSample>,

    /// Splatted contributions.
    screen: ScreenAccumulator,

    /// Completed passes.
    passes: u64,
}

impl SbdptIntegrator {
    /// Create a new `SbdptIntegrator`.
    ///
    /// * `camera` - The camera.
    /// * `config` - Settings.
    pub fn new(camera: Camera, config: SbdptConfig) -> RenderResult<Self> {
        let (split, tables) = init_split_data_uniform(config.min_bounce, config.max_bounce, config.n_samples)?;
        let screen = ScreenAccumulator::new(camera.width, camera.height);
        let evaluator = SbdptEvaluator::new(camera, config.min_bounce, config.max_bounce)?;
        let n = split.len();
        Ok(Self {
            pss: vec![0.0; n * evaluator.layout().len()],
            samples: vec![PathSample::default(); n],
            config,
            evaluator,
            split,
            tables,
            screen,
            passes: 0,
        })
    }

    /// Returns the number of paths traced per pass.
    pub fn samples_per_pass(&self) -> usize {
        self.split.len()
    }

    /// Returns the number of completed passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Draw primary samples, evaluate them and splat the results.
    ///
    /// * `scene` - The scene.
    fn trace_pass(&mut self, scene: &dyn Scene) -> RenderResult<()> {
        let n = self.split.len() as u64;
        let seed = self.config.seed;
        let first = self.passes * n;
        launch_strided(&mut self.pss, self.evaluator.layout().len(), |i, x| {
            RNG::with_seed(seed, first + i as u64).fill_uniform(x);
        });

        self.evaluator
            .evaluate(scene, &self.pss, &self.split, &self.tables, &mut self.samples)?;

        let screen = &self.screen;
        self.samples
            .par_iter()
            .for_each(|s| screen.accumulate(&s.contribution, s.pixel, 1.0));
        Ok(())
    }
}

impl Integrator for SbdptIntegrator {
    fn name(&self) -> &'static str {
        "stratified BDPT"
    }

    fn run_pass(&mut self, scene: &dyn Scene, pass_count: usize) -> RenderResult<()> {
        let progress = create_progress_bar(pass_count as u64);
        progress.set_message("Tracing paths");
        for _ in 0..pass_count {
            self.trace_pass(scene)?;
            self.passes += 1;
            progress.inc(1);
        }
        progress.finish_and_clear();
        info!(
            "{}: passes = {}, paths per pass = {}",
            self.name(),
            self.passes,
            self.split.len()
        );
        Ok(())
    }

    fn get_image(&self, out: &mut [Spectrum]) -> RenderResult<()> {
        let total = self.passes * self.split.len() as u64;
        let scale = if total > 0 {
            self.pixel_count() as Float / total as Float
        } else {
            0.0
        };
        self.screen.get_image(ResolveMode::Splat { scale }, out)
    }

    fn pixel_count(&self) -> usize {
        self.evaluator.camera().pixel_count()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
