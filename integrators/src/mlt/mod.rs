//! Multiplexed Metropolis Light Transport
//!
//! Runs one Markov chain per sample slot over primary sample space, with the bidirectional evaluator as the
//! contribution function. Every chain keeps a fixed target depth chosen by burn-in; chains are stored sorted by
//! descending depth so per-bounce dispatches cover contiguous prefixes.

mod burn_in;
mod chain;
mod mutation;

use crate::bdpt::*;
use light_core::app::*;
use light_core::base::*;
use light_core::camera::*;
use light_core::error::*;
use light_core::integrator::*;
use light_core::parallel::*;
use light_core::rng::*;
use light_core::sampling::*;
use light_core::scene::*;
use light_core::screen::*;
use light_core::spectrum::*;
use rayon::prelude::*;

// Re-export
pub use burn_in::*;
pub use chain::*;
pub use mutation::*;

/// Metropolis sampler settings.
#[derive(Clone, Debug, PartialEq)]
pub struct MltConfig {
    /// Minimum number of scattering vertices.
    pub min_bounce: usize,

    /// Maximum number of scattering vertices.
    pub max_bounce: usize,

    /// Number of Markov chains; rounded down to whole dispatch blocks per depth.
    pub n_chains: usize,

    /// Number of burn-in iterations.
    pub burn_iters: usize,

    /// Every `large_step_period`-th pass proposes large steps.
    pub large_step_period: usize,

    /// Standard deviation of small steps.
    pub sigma: Float,

    /// Seed of all random streams.
    pub seed: u64,
}

impl Default for MltConfig {
    fn default() -> Self {
        Self {
            min_bounce: 1,
            max_bounce: 5,
            n_chains: 256 * 1024,
            burn_iters: BURN_ITERS,
            large_step_period: 3,
            sigma: 0.01,
            seed: 0,
        }
    }
}

/// Multiplexed Metropolis light transport over stratified bidirectional paths.
pub struct MltIntegrator {
    /// Settings.
    config: MltConfig,

    /// Contribution function.
    evaluator: SbdptEvaluator,

    /// Depth of every chain, sorted by descending depth.
    split: Vec<SplitData>,

    /// Dispatch sizes and normalization.
    tables: DepthTables,

    /// Current states, slot-major.
    x: Vec<Float>,

    /// Proposed states, slot-major.
    y: Vec<Float>,

    /// Per-chain cache and random stream.
    chains: Vec<ChainState>,

    /// Evaluations of the proposed states.
    proposals: Vec<PathSample>,

    /// Splatted contributions.
    screen: ScreenAccumulator,

    /// Sum of the luminance of all burn-in and large step evaluations.
    brightness_sum: f64,

    /// Number of evaluations in `brightness_sum`.
    brightness_count: u64,

    /// Number of mutations splatted since burn-in.
    total_mutations: u64,

    /// Number of passes since burn-in.
    passes: u64,

    /// Fraction of accepted proposals in the last pass.
    last_acceptance_rate: Float,

    /// Burn-in has run.
    burned_in: bool,
}

impl MltIntegrator {
    /// Create a new `MltIntegrator`. Burn-in must run before the first pass.
    ///
    /// * `camera` - The camera.
    /// * `config` - Settings.
    pub fn new(camera: Camera, config: MltConfig) -> RenderResult<Self> {
        let evaluator = SbdptEvaluator::new(camera, config.min_bounce, config.max_bounce)?;
        let tables = DepthTables::new(config.min_bounce, config.max_bounce);
        Ok(Self {
            screen: ScreenAccumulator::new(camera.width, camera.height),
            config,
            evaluator,
            split: Vec::new(),
            tables,
            x: Vec::new(),
            y: Vec::new(),
            chains: Vec::new(),
            proposals: Vec::new(),
            brightness_sum: 0.0,
            brightness_count: 0,
            total_mutations: 0,
            passes: 0,
            last_acceptance_rate: 0.0,
            burned_in: false,
        })
    }

    /// Returns the settings.
    pub fn config(&self) -> &MltConfig {
        &self.config
    }

    /// Returns the number of chains.
    pub fn chain_count(&self) -> usize {
        self.split.len()
    }

    /// Returns the dispatch sizes and normalization in use.
    pub fn depth_tables(&self) -> &DepthTables {
        &self.tables
    }

    /// Returns the depth assignment of the chains.
    pub fn split_data(&self) -> &[SplitData] {
        &self.split
    }

    /// Returns the average image brightness estimated so far.
    pub fn brightness(&self) -> Float {
        if self.brightness_count > 0 {
            (self.brightness_sum / self.brightness_count as f64) as Float
        } else {
            0.0
        }
    }

    /// Returns the fraction of proposals accepted in the last pass.
    pub fn last_acceptance_rate(&self) -> Float {
        self.last_acceptance_rate
    }

    /// Returns the number of mutations splatted since burn-in.
    pub fn total_mutations(&self) -> u64 {
        self.total_mutations
    }

    /// Seed the chains. Evaluates `iterations` batches of independent primary sample vectors over a uniform depth
    /// stratification, resamples chain states proportionally to their luminance, sorts them by descending depth and
    /// derives the per-depth normalization from the resulting depth frequencies. Clears the image.
    ///
    /// * `scene`      - The scene.
    /// * `min_bounce` - Minimum depth.
    /// * `max_bounce` - Maximum depth.
    /// * `iterations` - Number of burn-in iterations.
    pub fn run_burn_in(
        &mut self,
        scene: &dyn Scene,
        min_bounce: usize,
        max_bounce: usize,
        iterations: usize,
    ) -> RenderResult<()> {
        if min_bounce != self.evaluator.min_bounce() || max_bounce != self.evaluator.max_bounce() {
            self.evaluator = SbdptEvaluator::new(*self.evaluator.camera(), min_bounce, max_bounce)?;
        }
        self.config.min_bounce = min_bounce;
        self.config.max_bounce = max_bounce;

        let (mut split, mut tables) = init_split_data_uniform(min_bounce, max_bounce, self.config.n_chains)?;
        let n = split.len();
        let stride = self.evaluator.layout().len();
        let iterations = clamp(iterations, 1, n);
        let seed = self.config.seed;

        info!("Burn-in: {iterations} iterations over {n} chains");
        if scene.light_count() == 0 {
            warn!("Scene has no lights; every chain will carry zero luminance");
        }

        self.x = vec![0.0; n * stride];
        self.proposals = vec![PathSample::default(); n];
        self.brightness_sum = 0.0;
        self.brightness_count = 0;

        let mut selector = ProportionalSelector::new(n);
        let mut fresh = FreshStates::new(n, stride);
        let mut select_rng = RNG::with_seed(!seed, 0);

        let progress = create_progress_bar(iterations as u64);
        progress.set_message("Burn-in");
        for it in 0..iterations {
            let first = (it * n) as u64;
            launch_strided(&mut self.x, stride, |i, x| {
                RNG::with_seed(seed, first + i as u64).fill_uniform(x);
            });
            self.evaluator
                .evaluate(scene, &self.x, &split, &tables, &mut self.proposals)?;

            self.brightness_sum += deterministic_sum_by(&self.proposals, |p| luminance(&p.contribution));
            self.brightness_count += n as u64;

            selector.load(self.proposals.iter().map(|p| luminance(&p.contribution)));
            fresh.select(
                &selector,
                &self.x,
                &split,
                burn_portion(n, iterations, it),
                &mut select_rng,
            );
            progress.inc(1);
        }
        progress.finish_and_clear();

        fresh.commit(&mut self.x, &mut split);
        tables.recompute_active_threads(&split);
        scale_from_population(&mut tables, &split);
        for d in min_bounce..=max_bounce {
            debug!(
                "  depth {d}: chains = {}, scale = {}",
                tables.active_threads(d) - tables.active_threads(d + 1),
                tables.scale(d)
            );
        }

        // Cache the contributions of the seeded states under the new normalization.
        self.evaluator
            .evaluate(scene, &self.x, &split, &tables, &mut self.proposals)?;
        self.chains = (0..n)
            .map(|i| {
                let mut chain = ChainState::new(RNG::with_seed(seed, (iterations * n + i) as u64));
                chain.set_current(&self.proposals[i]);
                chain
            })
            .collect();

        self.y = self.x.clone();
        self.split = split;
        self.tables = tables;
        self.screen.reset();
        self.total_mutations = 0;
        self.passes = 0;
        self.last_acceptance_rate = 0.0;
        self.burned_in = true;

        info!("Burn-in complete: brightness = {}", self.brightness());
        Ok(())
    }

    /// Run one Metropolis pass: propose, evaluate, splat and accept or reject for every chain.
    ///
    /// * `scene` - The scene.
    fn mutate_pass(&mut self, scene: &dyn Scene) -> RenderResult<()> {
        let stride = self.evaluator.layout().len();
        let mutation = Mutation::scheduled(self.passes, self.config.large_step_period, self.config.sigma);

        self.y
            .par_chunks_mut(stride)
            .zip(self.x.par_chunks(stride))
            .zip(self.chains.par_iter_mut())
            .for_each(|((y, x), chain)| mutation.propose(&mut chain.rng, x, y));

        self.evaluator
            .evaluate(scene, &self.y, &self.split, &self.tables, &mut self.proposals)?;

        if mutation.is_large_step() {
            self.brightness_sum += deterministic_sum_by(&self.proposals, |p| luminance(&p.contribution));
            self.brightness_count += self.proposals.len() as u64;
        }

        let screen = &self.screen;
        let accepted: usize = self
            .x
            .par_chunks_mut(stride)
            .zip(self.y.par_chunks(stride))
            .zip(self.chains.par_iter_mut())
            .zip(self.proposals.par_iter())
            .map(|(((x, y), chain), proposal)| {
                if chain.step(proposal, screen) {
                    x.copy_from_slice(y);
                    1
                } else {
                    0
                }
            })
            .sum();

        let n = self.chains.len();
        self.total_mutations += n as u64;
        self.passes += 1;
        self.last_acceptance_rate = accepted as Float / max(n, 1) as Float;
        debug!(
            "Pass {}: {} step, acceptance = {:.4}, brightness = {}",
            self.passes,
            if mutation.is_large_step() { "large" } else { "small" },
            self.last_acceptance_rate,
            self.brightness()
        );
        Ok(())
    }
}

impl Integrator for MltIntegrator {
    fn name(&self) -> &'static str {
        "multiplexed MLT"
    }

    fn run_pass(&mut self, scene: &dyn Scene, pass_count: usize) -> RenderResult<()> {
        if !self.burned_in {
            return Err(RenderError::BurnInNotRun);
        }
        let progress = create_progress_bar(pass_count as u64);
        progress.set_message("Mutating chains");
        for _ in 0..pass_count {
            self.mutate_pass(scene)?;
            progress.inc(1);
        }
        progress.finish_and_clear();
        info!(
            "{}: passes = {}, mutations = {}, acceptance = {:.4}",
            self.name(),
            self.passes,
            self.total_mutations,
            self.last_acceptance_rate
        );
        Ok(())
    }

    fn get_image(&self, out: &mut [Spectrum]) -> RenderResult<()> {
        let scale = if self.total_mutations > 0 {
            self.brightness() * self.pixel_count() as Float / self.total_mutations as Float
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

#[cfg(test)]
mod tests {
    use super::*;
    use light_core::geometry::*;

    fn camera() -> Camera {
        Camera::new(
            Point3f::new(0.0, -3.0, 1.5),
            Point3f::zero(),
            Vector3f::new(0.0, 0.0, 1.0),
            45.0,
            8,
            8,
        )
    }

    fn scene() -> AnalyticScene {
        let mut scene = AnalyticScene::default();
        let white = scene.add_material(Material::Lambertian {
            albedo: Spectrum::new(0.6),
        });
        scene.add_plane(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), white);
        scene.add_point_light(Point3f::new(0.0, 0.0, 1.0), Spectrum::new(4.0));
        scene
    }

    fn config() -> MltConfig {
        MltConfig {
            min_bounce: 1,
            max_bounce: 2,
            n_chains: 1024,
            burn_iters: 8,
            seed: 5,
            ..MltConfig::default()
        }
    }

    #[test]
    fn passes_require_burn_in() {
        let mut mlt = MltIntegrator::new(camera(), config()).unwrap();
        assert_eq!(mlt.run_pass(&scene(), 1), Err(RenderError::BurnInNotRun));
    }

    #[test]
    fn burn_in_sorts_chains_by_descending_depth() {
        let scene = scene();
        let mut mlt = MltIntegrator::new(camera(), config()).unwrap();
        mlt.run_burn_in(&scene, 1, 2, 8).unwrap();

        assert_eq!(mlt.chain_count(), 1024);
        let split = mlt.split_data();
        assert!(split.windows(2).all(|w| w[0].target_depth >= w[1].target_depth));
        assert_eq!(mlt.depth_tables().active_threads(1), 1024);
        assert!(mlt.brightness() > 0.0);
        assert!(mlt.chains.iter().any(|c| c.luminance > 0.0));
    }

    #[test]
    fn passes_splat_and_track_acceptance() {
        let scene = scene();
        let mut mlt = MltIntegrator::new(camera(), config()).unwrap();
        mlt.run_burn_in(&scene, 1, 2, 8).unwrap();
        mlt.run_pass(&scene, 3).unwrap();

        assert_eq!(mlt.total_mutations(), 3 * 1024);
        let rate = mlt.last_acceptance_rate();
        assert!((0.0..=1.0).contains(&rate));

        let mut image = vec![Spectrum::ZERO; mlt.pixel_count()];
        mlt.get_image(&mut image).unwrap();
        assert!(image.iter().any(|p| !p.is_black()));
        assert!(image.iter().all(|p| !p.has_nans()));

        let mut wrong = vec![Spectrum::ZERO; 3];
        assert!(mlt.get_image(&mut wrong).is_err());
    }

    #[test]
    fn unlit_scene_burns_in_to_black() {
        let mut dark = AnalyticScene::default();
        let white = dark.add_material(Material::Lambertian {
            albedo: Spectrum::new(0.6),
        });
        dark.add_plane(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), white);
        assert_eq!(dark.light_count(), 0);

        let mut mlt = MltIntegrator::new(camera(), config()).unwrap();
        mlt.run_burn_in(&dark, 1, 2, 4).unwrap();
        assert_eq!(mlt.brightness(), 0.0);
        mlt.run_pass(&dark, 2).unwrap();

        let mut image = vec![Spectrum::ZERO; mlt.pixel_count()];
        mlt.get_image(&mut image).unwrap();
        assert!(image.iter().all(|p| p.is_black()));
    }
}
