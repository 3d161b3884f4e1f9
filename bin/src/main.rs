#[macro_use]
extern crate log;

mod options;
mod scene;

use clap::Parser;
use integrators::*;
use light_core::app::*;
use light_core::image_io::*;
use light_core::integrator::*;
use light_core::spectrum::*;
use options::*;
use scene::*;

fn main() {
    // Initialize `env_logger`.
    env_logger::init();

    let options = Options::parse();

    // Configuration errors are fatal.
    if let Err(e) = render(&options) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn render(options: &Options) -> Result<(), String> {
    let n_threads = resolve_thread_count(options.n_threads, num_cpus::get());
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
        .map_err(|e| e.to_string())?;
    info!("Rendering with {n_threads} threads");

    let (scene, camera) = demo_scene(options.width, options.height);

    let mut integrator: Box<dyn Integrator> = match options.integrator {
        IntegratorKind::Naive => Box::new(PathIntegrator::new(PathVariant::Naive, camera, path_config(options))),
        IntegratorKind::Shadow => Box::new(PathIntegrator::new(PathVariant::Shadow, camera, path_config(options))),
        IntegratorKind::Mis => Box::new(PathIntegrator::new(PathVariant::Mis, camera, path_config(options))),
        IntegratorKind::Sbdpt => {
            let config = SbdptConfig {
                min_bounce: options.min_depth,
                max_bounce: options.max_depth,
                n_samples: options.samples,
                seed: options.seed,
            };
            Box::new(SbdptIntegrator::new(camera, config).map_err(|e| e.to_string())?)
        }
        IntegratorKind::Mmlt => {
            let config = MltConfig {
                min_bounce: options.min_depth,
                max_bounce: options.max_depth,
                n_chains: options.samples,
                burn_iters: options.burn_iters,
                seed: options.seed,
                ..MltConfig::default()
            };
            let mut mlt = MltIntegrator::new(camera, config.clone()).map_err(|e| e.to_string())?;
            mlt.run_burn_in(&scene, config.min_bounce, config.max_bounce, config.burn_iters)
                .map_err(|e| e.to_string())?;
            Box::new(mlt)
        }
    };

    info!("Running {} passes of the {}", options.passes, integrator.name());
    integrator
        .run_pass(&scene, options.passes)
        .map_err(|e| e.to_string())?;

    let mut image = vec![Spectrum::ZERO; integrator.pixel_count()];
    integrator.get_image(&mut image).map_err(|e| e.to_string())?;
    write_image(&options.image_file, &image, options.width, options.height)
}

/// Returns the path tracer settings of the options.
///
/// * `options` - The options.
fn path_config(options: &Options) -> PathConfig {
    PathConfig {
        max_depth: options.max_depth,
        seed: options.seed,
    }
}
