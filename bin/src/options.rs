//! Command line options

use clap::{Parser, ValueEnum};

/// Integrators selectable from the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum IntegratorKind {
    /// Naive path tracer.
    Naive,

    /// Path tracer with one shadow ray per bounce.
    Shadow,

    /// Path tracer with multiple importance sampling.
    Mis,

    /// Stratified bidirectional path tracer.
    Sbdpt,

    /// Multiplexed Metropolis light transport.
    Mmlt,
}

/// Renderer options.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// Integrator to render with.
    #[arg(
        long = "integrator",
        short = 'i',
        value_enum,
        default_value_t = IntegratorKind::Mmlt,
        help = "Integrator to render with."
    )]
    pub integrator: IntegratorKind,

    /// Image width.
    #[arg(
        long = "width",
        value_name = "NUM",
        default_value_t = 512,
        value_parser = parse_resolution,
        help = "Image width in pixels."
    )]
    pub width: usize,

    /// Image height.
    #[arg(
        long = "height",
        value_name = "NUM",
        default_value_t = 512,
        value_parser = parse_resolution,
        help = "Image height in pixels."
    )]
    pub height: usize,

    /// Number of passes.
    #[arg(
        long = "passes",
        short = 'n',
        value_name = "NUM",
        default_value_t = 64,
        help = "Number of passes to run."
    )]
    pub passes: usize,

    /// Maximum path depth.
    #[arg(
        long = "maxdepth",
        value_name = "NUM",
        default_value_t = 5,
        help = "Maximum number of scattering vertices."
    )]
    pub max_depth: usize,

    /// Minimum path depth.
    #[arg(
        long = "mindepth",
        value_name = "NUM",
        default_value_t = 1,
        help = "Minimum number of scattering vertices (sbdpt, mmlt)."
    )]
    pub min_depth: usize,

    /// Sample budget.
    #[arg(
        long = "samples",
        short = 's',
        value_name = "NUM",
        default_value_t = 256 * 1024,
        help = "Paths per pass (sbdpt) or number of Markov chains (mmlt)."
    )]
    pub samples: usize,

    /// Number of burn-in iterations.
    #[arg(
        long = "burniters",
        value_name = "NUM",
        default_value_t = 64,
        help = "Number of burn-in iterations (mmlt)."
    )]
    pub burn_iters: usize,

    /// Number of threads.
    #[arg(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        default_value_t = 0,
        help = "Use specified number of threads for rendering; 0 uses all logical CPUs."
    )]
    pub n_threads: usize,

    /// Path to the image file.
    #[arg(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        default_value = "out.png",
        help = "Write the final image to the given filename."
    )]
    pub image_file: String,

    /// Seed of the random streams.
    #[arg(long = "seed", value_name = "NUM", default_value_t = 0, help = "Seed of the random streams.")]
    pub seed: u64,
}

/// Parse an image dimension, which must be at least one pixel.
///
/// * `s` - Command line value.
fn parse_resolution(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("image dimensions must be at least 1 pixel".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid image dimension '{s}': {e}")),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
