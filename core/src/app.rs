//! Application related stuff

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Create a progress bar for a long running phase (burn-in, pass loop). The bar is hidden when the log level is
/// above `info` so tests and quiet runs stay silent.
///
/// * `len` - Total number of steps.
pub fn create_progress_bar(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    if !log_enabled!(log::Level::Info) {
        progress.set_draw_target(ProgressDrawTarget::hidden());
    }
    let style = ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}");
    match style {
        Ok(style) => progress.set_style(style.progress_chars("##-")),
        Err(e) => warn!("Invalid progress bar template: {e}"),
    }
    progress
}

/// Returns the number of worker threads to use for a requested count.
///
/// * `requested`   - Requested number of threads; 0 selects all logical CPUs.
/// * `max_threads` - Number of logical CPUs.
pub fn resolve_thread_count(requested: usize, max_threads: usize) -> usize {
    match requested {
        0 => max_threads,
        n if n > max_threads => {
            warn!("Num threads > max logical CPUs {max_threads}");
            max_threads
        }
        n => n,
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_count_is_clamped_to_cpus() {
        assert_eq!(resolve_thread_count(0, 8), 8);
        assert_eq!(resolve_thread_count(4, 8), 4);
        assert_eq!(resolve_thread_count(64, 8), 8);
    }
}
