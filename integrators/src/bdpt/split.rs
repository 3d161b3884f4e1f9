//! Depth stratification

use super::pss::strategy_count;
use light_core::base::*;
use light_core::error::*;
use light_core::parallel::*;

/// Target and progress of one sample slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitData {
    /// Number of scattering vertices of the path assigned to the slot.
    pub target_depth: usize,

    /// Number of camera subpath vertices traced so far in the current pass.
    pub current_depth: usize,
}

impl SplitData {
    /// Create a new `SplitData` for a slot that has not been traced yet.
    ///
    /// * `target_depth` - Assigned depth.
    pub fn new(target_depth: usize) -> Self {
        Self {
            target_depth,
            current_depth: 0,
        }
    }
}

/// Per-depth dispatch sizes and normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthTables {
    /// Minimum depth.
    pub min_bounce: usize,

    /// Maximum depth.
    pub max_bounce: usize,

    /// Number of leading slots whose target depth is at least `d`.
    pub active_threads: Vec<usize>,

    /// Inverse probability of drawing a (depth, strategy) pair of depth `d`.
    pub scale_table: Vec<Float>,
}

impl DepthTables {
    /// Create tables with no active slots and unit scale.
    ///
    /// * `min_bounce` - Minimum depth.
    /// * `max_bounce` - Maximum depth.
    pub fn new(min_bounce: usize, max_bounce: usize) -> Self {
        Self {
            min_bounce,
            max_bounce,
            active_threads: vec![0; max_bounce + 2],
            scale_table: vec![1.0; max_bounce + 2],
        }
    }

    /// Returns the number of distinct depths.
    pub fn num_depths(&self) -> usize {
        self.max_bounce + 1 - self.min_bounce
    }

    /// Returns the number of leading slots that still trace vertex `depth`.
    ///
    /// * `depth` - The depth.
    pub fn active_threads(&self, depth: usize) -> usize {
        self.active_threads.get(depth).copied().unwrap_or(0)
    }

    /// Returns the normalization of paths with `depth` scattering vertices.
    ///
    /// * `depth` - The depth.
    pub fn scale(&self, depth: usize) -> Float {
        self.scale_table.get(depth).copied().unwrap_or(0.0)
    }

    /// Count the slots reaching every depth. Slots must be sorted by descending target depth for the counts to
    /// describe contiguous prefixes.
    ///
    /// * `split` - Slot assignments.
    pub fn recompute_active_threads(&mut self, split: &[SplitData]) {
        debug_assert!(split.windows(2).all(|w| w[0].target_depth >= w[1].target_depth));
        for (d, active) in self.active_threads.iter_mut().enumerate() {
            *active = split.partition_point(|s| s.target_depth >= d);
        }
    }

    /// Set the initial normalization `strategy_count(d) * num_depths`, the inverse probability of a
    /// (depth, strategy) pair under uniform depth stratification.
    pub fn set_uniform_scale(&mut self) {
        let num_depths = self.num_depths() as Float;
        for (d, scale) in self.scale_table.iter_mut().enumerate() {
            *scale = strategy_count(d) as Float * num_depths;
        }
    }
}

/// Validate a bounce range.
///
/// * `min_bounce` - Minimum depth.
/// * `max_bounce` - Maximum depth.
pub fn check_depth_range(min_bounce: usize, max_bounce: usize) -> RenderResult<()> {
    if min_bounce == 0 || min_bounce > max_bounce {
        Err(RenderError::InvalidDepthRange { min_bounce, max_bounce })
    } else {
        Ok(())
    }
}

/// Assign target depths to sample slots in contiguous dispatch blocks, deepest first, with every depth getting
/// the same number of blocks. The budget is rounded down to a whole number of blocks per depth.
///
/// * `min_bounce`    - Minimum depth.
/// * `max_bounce`    - Maximum depth.
/// * `total_samples` - Requested number of slots.
pub fn init_split_data_uniform(
    min_bounce: usize,
    max_bounce: usize,
    total_samples: usize,
) -> RenderResult<(Vec<SplitData>, DepthTables)> {
    check_depth_range(min_bounce, max_bounce)?;

    let mut tables = DepthTables::new(min_bounce, max_bounce);
    let num_depths = tables.num_depths();

    let per_depth = round_down_blocks(total_samples / num_depths);
    if per_depth == 0 {
        return Err(RenderError::SampleBudgetTooSmall {
            requested: total_samples,
            required: DISPATCH_BLOCK_SIZE * num_depths,
        });
    }

    let final_size = per_depth * num_depths;
    if final_size != total_samples {
        warn!("Sample budget {total_samples} rounded down to {final_size}");
    }

    let split: Vec<SplitData> = (min_bounce..=max_bounce)
        .rev()
        .flat_map(|d| std::iter::repeat(SplitData::new(d)).take(per_depth))
        .collect();

    tables.recompute_active_threads(&split);
    tables.set_uniform_scale();

    info!("Depth stratification: {num_depths} depths x {per_depth} slots");
    for d in min_bounce..=max_bounce {
        debug!(
            "  depth {d}: active = {}, scale = {}",
            tables.active_threads(d),
            tables.scale(d)
        );
    }

    Ok((split, tables))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    #[test]
    fn deepest_blocks_come_first() {
        let (split, tables) = init_split_data_uniform(1, 3, 3 * 512).unwrap();
        assert_eq!(split.len(), 3 * 512);
        assert!(split[..512].iter().all(|s| s.target_depth == 3));
        assert!(split[512..1024].iter().all(|s| s.target_depth == 2));
        assert!(split[1024..].iter().all(|s| s.target_depth == 1));

        assert_eq!(tables.active_threads(1), 1536);
        assert_eq!(tables.active_threads(2), 1024);
        assert_eq!(tables.active_threads(3), 512);
        assert_eq!(tables.active_threads(4), 0);
        assert!(approx_eq!(f32, tables.scale(1), 9.0, ulps = 1));
        assert!(approx_eq!(f32, tables.scale(3), 15.0, ulps = 1));
    }

    #[test]
    fn budget_is_rounded_down_to_blocks() {
        let (split, tables) = init_split_data_uniform(2, 3, 1000).unwrap();
        assert_eq!(split.len(), 512);
        assert_eq!(tables.active_threads(0), 512);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert_eq!(
            init_split_data_uniform(0, 3, 4096),
            Err(RenderError::InvalidDepthRange {
                min_bounce: 0,
                max_bounce: 3
            })
        );
        assert!(init_split_data_uniform(4, 3, 4096).is_err());
        assert_eq!(
            init_split_data_uniform(1, 5, 1000),
            Err(RenderError::SampleBudgetTooSmall {
                requested: 1000,
                required: 1280
            })
        );
    }

    proptest! {
        #[test]
        fn active_threads_are_non_increasing(
            min_bounce in 1usize..4,
            extra in 0usize..4,
            blocks in 1usize..8,
        ) {
            let max_bounce = min_bounce + extra;
            let total = blocks * DISPATCH_BLOCK_SIZE * (extra + 1);
            let (split, tables) = init_split_data_uniform(min_bounce, max_bounce, total).unwrap();

            prop_assert_eq!(tables.active_threads(min_bounce), split.len());
            prop_assert_eq!(split.len(), total);
            for d in min_bounce..=max_bounce {
                prop_assert!(tables.active_threads(d + 1) <= tables.active_threads(d));
                prop_assert!(tables.scale(d) > 0.0);
            }
            prop_assert!(split.iter().all(|s| (min_bounce..=max_bounce).contains(&s.target_depth)));
        }
    }
}
