//! Burn-in resampling

use crate::bdpt::*;
use itertools::Itertools;
use light_core::base::*;
use light_core::rng::*;
use light_core::sampling::*;
use std::cmp::Reverse;

/// Default number of burn-in iterations.
pub const BURN_ITERS: usize = 64;

/// Returns the number of states selected in a burn-in iteration. Every iteration selects `n / iterations`
/// states and the last one takes the remainder.
///
/// * `n`          - Number of chains.
/// * `iterations` - Number of burn-in iterations.
/// * `iteration`  - Zero based iteration.
pub fn burn_portion(n: usize, iterations: usize, iteration: usize) -> usize {
    let portion = n / iterations;
    if iteration + 1 == iterations {
        n - portion * (iterations - 1)
    } else {
        portion
    }
}

/// Resampled (primary sample vector, depth) pairs collected during burn-in. The buffers are distinct from the
/// chain state they are selected from.
#[derive(Clone, Debug)]
pub struct FreshStates {
    /// Coordinates per state.
    stride: usize,

    /// Selected primary sample vectors, slot-major.
    pss: Vec<Float>,

    /// Target depths of the selected states.
    depths: Vec<usize>,
}

impl FreshStates {
    /// Create empty buffers for `n` states.
    ///
    /// * `n`      - Number of states.
    /// * `stride` - Coordinates per state.
    pub fn new(n: usize, stride: usize) -> Self {
        Self {
            stride,
            pss: Vec::with_capacity(n * stride),
            depths: Vec::with_capacity(n),
        }
    }

    /// Returns the number of selected states.
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    /// Returns true if no state was selected yet.
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Select `count` states with probability proportional to the weights loaded into `selector`, using
    /// stratified selection samples. Falls back to uniform selection when every weight is zero.
    ///
    /// * `selector` - Prefix sum of the weights of the evaluated states.
    /// * `pss`      - Evaluated primary sample vectors.
    /// * `split`    - Depth assignment of the evaluated states.
    /// * `count`    - Number of states to select.
    /// * `rng`      - Random stream for the selection samples.
    pub fn select(
        &mut self,
        selector: &ProportionalSelector,
        pss: &[Float],
        split: &[SplitData],
        count: usize,
        rng: &mut RNG,
    ) {
        let n = split.len();
        if n == 0 {
            return;
        }
        for j in 0..count {
            let u = min((j as Float + rng.uniform_float()) / count as Float, ONE_MINUS_EPSILON);
            let i = selector
                .select(u)
                .unwrap_or_else(|| min((u * n as Float) as usize, n - 1));
            self.pss
                .extend_from_slice(&pss[i * self.stride..(i + 1) * self.stride]);
            self.depths.push(split[i].target_depth);
        }
    }

    /// Move the selected states into the chain buffers ordered by descending depth. The sort is stable so states
    /// of equal depth keep their selection order.
    ///
    /// * `pss`   - Chain primary sample vectors.
    /// * `split` - Chain depth assignments.
    pub fn commit(&self, pss: &mut [Float], split: &mut [SplitData]) {
        debug_assert_eq!(self.len(), split.len());
        let order = (0..self.len()).sorted_by_key(|&i| Reverse(self.depths[i]));
        for (k, i) in order.enumerate() {
            pss[k * self.stride..(k + 1) * self.stride]
                .copy_from_slice(&self.pss[i * self.stride..(i + 1) * self.stride]);
            split[k] = SplitData::new(self.depths[i]);
        }
    }
}

/// Set the normalization of every populated depth to `strategy_count(d) / freq(d)`, the inverse probability of
/// selecting a (depth, strategy) pair when chains are distributed with the observed depth frequencies.
/// Unpopulated depths keep their previous value.
///
/// * `tables` - Tables to update.
/// * `split`  - Depth assignments after burn-in.
pub fn scale_from_population(tables: &mut DepthTables, split: &[SplitData]) {
    let n = split.len() as Float;
    let counts = split.iter().map(|s| s.target_depth).counts();
    for d in tables.min_bounce..=tables.max_bounce {
        match counts.get(&d) {
            Some(&count) if count > 0 => {
                let freq = count as Float / n;
                tables.scale_table[d] = strategy_count(d) as Float / freq;
            }
            _ => warn!("No chains at depth {d} after burn-in"),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn portions_cover_every_chain() {
        let total: usize = (0..64).map(|it| burn_portion(1000, 64, it)).sum();
        assert_eq!(total, 1000);
        assert_eq!(burn_portion(1000, 64, 0), 15);
        assert_eq!(burn_portion(1000, 64, 63), 55);
    }

    #[test]
    fn selection_follows_weights_and_sorts_by_depth() {
        let split = vec![SplitData::new(2), SplitData::new(1), SplitData::new(1)];
        let pss: Vec<Float> = vec![0.2, 0.2, 0.1, 0.1, 0.3, 0.3];

        let mut selector = ProportionalSelector::new(3);
        selector.load([0.0, 0.0, 1.0]);

        let mut fresh = FreshStates::new(3, 2);
        let mut rng = RNG::new(0);
        fresh.select(&selector, &pss, &split, 3, &mut rng);
        assert_eq!(fresh.len(), 3);

        let mut out_pss = vec![0.0; 6];
        let mut out_split = vec![SplitData::default(); 3];
        fresh.commit(&mut out_pss, &mut out_split);
        assert!(out_split.iter().all(|s| s.target_depth == 1));
        assert_eq!(out_pss, vec![0.3; 6]);
    }

    #[test]
    fn zero_weights_select_uniformly() {
        let split = vec![SplitData::new(3), SplitData::new(2)];
        let pss: Vec<Float> = vec![0.5, 0.25];
        let mut selector = ProportionalSelector::new(2);
        selector.load([0.0, 0.0]);

        let mut fresh = FreshStates::new(2, 1);
        fresh.select(&selector, &pss, &split, 2, &mut RNG::new(1));

        let mut out_pss = vec![0.0; 2];
        let mut out_split = vec![SplitData::default(); 2];
        fresh.commit(&mut out_pss, &mut out_split);
        assert_eq!(out_split, vec![SplitData::new(3), SplitData::new(2)]);
        assert_eq!(out_pss, vec![0.5, 0.25]);
    }

    #[test]
    fn scale_is_inverse_frequency() {
        let mut tables = DepthTables::new(1, 3);
        tables.set_uniform_scale();
        let split: Vec<SplitData> = [3, 1, 1, 1].iter().map(|d| SplitData::new(*d)).collect();
        scale_from_population(&mut tables, &split);

        assert!(approx_eq!(f32, tables.scale(1), 3.0 / 0.75, epsilon = 1e-5));
        assert!(approx_eq!(f32, tables.scale(3), 5.0 / 0.25, epsilon = 1e-5));
        // Unpopulated depth keeps the uniform value.
        assert!(approx_eq!(f32, tables.scale(2), 12.0, epsilon = 1e-5));
    }
}
