//! Prefix sums and proportional selection.

use crate::base::*;

/// Replace every element with the inclusive prefix sum of the elements up to and including it. Accumulates
/// in double precision so long arrays of small contributions do not stall.
///
/// * `values` - The values to scan in place.
pub fn inclusive_scan(values: &mut [Float]) {
    let mut acc = 0.0_f64;
    for v in values.iter_mut() {
        acc += *v as f64;
        *v = acc as Float;
    }
}

/// Select an index with probability proportional to its weight, given the inclusive prefix sum of the
/// weights. Returns `None` when the total weight is zero.
///
/// * `cdf` - Inclusive prefix sum of non-negative weights.
/// * `u`   - Uniform random sample in [0, 1).
pub fn select_proportional(cdf: &[Float], u: Float) -> Option<usize> {
    let total = *cdf.last()?;
    if total <= 0.0 {
        return None;
    }

    // First entry whose running sum exceeds the target.
    let target = u * total;
    let idx = cdf.partition_point(|&c| c <= target);
    if idx < cdf.len() {
        Some(idx)
    } else {
        // Rounding pushed the target onto the total; take the entry that reaches it.
        Some(cdf.partition_point(|&c| c < total))
    }
}

/// Scratch buffer for repeated proportional selection over the same number of weights.
#[derive(Clone, Debug, Default)]
pub struct ProportionalSelector {
    /// Inclusive prefix sum of the weights loaded last.
    cdf: Vec<Float>,
}

impl ProportionalSelector {
    /// Create a selector with room for `n` weights.
    ///
    /// * `n` - Number of weights.
    pub fn new(n: usize) -> Self {
        Self { cdf: vec![0.0; n] }
    }

    /// Load weights and build their prefix sum.
    ///
    /// * `weights` - Non-negative weights.
    pub fn load<I>(&mut self, weights: I)
    where
        I: IntoIterator<Item = Float>,
    {
        self.cdf.clear();
        self.cdf.extend(weights.into_iter().map(|w| if w.is_finite() { max(w, 0.0) } else { 0.0 }));
        inclusive_scan(&mut self.cdf);
    }

    /// Returns the total weight loaded.
    pub fn total(&self) -> Float {
        self.cdf.last().copied().unwrap_or(0.0)
    }

    /// Select an index proportional to its weight.
    ///
    /// * `u` - Uniform random sample in [0, 1).
    pub fn select(&self, u: Float) -> Option<usize> {
        select_proportional(&self.cdf, u)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RNG;
    use proptest::prelude::*;

    #[test]
    fn inclusive_scan_accumulates() {
        let mut v = vec![1.0, 2.0, 3.0, 4.0];
        inclusive_scan(&mut v);
        assert_eq!(v, vec![1.0, 3.0, 6.0, 10.0]);
    }

    #[test]
    fn zero_weights_select_nothing() {
        let mut s = ProportionalSelector::new(4);
        s.load(vec![0.0; 4]);
        assert_eq!(s.select(0.5), None);
        assert_eq!(select_proportional(&[], 0.5), None);
    }

    #[test]
    fn zero_weight_entries_are_never_selected() {
        let mut s = ProportionalSelector::new(4);
        s.load(vec![0.0, 1.0, 0.0, 1.0]);
        let mut rng = RNG::new(1);
        for _ in 0..1000 {
            let i = s.select(rng.uniform_float()).unwrap();
            assert!(i == 1 || i == 3);
        }
    }

    #[test]
    fn selection_frequency_follows_weights() {
        let mut s = ProportionalSelector::new(3);
        s.load(vec![1.0, 2.0, 7.0]);
        let mut rng = RNG::new(2);
        let mut counts = [0usize; 3];
        let n = 100000;
        for _ in 0..n {
            counts[s.select(rng.uniform_float()).unwrap()] += 1;
        }
        assert!((counts[0] as f32 / n as f32 - 0.1).abs() < 0.01);
        assert!((counts[1] as f32 / n as f32 - 0.2).abs() < 0.01);
        assert!((counts[2] as f32 / n as f32 - 0.7).abs() < 0.01);
    }

    #[test]
    fn non_finite_weights_are_ignored() {
        let mut s = ProportionalSelector::new(3);
        s.load(vec![Float::NAN, 1.0, INFINITY]);
        assert_eq!(s.total(), 1.0);
        assert_eq!(s.select(0.99), Some(1));
    }

    proptest! {
        #[test]
        fn selected_index_always_in_range(
            weights in prop::collection::vec(0.0f32..10.0, 1..64),
            u in 0.0f32..1.0,
        ) {
            let mut s = ProportionalSelector::new(weights.len());
            s.load(weights.clone());
            if let Some(i) = s.select(u) {
                prop_assert!(i < weights.len());
                prop_assert!(weights[i] > 0.0);
            }
        }
    }
}
