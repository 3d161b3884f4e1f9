//! Deterministic reductions.

use crate::base::*;
use rayon::prelude::*;

/// Number of elements summed by one task of a deterministic reduction.
pub const REDUCE_CHUNK_SIZE: usize = 4096;

/// Sum values in parallel with a result that does not depend on the number of worker threads: fixed size
/// chunks are summed independently and the partial sums are combined in order.
///
/// * `values` - The values.
pub fn deterministic_sum(values: &[Float]) -> f64 {
    let partials: Vec<f64> = values
        .par_chunks(REDUCE_CHUNK_SIZE)
        .map(|chunk| chunk.iter().map(|v| *v as f64).sum::<f64>())
        .collect();
    partials.iter().sum()
}

/// Deterministic sum of a mapped value over a slice.
///
/// * `items` - The items.
/// * `f`     - Maps an item to the value to sum.
pub fn deterministic_sum_by<T, F>(items: &[T], f: F) -> f64
where
    T: Sync,
    F: Fn(&T) -> Float + Sync,
{
    let partials: Vec<f64> = items
        .par_chunks(REDUCE_CHUNK_SIZE)
        .map(|chunk| chunk.iter().map(|v| f(v) as f64).sum::<f64>())
        .collect();
    partials.iter().sum()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_matches_sequential_chunked_sum() {
        let values: Vec<Float> = (0..10000).map(|i| (i % 17) as Float * 0.125).collect();
        let expected: f64 = values
            .chunks(REDUCE_CHUNK_SIZE)
            .map(|c| c.iter().map(|v| *v as f64).sum::<f64>())
            .sum();
        assert_eq!(deterministic_sum(&values), expected);
        assert_eq!(deterministic_sum_by(&values, |v| *v), expected);
    }

    #[test]
    fn empty_sum_is_zero() {
        assert_eq!(deterministic_sum(&[]), 0.0);
    }
}
