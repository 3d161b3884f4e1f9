//! Random Number Generator.

use crate::base::*;

/// 1 - epsilon in the precision we've selected for `Float`.
pub const ONE_MINUS_EPSILON: Float = hexf32!("0x1.fffffep-1"); // 0.99999994

const PCG32_DEFAULT_STATE: u64 = 0x853c49e6748fea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e39cb94b95bdb;
const PCG32_MULT: u64 = 0x5851f42d4c957f2d;

/// PCG32 pseudo-random number generator. Small enough to be stored per sample slot so that every Markov chain
/// owns a reproducible stream of mutation offsets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RNG {
    state: u64,
    inc: u64,
}

impl Default for RNG {
    /// Return a new instance of `RNG` with default state and stream.
    fn default() -> Self {
        Self {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }
}

impl RNG {
    /// Create a new `RNG` by seeding it with the given starting sequence.
    ///
    /// * `sequence_index` - The starting sequence to seed with.
    pub fn new(sequence_index: u64) -> Self {
        let mut ret = Self { state: 0, inc: 0 };
        ret.set_sequence(sequence_index, PCG32_DEFAULT_STATE);
        ret
    }

    /// Create a new `RNG` for a stream derived from a global seed and a per-item index. Different seeds give
    /// unrelated streams for the same index.
    ///
    /// * `seed`  - Global seed.
    /// * `index` - Index of the item (sample slot, pixel, ...) that owns the stream.
    pub fn with_seed(seed: u64, index: u64) -> Self {
        let mut ret = Self { state: 0, inc: 0 };
        ret.set_sequence(index, PCG32_DEFAULT_STATE ^ mix64(seed));
        ret
    }

    /// Initialize the random number generator sequence.
    ///
    /// * `init_seq`   - The starting sequence to seed with.
    /// * `init_state` - The initial state offset.
    #[inline(always)]
    fn set_sequence(&mut self, init_seq: u64, init_state: u64) {
        self.state = 0;
        self.inc = init_seq.wrapping_shl(1) | 1;
        let _ = self.uniform_u32();

        self.state = self.state.wrapping_add(init_state);
        let _ = self.uniform_u32();
    }

    /// Returns a uniformly distributed u32 value.
    #[inline(always)]
    pub fn uniform_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);

        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;

        xor_shifted.rotate_right(rot)
    }

    /// Returns a uniformly distributed value over the half open interval [0.0, 1.0).
    pub fn uniform_float(&mut self) -> Float {
        min(
            self.uniform_u32() as Float * hexf32!("0x1.0p-32") as Float,
            ONE_MINUS_EPSILON,
        )
    }

    /// Returns a standard normally distributed value.
    pub fn normal_float(&mut self) -> Float {
        SQRT2 * erf_inv(2.0 * self.uniform_float() - 1.0)
    }

    /// Fill a slice with uniformly distributed values over [0.0, 1.0).
    ///
    /// * `out` - The slice to fill.
    pub fn fill_uniform(&mut self, out: &mut [Float]) {
        for v in out.iter_mut() {
            *v = self.uniform_float();
        }
    }
}

/// SplitMix64 finalizer used to decorrelate user supplied seeds.
///
/// * `v` - The value to mix.
fn mix64(v: u64) -> u64 {
    let mut z = v.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_sequence_reproduces_values() {
        let mut a = RNG::new(42);
        let mut b = RNG::new(42);
        for _ in 0..100 {
            assert_eq!(a.uniform_u32(), b.uniform_u32());
        }
    }

    #[test]
    fn different_seeds_give_different_streams() {
        let mut a = RNG::with_seed(1, 7);
        let mut b = RNG::with_seed(2, 7);
        let va: Vec<u32> = (0..8).map(|_| a.uniform_u32()).collect();
        let vb: Vec<u32> = (0..8).map(|_| b.uniform_u32()).collect();
        assert_ne!(va, vb);
    }

    #[test]
    fn uniform_float_in_half_open_interval() {
        let mut rng = RNG::new(3);
        for _ in 0..10000 {
            let u = rng.uniform_float();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn normal_float_has_zero_mean_unit_variance() {
        let mut rng = RNG::new(11);
        let n = 100000;
        let samples: Vec<f64> = (0..n).map(|_| rng.normal_float() as f64).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.02);
        assert!((var - 1.0).abs() < 0.05);
    }
}
