//! Markov chain state

use super::mutation::*;
use crate::bdpt::PathSample;
use light_core::base::*;
use light_core::rng::*;
use light_core::screen::*;
use light_core::spectrum::*;

/// Cached evaluation of a chain's current primary sample vector together with the chain's random stream. The
/// vector itself lives in the sampler's slot-major state buffer.
#[derive(Copy, Clone, Debug, Default)]
pub struct ChainState {
    /// Random stream driving mutations and acceptance.
    pub rng: RNG,

    /// Contribution of the current state.
    pub contribution: Spectrum,

    /// Scalar target function of the current state.
    pub luminance: Float,

    /// Pixel of the current state.
    pub pixel: usize,
}

impl ChainState {
    /// Create a chain with an uncached state.
    ///
    /// * `rng` - Random stream of the chain.
    pub fn new(rng: RNG) -> Self {
        Self {
            rng,
            ..Self::default()
        }
    }

    /// Cache the evaluation of a new current state.
    ///
    /// * `sample` - Evaluation of the state.
    pub fn set_current(&mut self, sample: &PathSample) {
        self.contribution = sample.contribution;
        self.luminance = luminance(&sample.contribution);
        self.pixel = sample.pixel;
    }

    /// Splat the current and the proposed state weighted by the acceptance probability, then accept or reject the
    /// proposal. Returns true if the proposal was accepted.
    ///
    /// * `proposal` - Evaluation of the proposed state.
    /// * `screen`   - Screen accumulator.
    pub fn step(&mut self, proposal: &PathSample, screen: &ScreenAccumulator) -> bool {
        let proposed = luminance(&proposal.contribution);
        let a = acceptance_probability(self.luminance, proposed);

        if self.luminance > 0.0 && a < 1.0 {
            screen.accumulate(&(self.contribution / self.luminance), self.pixel, 1.0 - a);
        }
        if proposed > 0.0 && a > 0.0 {
            screen.accumulate(&(proposal.contribution / proposed), proposal.pixel, a);
        }

        let accept = self.rng.uniform_float() < a;
        if accept {
            self.set_current(proposal);
        }
        accept
    }
}

/// Returns the scalar target function of a contribution.
///
/// * `c` - The contribution.
#[inline]
pub fn luminance(c: &Spectrum) -> Float {
    max(c.y(), 0.0)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    fn sample(v: Float, pixel: usize) -> PathSample {
        PathSample {
            contribution: Spectrum::new(v),
            pixel,
        }
    }

    #[test]
    fn brighter_proposal_is_always_accepted() {
        let screen = ScreenAccumulator::new(2, 1);
        let mut chain = ChainState::new(RNG::new(1));
        chain.set_current(&sample(1.0, 0));

        assert!(chain.step(&sample(2.0, 1), &screen));
        assert_eq!(chain.pixel, 1);

        // Full weight goes to the proposal, normalized to unit luminance.
        let (sum, weight) = screen.pixel_sum(1);
        assert!(approx_eq!(f32, sum.y(), 1.0, epsilon = 1e-5));
        assert!(approx_eq!(f32, weight, 1.0, ulps = 1));
        assert_eq!(screen.pixel_sum(0).1, 0.0);
    }

    #[test]
    fn black_proposal_is_rejected_and_current_splatted() {
        let screen = ScreenAccumulator::new(2, 1);
        let mut chain = ChainState::new(RNG::new(2));
        chain.set_current(&sample(0.5, 0));

        assert!(!chain.step(&sample(0.0, 1), &screen));
        assert_eq!(chain.pixel, 0);
        assert!(approx_eq!(f32, screen.pixel_sum(0).1, 1.0, ulps = 1));
        assert_eq!(screen.pixel_sum(1).1, 0.0);
    }

    #[test]
    fn splat_weights_sum_to_one() {
        let screen = ScreenAccumulator::new(2, 1);
        let mut chain = ChainState::new(RNG::new(3));
        chain.set_current(&sample(4.0, 0));
        chain.step(&sample(1.0, 1), &screen);

        let w0 = screen.pixel_sum(0).1;
        let w1 = screen.pixel_sum(1).1;
        assert!(approx_eq!(f32, w0, 0.75, epsilon = 1e-6));
        assert!(approx_eq!(f32, w1, 0.25, epsilon = 1e-6));
    }
}
