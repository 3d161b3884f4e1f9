//! Primary sample space mutations

use light_core::base::*;
use light_core::rng::*;

/// Proposal types of the Markov chains.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Mutation {
    /// Independent resample of every coordinate.
    LargeStep,

    /// Gaussian perturbation of every coordinate.
    SmallStep { sigma: Float },
}

impl Mutation {
    /// Returns the mutation scheduled for a pass. Every `large_step_period`-th pass takes a large step.
    ///
    /// * `pass`              - Zero based pass index since burn-in.
    /// * `large_step_period` - Large step cadence; 0 disables large steps.
    /// * `sigma`             - Small step standard deviation.
    pub fn scheduled(pass: u64, large_step_period: usize, sigma: Float) -> Self {
        if large_step_period > 0 && (pass + 1) % large_step_period as u64 == 0 {
            Self::LargeStep
        } else {
            Self::SmallStep { sigma }
        }
    }

    /// Returns true for a large step.
    pub fn is_large_step(&self) -> bool {
        matches!(self, Self::LargeStep)
    }

    /// Propose a new state.
    ///
    /// * `rng` - The chain's random number generator.
    /// * `x`   - Current state.
    /// * `y`   - Proposed state.
    pub fn propose(&self, rng: &mut RNG, x: &[Float], y: &mut [Float]) {
        debug_assert_eq!(x.len(), y.len());
        match *self {
            Self::LargeStep => rng.fill_uniform(y),
            Self::SmallStep { sigma } => {
                for (yi, xi) in y.iter_mut().zip(x.iter()) {
                    *yi = wrap_unit(xi + sigma * rng.normal_float());
                }
            }
        }
    }
}

/// Returns the Metropolis-Hastings acceptance probability `min(1, I(y) / I(x))` of a symmetric proposal. A
/// current state with zero luminance always moves.
///
/// * `current`  - Luminance of the current state.
/// * `proposed` - Luminance of the proposed state.
#[inline]
pub fn acceptance_probability(current: Float, proposed: Float) -> Float {
    if current <= 0.0 {
        1.0
    } else {
        clamp(proposed / current, 0.0, 1.0)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn every_third_pass_is_a_large_step() {
        let kinds: Vec<bool> = (0..6).map(|p| Mutation::scheduled(p, 3, 0.01).is_large_step()).collect();
        assert_eq!(kinds, vec![false, false, true, false, false, true]);
        assert!(!Mutation::scheduled(2, 0, 0.01).is_large_step());
    }

    #[test]
    fn small_steps_carry_their_sigma() {
        assert_eq!(Mutation::scheduled(0, 3, 0.05), Mutation::SmallStep { sigma: 0.05 });
        assert_eq!(Mutation::scheduled(2, 3, 0.05), Mutation::LargeStep);
        assert_ne!(Mutation::SmallStep { sigma: 0.01 }, Mutation::SmallStep { sigma: 0.02 });
    }

    #[test]
    fn zero_luminance_state_always_moves() {
        assert_eq!(acceptance_probability(0.0, 0.0), 1.0);
        assert_eq!(acceptance_probability(2.0, 1.0), 0.5);
        assert_eq!(acceptance_probability(1.0, 3.0), 1.0);
    }

    proptest! {
        #[test]
        fn small_steps_stay_in_unit_interval(
            x in proptest::collection::vec(0.0f32..1.0, 1..32),
            seq in 0u64..1000,
            sigma in 0.0f32..2.0,
        ) {
            let mut rng = RNG::new(seq);
            let mut y = vec![0.0; x.len()];
            Mutation::SmallStep { sigma }.propose(&mut rng, &x, &mut y);
            prop_assert!(y.iter().all(|v| (0.0..1.0).contains(v)));
        }

        #[test]
        fn acceptance_is_a_probability(current in 0.0f32..1e3, proposed in 0.0f32..1e3) {
            let a = acceptance_probability(current, proposed);
            prop_assert!((0.0..=1.0).contains(&a));
        }
    }
}
