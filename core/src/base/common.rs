//! Common

use num_traits::Num;

/// Use 32-bit precision for floating point numbers.
pub type Float = f32;

/// Infinty (∞)
pub const INFINITY: Float = Float::INFINITY;

/// PI (π)
pub const PI: Float = std::f32::consts::PI;

/// 1/PI (1/π)
pub const INV_PI: Float = 1.0 / PI;

/// 2*PI (2π)
pub const TWO_PI: Float = PI * 2.0;

/// 4*PI (4π)
pub const FOUR_PI: Float = PI * 4.0;

/// 1/4*PI (1/4π)
pub const INV_FOUR_PI: Float = 1.0 / FOUR_PI;

/// sqrt(2)
pub const SQRT2: Float = std::f32::consts::SQRT_2;

/// Floor for pdf denominators of explicit light samples.
pub const DEPSILON: Float = 1e-20;

/// Floor for pdf denominators of BSDF samples.
pub const DEPSILON2: Float = 1e-30;

/// Relative offset used to push ray origins off a surface.
pub const GEPSILON: Float = 5e-5;

/// Fraction of the light distance traced by shadow rays.
pub const SHADOW_DISTANCE_SCALE: Float = 0.9995;

/// Returns the minimum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn min<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a < b {
        a
    } else {
        b
    }
}

/// Returns the maximum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn max<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a > b {
        a
    } else {
        b
    }
}

/// Clamps a value to the closed interval `[low, high]`.
///
/// * `val`  - The value.
/// * `low`  - Lower bound.
/// * `high` - Upper bound.
#[inline(always)]
pub fn clamp<T>(val: T, low: T, high: T) -> T
where
    T: PartialOrd,
{
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

/// Wraps a value into the half open interval [0, 1).
///
/// * `v` - The value.
#[inline(always)]
pub fn wrap_unit(v: Float) -> Float {
    let w = v - v.floor();
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}

/// Returns the inverse of the error function.
///
/// * `x` - The value in (-1, 1).
pub fn erf_inv(x: Float) -> Float {
    let x = clamp(x, -0.99999, 0.99999);
    let mut w = -((1.0 - x) * (1.0 + x)).ln();
    if w < 5.0 {
        w -= 2.5;

        let mut p = 2.81022636e-08;
        p = 3.43273939e-07 + p * w;
        p = -3.5233877e-06 + p * w;
        p = -4.39150654e-06 + p * w;
        p = 0.00021858087 + p * w;
        p = -0.00125372503 + p * w;
        p = -0.00417768164 + p * w;
        p = 0.246640727 + p * w;
        p = 1.50140941 + p * w;
        p * x
    } else {
        w = w.sqrt() - 3.0;

        let mut p = -0.000200214257;
        p = 0.000100950558 + p * w;
        p = 0.00134934322 + p * w;
        p = -0.00367342844 + p * w;
        p = 0.00573950773 + p * w;
        p = -0.0076224613 + p * w;
        p = 0.00943887047 + p * w;
        p = 1.00167406 + p * w;
        p = 2.83297682 + p * w;
        p * x
    }
}

/// Power heuristic (β = 2) weight of a strategy with pdf `a` against a competing strategy with pdf `b`.
///
/// * `a` - Pdf of the strategy being weighted.
/// * `b` - Pdf of the competing strategy.
#[inline]
pub fn mis_weight_heuristic(a: Float, b: Float) -> Float {
    let aa = a * a;
    let bb = b * b;
    aa / max(aa + bb, DEPSILON2)
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
    fn clamp_limits_to_range() {
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(2.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
    }

    #[test]
    fn wrap_unit_stays_in_half_open_interval() {
        assert_eq!(wrap_unit(1.0), 0.0);
        assert!(approx_eq!(f32, wrap_unit(1.25), 0.25, epsilon = 1e-6));
        assert!(approx_eq!(f32, wrap_unit(-0.25), 0.75, epsilon = 1e-6));
    }

    #[test]
    fn erf_inv_is_odd_and_zero_at_origin() {
        assert_eq!(erf_inv(0.0), 0.0);
        assert!(approx_eq!(f32, erf_inv(0.5), -erf_inv(-0.5), epsilon = 1e-6));
        // erf(0.4769363) = 0.5
        assert!(approx_eq!(f32, erf_inv(0.5), 0.476_936_3, epsilon = 1e-4));
    }

    #[test]
    fn mis_weight_with_zero_pdfs_is_zero() {
        assert_eq!(mis_weight_heuristic(0.0, 0.0), 0.0);
    }

    proptest! {
        #[test]
        fn power_heuristic_is_partition_of_unity(a in 1e-3f32..1e3, b in 1e-3f32..1e3) {
            let sum = mis_weight_heuristic(a, b) + mis_weight_heuristic(b, a);
            prop_assert!(approx_eq!(f32, sum, 1.0, epsilon = 1e-5));
        }

        #[test]
        fn power_heuristic_in_unit_interval(a in 0.0f32..1e3, b in 0.0f32..1e3) {
            let w = mis_weight_heuristic(a, b);
            prop_assert!((0.0..=1.0).contains(&w));
        }
    }
}
