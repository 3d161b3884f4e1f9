//! Spectrum

use crate::base::*;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, Mul, MulAssign, Sub};

/// Number of samples in a `Spectrum`.
pub const RGB_SAMPLES: usize = 3;

/// RGB radiance/importance/reflectance value.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Spectrum {
    /// The RGB coefficients.
    pub c: [Float; RGB_SAMPLES],
}

impl Spectrum {
    /// Spectrum with all coefficients zero.
    pub const ZERO: Self = Self { c: [0.0; RGB_SAMPLES] };

    /// Spectrum with all coefficients one.
    pub const ONE: Self = Self { c: [1.0; RGB_SAMPLES] };

    /// Create a spectrum with a constant value.
    ///
    /// * `v` - The value.
    pub const fn new(v: Float) -> Self {
        Self { c: [v; RGB_SAMPLES] }
    }

    /// Create a spectrum from RGB values.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub const fn from_rgb(r: Float, g: Float, b: Float) -> Self {
        Self { c: [r, g, b] }
    }

    /// Returns true if the values are zero everywhere.
    pub fn is_black(&self) -> bool {
        self.c.iter().all(|v| *v == 0.0)
    }

    /// Returns true if any coefficient is NaN.
    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan())
    }

    /// Returns the maximum coefficient.
    pub fn max_component_value(&self) -> Float {
        self.c[1..].iter().fold(self.c[0], |m, v| max(m, *v))
    }

    /// Returns the y-coefficient of XYZ colour (luminance).
    pub fn y(&self) -> Float {
        0.212671 * self.c[0] + 0.715160 * self.c[1] + 0.072169 * self.c[2]
    }

    /// Returns the squared length of the coefficient vector.
    pub fn dot_self(&self) -> Float {
        self.c.iter().map(|v| v * v).sum()
    }

    /// Returns the spectrum with NaN and infinite coefficients replaced by zero.
    pub fn sanitized(&self) -> Self {
        let mut c = self.c;
        for v in c.iter_mut() {
            if !v.is_finite() {
                *v = 0.0;
            }
        }
        Self { c }
    }
}

impl Add for Spectrum {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::from_rgb(self.c[0] + other.c[0], self.c[1] + other.c[1], self.c[2] + other.c[2])
    }
}

impl AddAssign for Spectrum {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Spectrum {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::from_rgb(self.c[0] - other.c[0], self.c[1] - other.c[1], self.c[2] - other.c[2])
    }
}

impl Mul for Spectrum {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        Self::from_rgb(self.c[0] * other.c[0], self.c[1] * other.c[1], self.c[2] * other.c[2])
    }
}

impl MulAssign for Spectrum {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl Mul<Float> for Spectrum {
    type Output = Self;

    fn mul(self, f: Float) -> Self::Output {
        Self::from_rgb(self.c[0] * f, self.c[1] * f, self.c[2] * f)
    }
}

impl Mul<Spectrum> for Float {
    type Output = Spectrum;

    fn mul(self, s: Spectrum) -> Self::Output {
        s * self
    }
}

impl MulAssign<Float> for Spectrum {
    fn mul_assign(&mut self, f: Float) {
        *self = *self * f;
    }
}

impl Div<Float> for Spectrum {
    type Output = Self;

    fn div(self, f: Float) -> Self::Output {
        debug_assert!(f != 0.0);
        self * (1.0 / f)
    }
}

impl Index<usize> for Spectrum {
    type Output = Float;

    fn index(&self, i: usize) -> &Self::Output {
        &self.c[i]
    }
}

impl fmt::Display for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.c[0], self.c[1], self.c[2])
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
    fn luminance_of_white_is_one() {
        assert!(approx_eq!(f32, Spectrum::ONE.y(), 1.0, epsilon = 1e-5));
    }

    #[test]
    fn sanitized_drops_non_finite_values() {
        let s = Spectrum::from_rgb(Float::NAN, INFINITY, 2.0).sanitized();
        assert_eq!(s, Spectrum::from_rgb(0.0, 0.0, 2.0));
    }

    #[test]
    fn max_component_value_picks_largest() {
        assert_eq!(Spectrum::from_rgb(0.1, 3.0, 2.0).max_component_value(), 3.0);
    }
}
