//! Common sampling functions.

use crate::base::*;
use crate::geometry::*;

/// Uniformly sample a direction from a sphere.
///
/// * `u` - The random sample point.
pub fn uniform_sample_sphere(u: &[Float; 2]) -> Vector3f {
    let z = 1.0 - 2.0 * u[0];
    let r = max(0.0, 1.0 - z * z).sqrt();
    let phi = TWO_PI * u[1];
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

/// Returns the PDF for uniformly sampling a direction from a sphere.
#[inline]
pub fn uniform_sphere_pdf() -> Float {
    INV_FOUR_PI
}

/// Uniformly sample a point on a unit disk using concentric mapping.
///
/// * `u` - The random sample point.
pub fn concentric_sample_disk(u: &[Float; 2]) -> (Float, Float) {
    // Map uniform random numbers to [-1,1]^2.
    let ox = 2.0 * u[0] - 1.0;
    let oy = 2.0 * u[1] - 1.0;

    // Handle degeneracy at the origin.
    if ox == 0.0 && oy == 0.0 {
        return (0.0, 0.0);
    }

    // Apply concentric mapping to point.
    let (r, theta) = if ox.abs() > oy.abs() {
        (ox, PI * 0.25 * (oy / ox))
    } else {
        (oy, PI * 0.5 - PI * 0.25 * (ox / oy))
    };
    (r * theta.cos(), r * theta.sin())
}

/// Cosine-weighted sample of the hemisphere around +z.
///
/// * `u` - The random sample point.
pub fn cosine_sample_hemisphere(u: &[Float; 2]) -> Vector3f {
    let (x, y) = concentric_sample_disk(u);
    let z = max(0.0, 1.0 - x * x - y * y).sqrt();
    Vector3f::new(x, y, z)
}

/// Returns the PDF for cosine-weighted hemisphere sampling.
///
/// * `cos_theta` - Cosine of the angle with the hemisphere axis.
#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

/// Convert a solid angle density at `from` into an area density at the point `to`.
///
/// * `pdf_w`  - Solid angle density.
/// * `from`   - Point the direction was sampled at.
/// * `to`     - Point the direction arrives at.
/// * `n_to`   - Normal at `to`; `None` for points without a surface (point lights).
pub fn solid_angle_to_area(pdf_w: Float, from: &Point3f, to: &Point3f, n_to: Option<&Vector3f>) -> Float {
    let w = *to - *from;
    let dist2 = w.length_squared();
    if dist2 == 0.0 {
        return 0.0;
    }
    let inv_dist2 = 1.0 / dist2;
    let cos = match n_to {
        Some(n) => n.abs_dot(&(w * inv_dist2.sqrt())),
        None => 1.0,
    };
    pdf_w * cos * inv_dist2
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
