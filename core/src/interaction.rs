//! Interactions

use crate::base::*;
use crate::geometry::*;
use crate::spectrum::*;

/// Result of a ray intersection query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hit {
    /// Parametric distance along the ray.
    pub t: Float,

    /// Index of the instance that was hit.
    pub instance_id: usize,
}

impl Hit {
    /// Create a new `Hit`.
    ///
    /// * `t`           - Parametric distance along the ray.
    /// * `instance_id` - Index of the instance that was hit.
    pub fn new(t: Float, instance_id: usize) -> Self {
        Self { t, instance_id }
    }
}

/// Local geometry at a ray intersection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfaceHit {
    /// Position.
    pub pos: Point3f,

    /// Shading normal.
    pub normal: Vector3f,

    /// Geometric normal.
    pub flat_normal: Vector3f,

    /// Tangent of the shading frame.
    pub tangent: Vector3f,

    /// Bitangent of the shading frame.
    pub bitangent: Vector3f,

    /// Texture coordinates.
    pub tex_coord: [Float; 2],

    /// Material.
    pub mat_id: usize,

    /// Scale hint for shadow ray offsets.
    pub s_ray_off: Float,

    /// Light the surface belongs to, if it is an emitter registered for light sampling.
    pub light_id: Option<usize>,
}

impl SurfaceHit {
    /// Create a new `SurfaceHit` with a shading frame built around the normal.
    ///
    /// * `pos`       - Position.
    /// * `normal`    - Unit normal, used for shading and as the geometric normal.
    /// * `tex_coord` - Texture coordinates.
    /// * `mat_id`    - Material.
    /// * `light_id`  - Light the surface belongs to.
    pub fn new(
        pos: Point3f,
        normal: Vector3f,
        tex_coord: [Float; 2],
        mat_id: usize,
        light_id: Option<usize>,
    ) -> Self {
        let (tangent, bitangent) = coordinate_system(&normal);
        Self {
            pos,
            normal,
            flat_normal: normal,
            tangent,
            bitangent,
            tex_coord,
            mat_id,
            s_ray_off: 0.0,
            light_id,
        }
    }

    /// Transform a direction from the shading frame to world space.
    ///
    /// * `v` - Direction in the shading frame.
    pub fn local_to_world(&self, v: &Vector3f) -> Vector3f {
        local_to_world(v, &self.tangent, &self.bitangent, &self.normal)
    }
}

/// Sampling record of the previous bounce, consumed when a path hits an emitter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MisData {
    /// The previous bounce sampled a specular lobe.
    pub is_specular: bool,

    /// Solid angle density of the direction sampled at the previous bounce.
    pub mat_sample_pdf: Float,
}

impl MisData {
    /// Returns the record for camera rays. Camera rays cannot be produced by light sampling, so they count
    /// as specular.
    pub fn initial() -> Self {
        Self {
            is_specular: true,
            mat_sample_pdf: 1.0,
        }
    }
}

impl Default for MisData {
    fn default() -> Self {
        Self::initial()
    }
}

/// A sampled BSDF direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatSample {
    /// Sampled direction, pointing away from the surface.
    pub direction: Vector3f,

    /// BSDF value for the sampled direction. Specular lobes include the `1/|cos|` that cancels the
    /// projection term.
    pub color: Spectrum,

    /// Solid angle density of the sampled direction. 1 for specular lobes.
    pub pdf: Float,

    /// The sampled lobe is a Dirac delta.
    pub is_specular: bool,
}

impl MatSample {
    /// Returns a sample that terminates the path.
    pub fn absorbed() -> Self {
        Self {
            direction: Vector3f::zero(),
            color: Spectrum::ZERO,
            pdf: 0.0,
            is_specular: false,
        }
    }
}

/// BSDF evaluation for a pair of directions `wi` (towards the light side) and `wo` (towards the eye side).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BxdfEval {
    /// Reflected part of the BSDF.
    pub brdf: Spectrum,

    /// Transmitted part of the BSDF.
    pub btdf: Spectrum,

    /// Density of sampling `wi` given `wo`.
    pub pdf_fwd: Float,

    /// Density of sampling `wo` given `wi`.
    pub pdf_rev: Float,
}

impl BxdfEval {
    /// Returns the evaluation of a BSDF that does not scatter the pair of directions.
    pub fn zero() -> Self {
        Self {
            brdf: Spectrum::ZERO,
            btdf: Spectrum::ZERO,
            pdf_fwd: 0.0,
            pdf_rev: 0.0,
        }
    }

    /// Returns the BSDF value for the pair of directions.
    pub fn value(&self) -> Spectrum {
        self.brdf + self.btdf
    }
}

/// A point sampled on a light as seen from a receiving point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadowSample {
    /// Sampled point on the light.
    pub pos: Point3f,

    /// Emitted radiance towards the receiver; intensity for point lights.
    pub color: Spectrum,

    /// Solid angle density at the receiver. Point lights report the squared distance so `color / pdf`
    /// gives the irradiance.
    pub pdf: Float,

    /// Distance from the receiver to the sampled point.
    pub max_dist: Float,

    /// The light is a point light.
    pub is_point: bool,
}

/// A ray leaving a light, sampled to start a light subpath.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EmissionSample {
    /// Light that was selected.
    pub light_id: usize,

    /// Origin on the light.
    pub pos: Point3f,

    /// Surface normal at the origin; `None` for point lights.
    pub normal: Option<Vector3f>,

    /// Emission direction.
    pub dir: Vector3f,

    /// Emitted radiance along `dir`; intensity for point lights.
    pub le: Spectrum,

    /// Probability of selecting the light.
    pub pdf_select: Float,

    /// Area density of the origin. 1 for point lights.
    pub pdf_pos: Float,

    /// Solid angle density of the direction.
    pub pdf_dir: Float,

    /// The light has a Dirac delta position distribution.
    pub is_delta: bool,
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn surface_hit_frame_is_orthonormal() {
        let n = Vector3f::new(0.3, -0.4, 0.5).normalize();
        let s = SurfaceHit::new(Point3f::zero(), n, [0.0, 0.0], 0, None);
        assert!(approx_eq!(f32, s.tangent.dot(&n), 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, s.bitangent.dot(&n), 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, s.tangent.dot(&s.bitangent), 0.0, epsilon = 1e-6));

        let up = s.local_to_world(&Vector3f::new(0.0, 0.0, 1.0));
        assert!(approx_eq!(f32, up.dot(&n), 1.0, epsilon = 1e-6));
    }

    #[test]
    fn camera_rays_count_as_specular() {
        assert!(MisData::default().is_specular);
    }

    #[test]
    fn bxdf_value_sums_lobes() {
        let e = BxdfEval {
            brdf: Spectrum::new(0.25),
            btdf: Spectrum::new(0.5),
            pdf_fwd: 1.0,
            pdf_rev: 1.0,
        };
        assert_eq!(e.value(), Spectrum::new(0.75));
        assert!(BxdfEval::zero().value().is_black());
    }
}
