//! Scene

use crate::base::*;
use crate::geometry::*;
use crate::interaction::*;
use crate::spectrum::*;

mod analytic;

// Re-export
pub use analytic::*;

/// Geometry, material and light queries consumed by the integrators.
///
/// Directions passed to BSDF queries point away from the surface. `wi` points towards the light side of a
/// path and `wo` towards the eye side. Light selection must not depend on the receiving point for light
/// subpaths and camera subpaths to agree on selection probabilities.
pub trait Scene: Send + Sync {
    /// Returns the closest intersection along a ray.
    ///
    /// * `ray` - The ray.
    fn trace_ray(&self, ray: &Ray) -> Option<Hit>;

    /// Returns the visibility in [0, 1] along a segment.
    ///
    /// * `pos`      - Segment origin.
    /// * `dir`      - Unit direction.
    /// * `max_dist` - Segment length.
    fn shadow_trace(&self, pos: &Point3f, dir: &Vector3f, max_dist: Float) -> Float;

    /// Returns the local geometry at an intersection.
    ///
    /// * `ray` - The ray that produced the hit.
    /// * `hit` - The hit.
    fn surface_eval(&self, ray: &Ray, hit: &Hit) -> SurfaceHit;

    /// Sample a scattered direction and evaluate the BSDF for it.
    ///
    /// * `ray_dir` - Direction of the arriving ray (pointing towards the surface).
    /// * `surf`    - The surface.
    /// * `u`       - Random sample: two direction coordinates and a lobe selector.
    fn sample_and_eval_bxdf(&self, ray_dir: &Vector3f, surf: &SurfaceHit, u: &[Float; 3]) -> MatSample;

    /// Evaluate the BSDF and both sampling densities for a pair of directions.
    ///
    /// * `surf` - The surface.
    /// * `wi`   - Direction towards the light side.
    /// * `wo`   - Direction towards the eye side.
    fn bxdf_eval(&self, surf: &SurfaceHit, wi: &Vector3f, wo: &Vector3f) -> BxdfEval;

    /// Returns the number of lights.
    fn light_count(&self) -> usize;

    /// Select a light for a receiving point. Returns the light and its selection probability.
    ///
    /// * `u`   - Uniform random sample.
    /// * `pos` - Receiving point.
    fn select_light(&self, u: Float, pos: &Point3f) -> Option<(usize, Float)>;

    /// Returns the probability of selecting a light.
    ///
    /// * `light_id` - The light.
    /// * `pos`      - Receiving point.
    fn light_select_pdf(&self, light_id: usize, pos: &Point3f) -> Float;

    /// Sample a point on a light as seen from a receiving point.
    ///
    /// * `light_id` - The light.
    /// * `u`        - Random sample.
    /// * `pos`      - Receiving point.
    fn sample_light(&self, light_id: usize, u: &[Float; 2], pos: &Point3f) -> ShadowSample;

    /// Returns the solid angle density with which `sample_light` produces a point on a light.
    ///
    /// * `light_id` - The light.
    /// * `from`     - Receiving point.
    /// * `pos`      - Point on the light.
    /// * `normal`   - Light normal at `pos`.
    fn light_pdf(&self, light_id: usize, from: &Point3f, pos: &Point3f, normal: &Vector3f) -> Float;

    /// Select a light and sample a ray leaving it.
    ///
    /// * `u` - Random sample: light selector, two position and two direction coordinates.
    fn sample_light_emission(&self, u: &[Float; 5]) -> Option<EmissionSample>;

    /// Returns the radiance (intensity for point lights) leaving a light point along a direction.
    ///
    /// * `light_id` - The light.
    /// * `normal`   - Light normal at the point; `None` for point lights.
    /// * `dir`      - Direction leaving the light.
    fn light_emission(&self, light_id: usize, normal: Option<&Vector3f>, dir: &Vector3f) -> Spectrum;

    /// Returns the area density of a light point and the solid angle density of an emission direction, as
    /// produced by `sample_light_emission` (selection excluded).
    ///
    /// * `light_id` - The light.
    /// * `normal`   - Light normal at the point; `None` for point lights.
    /// * `dir`      - Direction leaving the light.
    fn light_emission_pdf(&self, light_id: usize, normal: Option<&Vector3f>, dir: &Vector3f) -> (Float, Float);

    /// Returns the radiance emitted by a surface towards the origin of the arriving ray.
    ///
    /// * `ray_dir` - Direction of the arriving ray.
    /// * `surf`    - The surface.
    fn emission_eval(&self, ray_dir: &Vector3f, surf: &SurfaceHit) -> Spectrum;

    /// Returns the radiance arriving from the background along a direction.
    ///
    /// * `dir` - Direction of the escaping ray.
    fn environment(&self, _dir: &Vector3f) -> Spectrum {
        Spectrum::ZERO
    }
}
