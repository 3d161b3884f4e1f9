//! Path vertices

use super::split::SplitData;
use light_core::base::*;
use light_core::geometry::*;
use light_core::interaction::*;
use light_core::sampling::*;
use light_core::spectrum::*;
use smallvec::SmallVec;

/// Subpath vertices stored inline per slot before spilling to the heap.
pub const INLINE_VERTICES: usize = 4;

/// Vertex storage of one subpath.
pub type Subpath = SmallVec<[PathVertex; INLINE_VERTICES]>;

/// A vertex of a camera or light subpath.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathVertex {
    /// Position.
    pub pos: Point3f,

    /// Geometric normal used for density conversions; `None` for point lights.
    pub normal: Option<Vector3f>,

    /// Surface geometry; `None` for the light endpoint of a light subpath.
    pub surf: Option<SurfaceHit>,

    /// Light the vertex lies on.
    pub light_id: Option<usize>,

    /// Direction towards the previous vertex of the subpath.
    pub wo: Vector3f,

    /// Throughput of the subpath up to and including the arrival at this vertex.
    pub beta: Spectrum,

    /// Area density of the vertex in the direction its subpath was generated.
    pub pdf_fwd: Float,

    /// Area density of the vertex if it had been generated from the other end.
    pub pdf_rev: Float,

    /// The vertex scatters through a Dirac delta lobe.
    pub delta: bool,
}

impl PathVertex {
    /// Create a vertex at a surface hit.
    ///
    /// * `surf`    - The surface.
    /// * `wo`      - Direction towards the previous vertex.
    /// * `beta`    - Subpath throughput.
    /// * `pdf_fwd` - Area density of the vertex.
    pub fn surface(surf: SurfaceHit, wo: Vector3f, beta: Spectrum, pdf_fwd: Float) -> Self {
        Self {
            pos: surf.pos,
            normal: Some(surf.flat_normal),
            surf: Some(surf),
            light_id: surf.light_id,
            wo,
            beta,
            pdf_fwd,
            pdf_rev: 0.0,
            delta: false,
        }
    }

    /// Create the light endpoint of a light subpath.
    ///
    /// * `es` - The emission sample that started the subpath.
    pub fn light(es: &EmissionSample) -> Self {
        let pdf = es.pdf_select * es.pdf_pos;
        Self {
            pos: es.pos,
            normal: es.normal,
            surf: None,
            light_id: Some(es.light_id),
            wo: Vector3f::zero(),
            beta: Spectrum::ONE / pdf,
            pdf_fwd: pdf,
            pdf_rev: 0.0,
            delta: false,
        }
    }

    /// Convert a solid angle density at this vertex into an area density at another vertex.
    ///
    /// * `pdf`  - Solid angle density.
    /// * `next` - The vertex the direction points to.
    pub fn convert_density(&self, pdf: Float, next: &PathVertex) -> Float {
        solid_angle_to_area(pdf, &self.pos, &next.pos, next.normal.as_ref())
    }

    /// Returns the cosine between the geometric normal and a direction; 1 for point lights.
    ///
    /// * `w` - Unit direction.
    pub fn abs_cos(&self, w: &Vector3f) -> Float {
        self.normal.map_or(1.0, |n| n.abs_dot(w))
    }
}

/// Scratch state of one sample slot for one evaluation: the lane carried from stage to stage and the vertices
/// of both subpaths.
#[derive(Clone, Debug, Default)]
pub struct SlotPath {
    /// Depth assignment and progress.
    pub split: SplitData,

    /// Number of light subpath vertices of the selected strategy.
    pub strategy: usize,

    /// Pixel the eye ray belongs to.
    pub pixel: usize,

    /// Ray of the subpath currently being extended.
    pub ray: Ray,

    /// Result of tracing `ray`.
    pub hit: Option<Hit>,

    /// The subpath currently being extended is still alive.
    pub alive: bool,

    /// Throughput carried to the next vertex.
    pub beta: Spectrum,

    /// Solid angle density of `ray`'s direction; 0 after a specular bounce.
    pub pdf_dir: Float,

    /// The light subpath starts on a light with a delta position distribution.
    pub delta_light: bool,

    /// Camera subpath vertices, starting at the eye vertex.
    pub camera: Subpath,

    /// Light subpath vertices, starting on the light.
    pub light: Subpath,

    /// Weighted contribution of the slot.
    pub contribution: Spectrum,
}

impl SlotPath {
    /// Returns the number of scattering vertices of the assigned path.
    pub fn depth(&self) -> usize {
        self.split.target_depth
    }

    /// Returns the number of surface vertices the camera subpath needs, including the light vertex when the
    /// strategy hits the light. Strategies that connect the light subpath to the eye need none.
    pub fn camera_vertices_needed(&self) -> usize {
        self.depth() + 1 - self.strategy
    }

    /// Returns the number of vertices the light subpath needs.
    pub fn light_vertices_needed(&self) -> usize {
        self.strategy
    }

    /// Reset the slot for a new evaluation.
    ///
    /// * `split`    - Depth assignment.
    /// * `strategy` - Number of light subpath vertices.
    /// * `ray`      - Eye ray.
    /// * `pixel`    - Pixel of the eye ray.
    pub fn reset(&mut self, split: SplitData, strategy: usize, ray: Ray, pixel: usize) {
        self.split = SplitData::new(split.target_depth);
        self.strategy = strategy;
        self.pixel = pixel;
        self.ray = ray;
        self.hit = None;
        self.alive = true;
        self.beta = Spectrum::ONE;
        self.pdf_dir = 1.0;
        self.delta_light = false;
        self.camera.clear();
        self.light.clear();
        self.contribution = Spectrum::ZERO;
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
    fn density_conversion_uses_receiver_cosine() {
        let a = PathVertex::surface(
            SurfaceHit::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), [0.0, 0.0], 0, None),
            Vector3f::new(0.0, 0.0, 1.0),
            Spectrum::ONE,
            1.0,
        );
        let mut b = a;
        b.pos = Point3f::new(0.0, 0.0, 2.0);
        b.normal = Some(Vector3f::new(0.0, 0.0, -1.0));
        assert!(approx_eq!(f32, a.convert_density(1.0, &b), 0.25, ulps = 2));

        b.normal = None;
        assert!(approx_eq!(f32, a.convert_density(1.0, &b), 0.25, ulps = 2));
    }

    #[test]
    fn strategy_splits_vertices_between_subpaths() {
        let mut slot = SlotPath::default();
        slot.reset(SplitData::new(3), 1, Ray::default(), 0);
        assert_eq!(slot.camera_vertices_needed(), 3);
        assert_eq!(slot.light_vertices_needed(), 1);
        assert!(slot.alive);

        slot.reset(SplitData::new(3), 4, Ray::default(), 0);
        assert_eq!(slot.camera_vertices_needed(), 0);
        assert_eq!(slot.light_vertices_needed(), 4);
        assert_eq!(slot.split.current_depth, 0);
    }
}
