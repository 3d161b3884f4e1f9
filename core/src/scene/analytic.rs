//! Analytic scene

use super::Scene;
use crate::base::*;
use crate::geometry::*;
use crate::interaction::*;
use crate::sampling::*;
use crate::spectrum::*;

/// Analytic shapes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    /// Sphere with center and radius.
    Sphere { center: Point3f, radius: Float },

    /// Infinite plane through a point with a unit normal.
    Plane { point: Point3f, normal: Vector3f },
}

impl Shape {
    /// Returns the distance to the closest intersection in `(0, t_max)`.
    ///
    /// * `ray`   - The ray.
    /// * `t_max` - Upper bound of the distance.
    fn intersect(&self, ray: &Ray, t_max: Float) -> Option<Float> {
        match self {
            Self::Sphere { center, radius } => {
                let oc = ray.o - *center;
                let b = oc.dot(&ray.d);
                let c = oc.length_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let sq = disc.sqrt();
                [-b - sq, -b + sq].into_iter().find(|t| *t > 0.0 && *t < t_max)
            }
            Self::Plane { point, normal } => {
                let denom = normal.dot(&ray.d);
                if denom.abs() < 1e-12 {
                    return None;
                }
                let t = (*point - ray.o).dot(normal) / denom;
                (t > 0.0 && t < t_max).then_some(t)
            }
        }
    }

    /// Returns the outward normal and texture coordinates at a point on the shape.
    ///
    /// * `p` - The point.
    fn local_geometry(&self, p: &Point3f) -> (Vector3f, [Float; 2]) {
        match self {
            Self::Sphere { center, radius } => {
                let n = (*p - *center) / *radius;
                let n = n.normalize();
                let phi = n.y.atan2(n.x);
                let phi = if phi < 0.0 { phi + TWO_PI } else { phi };
                let theta = clamp(n.z, -1.0, 1.0).acos();
                (n, [phi / TWO_PI, theta * INV_PI])
            }
            Self::Plane { normal, .. } => (*normal, [0.0, 0.0]),
        }
    }
}

/// Reference materials.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Material {
    /// Two-sided diffuse reflector.
    Lambertian { albedo: Spectrum },

    /// Perfect specular reflector.
    Mirror { reflectance: Spectrum },

    /// Black body emitting constant radiance from its front side.
    Emissive { radiance: Spectrum },
}

/// Reference lights.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Light {
    /// Isotropic point light.
    Point { pos: Point3f, intensity: Spectrum },

    /// Spherical area light sampled uniformly by area.
    Sphere {
        center: Point3f,
        radius: Float,
        radiance: Spectrum,
    },
}

impl Light {
    /// Returns the area density of uniform position sampling; 1 for point lights.
    fn pdf_pos(&self) -> Float {
        match self {
            Self::Point { .. } => 1.0,
            Self::Sphere { radius, .. } => 1.0 / (FOUR_PI * radius * radius),
        }
    }
}

/// A shape with a material, optionally registered as a light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Instance {
    /// Geometry.
    pub shape: Shape,

    /// Material.
    pub mat_id: usize,

    /// Light the instance is registered as.
    pub light_id: Option<usize>,
}

/// A scene of analytic spheres and planes with closed-form lighting, used as the reference scene for the
/// integrators. Lights are selected uniformly.
#[derive(Clone, Debug, Default)]
pub struct AnalyticScene {
    /// Instances.
    pub instances: Vec<Instance>,

    /// Materials.
    pub materials: Vec<Material>,

    /// Lights.
    pub lights: Vec<Light>,

    /// Constant background radiance.
    pub background: Spectrum,
}

impl AnalyticScene {
    /// Create an empty scene.
    ///
    /// * `background` - Constant background radiance.
    pub fn new(background: Spectrum) -> Self {
        Self {
            background,
            ..Default::default()
        }
    }

    /// Add a material and return its index.
    ///
    /// * `material` - The material.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add a sphere and return its instance index.
    ///
    /// * `center` - Center.
    /// * `radius` - Radius.
    /// * `mat_id` - Material.
    pub fn add_sphere(&mut self, center: Point3f, radius: Float, mat_id: usize) -> usize {
        self.add_instance(Shape::Sphere { center, radius }, mat_id, None)
    }

    /// Add a plane and return its instance index.
    ///
    /// * `point`  - A point on the plane.
    /// * `normal` - Plane normal.
    /// * `mat_id` - Material.
    pub fn add_plane(&mut self, point: Point3f, normal: Vector3f, mat_id: usize) -> usize {
        self.add_instance(
            Shape::Plane {
                point,
                normal: normal.normalize(),
            },
            mat_id,
            None,
        )
    }

    /// Add a point light and return its light index.
    ///
    /// * `pos`       - Position.
    /// * `intensity` - Radiant intensity.
    pub fn add_point_light(&mut self, pos: Point3f, intensity: Spectrum) -> usize {
        self.lights.push(Light::Point { pos, intensity });
        self.lights.len() - 1
    }

    /// Add a spherical area light with its emissive geometry and return its light index.
    ///
    /// * `center`   - Center.
    /// * `radius`   - Radius.
    /// * `radiance` - Emitted radiance.
    pub fn add_sphere_light(&mut self, center: Point3f, radius: Float, radiance: Spectrum) -> usize {
        let mat_id = self.add_material(Material::Emissive { radiance });
        self.lights.push(Light::Sphere {
            center,
            radius,
            radiance,
        });
        let light_id = self.lights.len() - 1;
        self.add_instance(Shape::Sphere { center, radius }, mat_id, Some(light_id));
        light_id
    }

    fn add_instance(&mut self, shape: Shape, mat_id: usize, light_id: Option<usize>) -> usize {
        self.instances.push(Instance {
            shape,
            mat_id,
            light_id,
        });
        self.instances.len() - 1
    }

    fn closest_hit(&self, ray: &Ray, t_max: Float) -> Option<Hit> {
        let mut closest: Option<Hit> = None;
        for (i, instance) in self.instances.iter().enumerate() {
            let bound = closest.map_or(t_max, |h| h.t);
            if let Some(t) = instance.shape.intersect(ray, bound) {
                closest = Some(Hit::new(t, i));
            }
        }
        closest
    }

    fn material(&self, mat_id: usize) -> Option<&Material> {
        self.materials.get(mat_id)
    }
}

impl Scene for AnalyticScene {
    fn trace_ray(&self, ray: &Ray) -> Option<Hit> {
        self.closest_hit(ray, INFINITY)
    }

    fn shadow_trace(&self, pos: &Point3f, dir: &Vector3f, max_dist: Float) -> Float {
        let ray = Ray::new(*pos, *dir);
        let occluded = self.instances.iter().any(|i| i.shape.intersect(&ray, max_dist).is_some());
        if occluded {
            0.0
        } else {
            1.0
        }
    }

    fn surface_eval(&self, ray: &Ray, hit: &Hit) -> SurfaceHit {
        let instance = &self.instances[hit.instance_id];
        let pos = ray.at(hit.t);
        let (normal, tex_coord) = instance.shape.local_geometry(&pos);
        SurfaceHit::new(pos, normal, tex_coord, instance.mat_id, instance.light_id)
    }

    fn sample_and_eval_bxdf(&self, ray_dir: &Vector3f, surf: &SurfaceHit, u: &[Float; 3]) -> MatSample {
        let wo = -*ray_dir;
        let n = surf.normal.face_forward(&wo);
        match self.material(surf.mat_id) {
            Some(Material::Lambertian { albedo }) => {
                let local = cosine_sample_hemisphere(&[u[0], u[1]]);
                let pdf = cosine_hemisphere_pdf(local.z);
                if pdf <= 0.0 {
                    return MatSample::absorbed();
                }
                let direction = local_to_world(&local, &surf.tangent, &surf.bitangent, &n).normalize();
                MatSample {
                    direction,
                    color: *albedo * INV_PI,
                    pdf,
                    is_specular: false,
                }
            }
            Some(Material::Mirror { reflectance }) => {
                let cos = wo.dot(&n);
                let direction = n * (2.0 * cos) - wo;
                MatSample {
                    direction,
                    color: *reflectance / max(cos.abs(), DEPSILON),
                    pdf: 1.0,
                    is_specular: true,
                }
            }
            Some(Material::Emissive { .. }) | None => MatSample::absorbed(),
        }
    }

    fn bxdf_eval(&self, surf: &SurfaceHit, wi: &Vector3f, wo: &Vector3f) -> BxdfEval {
        match self.material(surf.mat_id) {
            Some(Material::Lambertian { albedo }) => {
                let same_side = wi.dot(&surf.flat_normal) * wo.dot(&surf.flat_normal) > 0.0;
                if !same_side {
                    return BxdfEval::zero();
                }
                BxdfEval {
                    brdf: *albedo * INV_PI,
                    btdf: Spectrum::ZERO,
                    pdf_fwd: cosine_hemisphere_pdf(wi.abs_dot(&surf.normal)),
                    pdf_rev: cosine_hemisphere_pdf(wo.abs_dot(&surf.normal)),
                }
            }
            _ => BxdfEval::zero(),
        }
    }

    fn light_count(&self) -> usize {
        self.lights.len()
    }

    fn select_light(&self, u: Float, _pos: &Point3f) -> Option<(usize, Float)> {
        let n = self.lights.len();
        if n == 0 {
            return None;
        }
        let idx = ((u * n as Float) as usize).min(n - 1);
        Some((idx, 1.0 / n as Float))
    }

    fn light_select_pdf(&self, light_id: usize, _pos: &Point3f) -> Float {
        if light_id < self.lights.len() {
            1.0 / self.lights.len() as Float
        } else {
            0.0
        }
    }

    fn sample_light(&self, light_id: usize, u: &[Float; 2], pos: &Point3f) -> ShadowSample {
        match self.lights[light_id] {
            Light::Point { pos: lpos, intensity } => {
                let dist2 = pos.distance_squared(&lpos);
                ShadowSample {
                    pos: lpos,
                    color: intensity,
                    pdf: dist2,
                    max_dist: dist2.sqrt(),
                    is_point: true,
                }
            }
            Light::Sphere {
                center,
                radius,
                radiance,
            } => {
                let n = uniform_sample_sphere(u);
                let lpos = center + n * radius;
                let w = lpos - *pos;
                let dist = w.length();
                let pdf = if dist > 0.0 {
                    self.light_pdf(light_id, pos, &lpos, &n)
                } else {
                    0.0
                };
                let facing = dist > 0.0 && n.dot(&(w / dist)) < 0.0;
                ShadowSample {
                    pos: lpos,
                    color: if facing { radiance } else { Spectrum::ZERO },
                    pdf: if facing { pdf } else { 0.0 },
                    max_dist: dist,
                    is_point: false,
                }
            }
        }
    }

    fn light_pdf(&self, light_id: usize, from: &Point3f, pos: &Point3f, normal: &Vector3f) -> Float {
        let light = match self.lights.get(light_id) {
            Some(light @ Light::Sphere { .. }) => light,
            _ => return 0.0,
        };
        let w = *pos - *from;
        let dist2 = w.length_squared();
        if dist2 == 0.0 {
            return 0.0;
        }
        let cos = normal.abs_dot(&(w / dist2.sqrt()));
        if cos == 0.0 {
            return 0.0;
        }
        light.pdf_pos() * dist2 / cos
    }

    fn sample_light_emission(&self, u: &[Float; 5]) -> Option<EmissionSample> {
        let (light_id, pdf_select) = self.select_light(u[0], &Point3f::zero())?;
        let light = self.lights[light_id];
        let sample = match light {
            Light::Point { pos, intensity } => EmissionSample {
                light_id,
                pos,
                normal: None,
                dir: uniform_sample_sphere(&[u[3], u[4]]),
                le: intensity,
                pdf_select,
                pdf_pos: 1.0,
                pdf_dir: uniform_sphere_pdf(),
                is_delta: true,
            },
            Light::Sphere {
                center,
                radius,
                radiance,
            } => {
                let n = uniform_sample_sphere(&[u[1], u[2]]);
                let local = cosine_sample_hemisphere(&[u[3], u[4]]);
                let (tangent, bitangent) = coordinate_system(&n);
                EmissionSample {
                    light_id,
                    pos: center + n * radius,
                    normal: Some(n),
                    dir: local_to_world(&local, &tangent, &bitangent, &n).normalize(),
                    le: radiance,
                    pdf_select,
                    pdf_pos: light.pdf_pos(),
                    pdf_dir: cosine_hemisphere_pdf(local.z),
                    is_delta: false,
                }
            }
        };
        (sample.pdf_dir > 0.0).then_some(sample)
    }

    fn light_emission(&self, light_id: usize, normal: Option<&Vector3f>, dir: &Vector3f) -> Spectrum {
        match (self.lights.get(light_id), normal) {
            (Some(Light::Point { intensity, .. }), _) => *intensity,
            (Some(Light::Sphere { radiance, .. }), Some(n)) if n.dot(dir) > 0.0 => *radiance,
            _ => Spectrum::ZERO,
        }
    }

    fn light_emission_pdf(&self, light_id: usize, normal: Option<&Vector3f>, dir: &Vector3f) -> (Float, Float) {
        match (self.lights.get(light_id), normal) {
            (Some(light @ Light::Point { .. }), _) => (light.pdf_pos(), uniform_sphere_pdf()),
            (Some(light @ Light::Sphere { .. }), Some(n)) => {
                (light.pdf_pos(), cosine_hemisphere_pdf(max(0.0, n.dot(dir))))
            }
            _ => (0.0, 0.0),
        }
    }

    fn emission_eval(&self, ray_dir: &Vector3f, surf: &SurfaceHit) -> Spectrum {
        match self.material(surf.mat_id) {
            Some(Material::Emissive { radiance }) if surf.normal.dot(ray_dir) < 0.0 => *radiance,
            _ => Spectrum::ZERO,
        }
    }

    fn environment(&self, _dir: &Vector3f) -> Spectrum {
        self.background
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    fn scene() -> AnalyticScene {
        let mut scene = AnalyticScene::new(Spectrum::new(0.1));
        let diffuse = scene.add_material(Material::Lambertian {
            albedo: Spectrum::new(0.5),
        });
        scene.add_plane(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), diffuse);
        scene.add_sphere_light(Point3f::new(0.0, 0.0, 3.0), 1.0, Spectrum::new(2.0));
        scene.add_point_light(Point3f::new(0.0, 0.0, 1.0), Spectrum::new(4.0));
        scene
    }

    #[test]
    fn closest_hit_is_reported() {
        let s = scene();
        let ray = Ray::new(Point3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, -1.0));
        let hit = s.trace_ray(&ray).unwrap();
        assert!(approx_eq!(f32, hit.t, 1.0, epsilon = 1e-5));

        let surf = s.surface_eval(&ray, &hit);
        assert_eq!(surf.light_id, Some(0));
        assert_eq!(s.emission_eval(&ray.d, &surf), Spectrum::new(2.0));
    }

    #[test]
    fn miss_returns_background() {
        let s = scene();
        let ray = Ray::new(Point3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, 1.0));
        assert!(s.trace_ray(&ray).is_none());
        assert_eq!(s.environment(&ray.d), Spectrum::new(0.1));
    }

    #[test]
    fn shadow_trace_respects_max_distance() {
        let s = scene();
        let p = Point3f::new(0.0, 0.0, 0.001);
        let up = Vector3f::new(0.0, 0.0, 1.0);
        assert_eq!(s.shadow_trace(&p, &up, 1.5), 1.0);
        assert_eq!(s.shadow_trace(&p, &up, 2.5), 0.0);
    }

    #[test]
    fn point_light_sample_gives_inverse_square_irradiance() {
        let s = scene();
        let ls = s.sample_light(1, &[0.5, 0.5], &Point3f::zero());
        assert!(ls.is_point);
        assert!(approx_eq!(f32, ls.color[0] / ls.pdf, 4.0, epsilon = 1e-6));
        assert_eq!(s.light_pdf(1, &Point3f::zero(), &ls.pos, &Vector3f::new(0.0, 0.0, 1.0)), 0.0);
    }

    #[test]
    fn mirror_reflects_about_normal() {
        let mut s = AnalyticScene::default();
        let m = s.add_material(Material::Mirror {
            reflectance: Spectrum::ONE,
        });
        let surf = SurfaceHit::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), [0.0, 0.0], m, None);
        let d = Vector3f::new(1.0, 0.0, -1.0).normalize();
        let ms = s.sample_and_eval_bxdf(&d, &surf, &[0.3, 0.3, 0.3]);
        assert!(ms.is_specular);
        assert!(approx_eq!(f32, ms.direction.z, d.x, epsilon = 1e-6));
        assert!(s.bxdf_eval(&surf, &ms.direction, &-d).value().is_black());
    }

    proptest! {
        #[test]
        fn lambertian_sample_matches_eval(u0 in 0.0f32..1.0, u1 in 0.0f32..1.0) {
            let s = scene();
            let surf = SurfaceHit::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), [0.0, 0.0], 0, None);
            let d = Vector3f::new(0.2, 0.1, -1.0).normalize();
            let ms = s.sample_and_eval_bxdf(&d, &surf, &[u0, u1, 0.5]);
            prop_assume!(ms.pdf > 1e-4);
            let e = s.bxdf_eval(&surf, &ms.direction, &-d);
            prop_assert!(approx_eq!(f32, e.pdf_fwd, ms.pdf, epsilon = 1e-4));
            prop_assert!(approx_eq!(f32, e.brdf[0], ms.color[0], epsilon = 1e-6));
        }

        #[test]
        fn sphere_light_sample_matches_pdf(u0 in 0.0f32..1.0, u1 in 0.0f32..1.0) {
            let s = scene();
            let from = Point3f::new(0.5, 0.0, 0.0);
            let ls = s.sample_light(0, &[u0, u1], &from);
            prop_assume!(ls.pdf > 0.0);
            let n = (ls.pos - Point3f::new(0.0, 0.0, 3.0)).normalize();
            prop_assert!(approx_eq!(f32, s.light_pdf(0, &from, &ls.pos, &n), ls.pdf, epsilon = 1e-3 * ls.pdf));
        }

        #[test]
        fn emission_sample_matches_pdf(u in proptest::array::uniform5(0.0f32..1.0)) {
            let s = scene();
            if let Some(es) = s.sample_light_emission(&u) {
                let (pdf_pos, pdf_dir) = s.light_emission_pdf(es.light_id, es.normal.as_ref(), &es.dir);
                prop_assert!(approx_eq!(f32, pdf_pos, es.pdf_pos, epsilon = 1e-6));
                prop_assert!(approx_eq!(f32, pdf_dir, es.pdf_dir, epsilon = 1e-4));
                prop_assert_eq!(es.pdf_select, 0.5);
            }
        }
    }
}
