//! Bidirectional sample evaluator
//!
//! Turns primary sample vectors into bidirectional paths and their contributions. Every slot carries one
//! primary sample vector and a target depth; the evaluator runs a fixed sequence of kernel stages over all
//! slots (eye rays, camera bounces, light emission, light bounces, connection). Paths traced entirely from the
//! light are connected to the eye and tagged with the pixel they project to. Bounce stages are dispatched
//! over the prefix of slots whose target depth reaches the bounce, so slots must be sorted by descending
//! target depth.

mod mis;
mod pss;
mod split;
mod vertex;

use light_core::base::*;
use light_core::camera::*;
use light_core::error::*;
use light_core::geometry::*;
use light_core::parallel::*;
use light_core::sampling::*;
use light_core::scene::*;
use light_core::spectrum::*;
use smallvec::SmallVec;

// Re-export
pub use mis::*;
pub use pss::*;
pub use split::*;
pub use vertex::*;

/// Contribution of one slot.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PathSample {
    /// Weighted and scaled radiance.
    pub contribution: Spectrum,

    /// Pixel the path belongs to.
    pub pixel: usize,
}

/// Batch evaluator of stratified bidirectional paths. Owns the per-slot scratch state, which is reused from
/// evaluation to evaluation.
pub struct SbdptEvaluator {
    /// The camera.
    camera: Camera,

    /// Primary sample layout.
    layout: PssLayout,

    /// Minimum depth.
    min_bounce: usize,

    /// Per-slot scratch state.
    slots: Vec<SlotPath>,
}

impl SbdptEvaluator {
    /// Create a new `SbdptEvaluator`.
    ///
    /// * `camera`     - The camera.
    /// * `min_bounce` - Minimum depth.
    /// * `max_bounce` - Maximum depth.
    pub fn new(camera: Camera, min_bounce: usize, max_bounce: usize) -> RenderResult<Self> {
        check_depth_range(min_bounce, max_bounce)?;
        Ok(Self {
            camera,
            layout: PssLayout::new(max_bounce),
            min_bounce,
            slots: Vec::new(),
        })
    }

    /// Returns the primary sample layout.
    pub fn layout(&self) -> PssLayout {
        self.layout
    }

    /// Returns the camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Returns the minimum depth.
    pub fn min_bounce(&self) -> usize {
        self.min_bounce
    }

    /// Returns the maximum depth.
    pub fn max_bounce(&self) -> usize {
        self.layout.max_bounce
    }

    /// Evaluate a batch of slots. The result of a slot depends only on its primary sample vector, its target
    /// depth, the scale table and the scene.
    ///
    /// * `scene`  - The scene.
    /// * `pss`    - Primary sample vectors, `layout().len()` coordinates per slot.
    /// * `split`  - Depth assignments sorted by descending target depth.
    /// * `tables` - Dispatch sizes and normalization matching `split`.
    /// * `out`    - One result per slot.
    pub fn evaluate(
        &mut self,
        scene: &dyn Scene,
        pss: &[Float],
        split: &[SplitData],
        tables: &DepthTables,
        out: &mut [PathSample],
    ) -> RenderResult<()> {
        let n = split.len();
        if pss.len() != n * self.layout.len() {
            return Err(RenderError::BufferSizeMismatch {
                expected: n * self.layout.len(),
                actual: pss.len(),
            });
        }
        if out.len() != n {
            return Err(RenderError::BufferSizeMismatch {
                expected: n,
                actual: out.len(),
            });
        }
        if self.slots.len() < n {
            self.slots.resize_with(n, SlotPath::default);
        }

        let max_bounce = self.layout.max_bounce;

        // Camera subpaths.
        self.make_eye_rays(pss, split);
        self.trace(scene, n, |slot| slot.split.current_depth < slot.camera_vertices_needed());
        self.camera_hit(scene, n);
        for bounce in 1..=max_bounce {
            let active = tables.active_threads(bounce).min(n);
            self.camera_bounce(scene, pss, bounce, active);
            self.trace(scene, active, |slot| {
                slot.split.current_depth == bounce && bounce < slot.camera_vertices_needed()
            });
            self.camera_hit(scene, active);
        }

        // Light subpaths.
        self.light_emission(scene, pss, n);
        for bounce in 1..=max_bounce {
            let active = tables.active_threads(bounce).min(n);
            self.trace(scene, active, |slot| {
                slot.light.len() == bounce && bounce < slot.light_vertices_needed()
            });
            self.light_hit(scene, active);
            if bounce < max_bounce {
                self.light_bounce(scene, pss, bounce, active);
            }
        }

        // Connections.
        self.connect(scene, tables, n);

        for (o, slot) in out.iter_mut().zip(self.slots.iter()) {
            *o = PathSample {
                contribution: slot.contribution,
                pixel: slot.pixel,
            };
        }
        Ok(())
    }

    /// Stage: generate eye rays and select strategies.
    fn make_eye_rays(&mut self, pss: &[Float], split: &[SplitData]) {
        let layout = self.layout;
        let camera = &self.camera;
        let n = split.len();
        launch(&mut self.slots[..n], |i, slot| {
            let g = layout.group(layout.slot(pss, i), 0);
            let (ray, pixel) = camera.make_ray(g[0], g[1]);
            let strategy = select_strategy(g[2], split[i].target_depth);
            slot.reset(split[i], strategy, ray, pixel);
        });
    }

    /// Stage: trace the lane ray of slots that are alive and accepted by `want`.
    fn trace<F>(&mut self, scene: &dyn Scene, active: usize, want: F)
    where
        F: Fn(&SlotPath) -> bool + Sync + Send,
    {
        launch(&mut self.slots[..active], |_, slot| {
            if !slot.alive || !want(slot) {
                slot.hit = None;
                return;
            }
            slot.hit = scene.trace_ray(&slot.ray);
            if slot.hit.is_none() {
                slot.alive = false;
            }
        });
    }

    /// Stage: append the traced hit to the camera subpath.
    fn camera_hit(&mut self, scene: &dyn Scene, active: usize) {
        let camera = &self.camera;
        launch(&mut self.slots[..active], |_, slot| {
            let Some(hit) = slot.hit.take() else {
                return;
            };
            let surf = scene.surface_eval(&slot.ray, &hit);
            let mut v = PathVertex::surface(surf, -slot.ray.d, slot.beta, 1.0);
            v.pdf_fwd = match slot.camera.last() {
                Some(prev) => prev.convert_density(slot.pdf_dir, &v),
                None => solid_angle_to_area(camera.pdf_dir(&slot.ray.d), &camera.pos, &v.pos, v.normal.as_ref()),
            };
            slot.camera.push(v);
            slot.split.current_depth = slot.camera.len();
        });
    }

    /// Stage: sample the BSDF at camera vertex `bounce`.
    fn camera_bounce(&mut self, scene: &dyn Scene, pss: &[Float], bounce: usize, active: usize) {
        let layout = self.layout;
        launch(&mut self.slots[..active], |i, slot| {
            if !slot.alive || slot.split.current_depth != bounce || bounce >= slot.camera_vertices_needed() {
                return;
            }
            let g = layout.group(layout.slot(pss, i), layout.camera_bsdf_group(bounce));
            scatter(scene, slot, [g[0], g[1], g[2]], Side::Camera);
        });
    }

    /// Stage: sample a ray leaving a light and start the light subpath.
    fn light_emission(&mut self, scene: &dyn Scene, pss: &[Float], n: usize) {
        let layout = self.layout;
        launch(&mut self.slots[..n], |i, slot| {
            slot.alive = false;
            slot.hit = None;
            if slot.light_vertices_needed() == 0 {
                return;
            }

            let g = layout.group(layout.slot(pss, i), layout.light_emission_group());
            let Some(es) = scene.sample_light_emission(&[g[0], g[1], g[2], g[3], g[4]]) else {
                return;
            };
            if es.pdf_select * es.pdf_pos <= 0.0 {
                return;
            }

            slot.delta_light = es.is_delta;
            slot.light.push(PathVertex::light(&es));

            if slot.light_vertices_needed() > 1 {
                let cos = es.normal.map_or(1.0, |n| n.abs_dot(&es.dir));
                slot.beta = es.le * (cos / (es.pdf_select * es.pdf_pos * es.pdf_dir));
                slot.pdf_dir = es.pdf_dir;
                let origin = match es.normal {
                    Some(n) => offset_ray_pos(&es.pos, &n, &es.dir),
                    None => es.pos,
                };
                slot.ray = Ray::new(origin, es.dir);
                slot.alive = !slot.beta.is_black();
            }
        });
    }

    /// Stage: append the traced hit to the light subpath.
    fn light_hit(&mut self, scene: &dyn Scene, active: usize) {
        launch(&mut self.slots[..active], |_, slot| {
            let Some(hit) = slot.hit.take() else {
                return;
            };
            let surf = scene.surface_eval(&slot.ray, &hit);
            let mut v = PathVertex::surface(surf, -slot.ray.d, slot.beta, 0.0);
            if let Some(prev) = slot.light.last() {
                v.pdf_fwd = prev.convert_density(slot.pdf_dir, &v);
            }
            slot.light.push(v);
        });
    }

    /// Stage: sample the BSDF at light vertex `bounce`.
    fn light_bounce(&mut self, scene: &dyn Scene, pss: &[Float], bounce: usize, active: usize) {
        let layout = self.layout;
        launch(&mut self.slots[..active], |i, slot| {
            if !slot.alive || slot.light.len() != bounce + 1 || slot.light.len() >= slot.light_vertices_needed() {
                slot.alive = false;
                return;
            }
            let g = layout.group(layout.slot(pss, i), layout.light_bsdf_group(bounce));
            scatter(scene, slot, [g[0], g[1], g[2]], Side::Light);
        });
    }

    /// Stage: connect the subpaths of every slot and weight the result.
    fn connect(&mut self, scene: &dyn Scene, tables: &DepthTables, n: usize) {
        let camera = &self.camera;
        launch(&mut self.slots[..n], |_, slot| {
            let (l, weight) = match slot.strategy {
                0 => connect_to_light(scene, slot),
                s if s == slot.depth() + 1 => match connect_to_camera(scene, camera, slot) {
                    Some((l, weight, pixel)) => {
                        slot.pixel = pixel;
                        (l, weight)
                    }
                    None => (Spectrum::ZERO, 0.0),
                },
                _ => connect_subpaths(scene, slot),
            };
            let c = l * (weight * tables.scale(slot.depth()));
            slot.contribution = if c.has_nans() { Spectrum::ZERO } else { c };
        });
    }
}

/// Subpath being extended by a scattering event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Side {
    Camera,
    Light,
}

/// Sample the BSDF at the last vertex of a subpath, update the lane and the reverse density of the previous
/// vertex.
///
/// * `scene` - The scene.
/// * `slot`  - The slot.
/// * `u`     - BSDF sample.
/// * `side`  - Subpath being extended.
fn scatter(scene: &dyn Scene, slot: &mut SlotPath, u: [Float; 3], side: Side) {
    let path = match side {
        Side::Camera => &mut slot.camera,
        Side::Light => &mut slot.light,
    };
    let last = path.len() - 1;
    let Some(surf) = path[last].surf else {
        slot.alive = false;
        return;
    };
    let wo = path[last].wo;

    let mat_sam = scene.sample_and_eval_bxdf(&slot.ray.d, &surf, &u);
    if mat_sam.pdf <= 0.0 || mat_sam.color.is_black() {
        slot.alive = false;
        return;
    }

    let cos = mat_sam.direction.abs_dot(&surf.normal);
    slot.beta *= mat_sam.color * (cos / max(mat_sam.pdf, DEPSILON2));

    let pdf_rev = if mat_sam.is_specular {
        path[last].delta = true;
        slot.pdf_dir = 0.0;
        0.0
    } else {
        slot.pdf_dir = mat_sam.pdf;
        // Density of sampling the direction back towards the previous vertex.
        match side {
            Side::Camera => scene.bxdf_eval(&surf, &mat_sam.direction, &wo).pdf_rev,
            Side::Light => scene.bxdf_eval(&surf, &wo, &mat_sam.direction).pdf_fwd,
        }
    };
    if last > 0 {
        let rev = path[last].convert_density(pdf_rev, &path[last - 1]);
        path[last - 1].pdf_rev = rev;
    }

    slot.ray = Ray::new(
        offset_ray_pos(&surf.pos, &surf.flat_normal, &mat_sam.direction),
        mat_sam.direction,
    );
    slot.alive = !slot.beta.is_black();
}

/// Returns the contribution and MIS weight of a camera subpath that ends on a light.
///
/// * `scene` - The scene.
/// * `slot`  - The slot.
fn connect_to_light(scene: &dyn Scene, slot: &SlotPath) -> (Spectrum, Float) {
    let d = slot.depth();
    if slot.camera.len() != d + 1 {
        return (Spectrum::ZERO, 0.0);
    }
    let z = &slot.camera[d];
    let (Some(light_id), Some(surf)) = (z.light_id, z.surf) else {
        return (Spectrum::ZERO, 0.0);
    };

    let le = scene.emission_eval(&-z.wo, &surf);
    if le.is_black() {
        return (Spectrum::ZERO, 0.0);
    }
    let l = z.beta * le;

    // Path x_0 .. x_d is the camera subpath in reverse.
    let mut path: SmallVec<[MisVertex; 8]> = slot
        .camera
        .iter()
        .rev()
        .map(|v| MisVertex {
            pdf_light: v.pdf_rev,
            pdf_camera: v.pdf_fwd,
            delta: v.delta,
        })
        .collect();

    let prev = &slot.camera[d - 1];
    let (pdf_pos, pdf_dir) = scene.light_emission_pdf(light_id, z.normal.as_ref(), &z.wo);
    path[0].pdf_light = scene.light_select_pdf(light_id, &prev.pos) * pdf_pos;
    path[0].delta = false;
    path[1].pdf_light = z.convert_density(pdf_dir, prev);

    (l, bdpt_mis_weight(&path, 0, false))
}

/// Returns the contribution and MIS weight of connecting the last light vertex to the last camera vertex.
///
/// * `scene` - The scene.
/// * `slot`  - The slot.
fn connect_subpaths(scene: &dyn Scene, slot: &SlotPath) -> (Spectrum, Float) {
    let d = slot.depth();
    let s = slot.strategy;
    let t = d + 2 - s;
    if slot.light.len() != s || slot.camera.len() < t - 1 {
        return (Spectrum::ZERO, 0.0);
    }

    let y = &slot.light[s - 1];
    let z = &slot.camera[t - 2];
    let Some(z_surf) = z.surf else {
        return (Spectrum::ZERO, 0.0);
    };

    let w = z.pos - y.pos;
    let dist2 = w.length_squared();
    if dist2 <= 0.0 {
        return (Spectrum::ZERO, 0.0);
    }
    let dist = dist2.sqrt();
    let dir = w / dist;

    // Camera side: light arrives from y.
    let eval_z = scene.bxdf_eval(&z_surf, &-dir, &z.wo);
    if eval_z.value().is_black() {
        return (Spectrum::ZERO, 0.0);
    }

    // Light side: the emitted radiance for s = 1, the BSDF towards z otherwise.
    let (f_y, pdf_y_fwd, pdf_y_rev) = match (s, y.surf) {
        (1, _) => {
            let Some(light_id) = y.light_id else {
                return (Spectrum::ZERO, 0.0);
            };
            let le = scene.light_emission(light_id, y.normal.as_ref(), &dir);
            let (_, pdf_dir) = scene.light_emission_pdf(light_id, y.normal.as_ref(), &dir);
            (le, 0.0, pdf_dir)
        }
        (_, Some(y_surf)) => {
            let eval_y = scene.bxdf_eval(&y_surf, &y.wo, &dir);
            (eval_y.value(), eval_y.pdf_fwd, eval_y.pdf_rev)
        }
        _ => return (Spectrum::ZERO, 0.0),
    };
    if f_y.is_black() {
        return (Spectrum::ZERO, 0.0);
    }

    let g = y.abs_cos(&dir) * z.abs_cos(&dir) / dist2;
    let unoccluded = y.beta * f_y * eval_z.value() * z.beta * g;
    if unoccluded.is_black() {
        return (Spectrum::ZERO, 0.0);
    }

    let origin = match y.normal {
        Some(n) => offset_shadow_ray_pos(&y.pos, &n, &dir, y.surf.map_or(0.0, |surf| surf.s_ray_off)),
        None => y.pos,
    };
    let visibility = scene.shadow_trace(&origin, &dir, origin.distance(&z.pos) * SHADOW_DISTANCE_SCALE);
    if visibility <= 0.0 {
        return (Spectrum::ZERO, 0.0);
    }

    // Path x_0 .. x_d: light vertices, then camera vertices in reverse.
    let mut path: SmallVec<[MisVertex; 8]> = slot
        .light
        .iter()
        .map(|v| MisVertex {
            pdf_light: v.pdf_fwd,
            pdf_camera: v.pdf_rev,
            delta: v.delta,
        })
        .chain(slot.camera[..t - 1].iter().rev().map(|v| MisVertex {
            pdf_light: v.pdf_rev,
            pdf_camera: v.pdf_fwd,
            delta: v.delta,
        }))
        .collect();
    debug_assert_eq!(path.len(), d + 1);

    // Densities changed by the connection.
    path[s].pdf_light = y.convert_density(pdf_y_rev, z);
    if s + 1 <= d {
        path[s + 1].pdf_light = z.convert_density(eval_z.pdf_rev, &slot.camera[t - 3]);
    }
    path[s - 1].pdf_camera = z.convert_density(eval_z.pdf_fwd, y);
    if s >= 2 {
        path[s - 2].pdf_camera = y.convert_density(pdf_y_fwd, &slot.light[s - 2]);
    }

    (unoccluded * visibility, bdpt_mis_weight(&path, s, slot.delta_light))
}

/// Returns the contribution, MIS weight and pixel of connecting the last light vertex to the eye. The
/// contribution carries the density of the eye ray through the connection so it is splatted like an eye ray
/// sample of the pixel it projects to.
///
/// * `scene`  - The scene.
/// * `camera` - The camera.
/// * `slot`   - The slot.
fn connect_to_camera(scene: &dyn Scene, camera: &Camera, slot: &SlotPath) -> Option<(Spectrum, Float, usize)> {
    let d = slot.depth();
    if slot.light.len() != d + 1 {
        return None;
    }
    let y = &slot.light[d];
    let y_surf = y.surf?;
    let y_normal = y.normal?;

    let (pixel, eye_dir) = camera.project(&y.pos)?;
    let dir = -eye_dir;
    let dist2 = camera.pos.distance_squared(&y.pos);

    let eval_y = scene.bxdf_eval(&y_surf, &y.wo, &dir);
    let f_y = eval_y.value();
    if f_y.is_black() {
        return None;
    }

    let pdf_eye = camera.pdf_dir(&eye_dir);
    let unoccluded = y.beta * f_y * (y.abs_cos(&dir) * pdf_eye / dist2);
    if unoccluded.is_black() {
        return None;
    }

    let origin = offset_shadow_ray_pos(&y.pos, &y_normal, &dir, y_surf.s_ray_off);
    let visibility = scene.shadow_trace(&origin, &dir, origin.distance(&camera.pos) * SHADOW_DISTANCE_SCALE);
    if visibility <= 0.0 {
        return None;
    }

    // Path x_0 .. x_d: the light subpath.
    let mut path: SmallVec<[MisVertex; 8]> = slot
        .light
        .iter()
        .map(|v| MisVertex {
            pdf_light: v.pdf_fwd,
            pdf_camera: v.pdf_rev,
            delta: v.delta,
        })
        .collect();

    // Densities of generating x_d and x_{d-1} from the eye.
    path[d].pdf_camera = solid_angle_to_area(pdf_eye, &camera.pos, &y.pos, Some(&y_normal));
    path[d - 1].pdf_camera = y.convert_density(eval_y.pdf_fwd, &slot.light[d - 1]);

    Some((unoccluded * visibility, bdpt_mis_weight(&path, d + 1, slot.delta_light), pixel))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use light_core::rng::*;

    fn scene() -> AnalyticScene {
        let mut scene = AnalyticScene::default();
        let white = scene.add_material(Material::Lambertian {
            albedo: Spectrum::new(0.7),
        });
        let mirror = scene.add_material(Material::Mirror {
            reflectance: Spectrum::new(0.9),
        });
        scene.add_plane(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), white);
        scene.add_sphere(Point3f::new(0.5, 0.5, 0.5), 0.5, mirror);
        scene.add_sphere_light(Point3f::new(0.0, 0.0, 3.0), 0.5, Spectrum::new(4.0));
        scene.add_point_light(Point3f::new(-1.0, 0.5, 2.0), Spectrum::new(2.0));
        scene
    }

    fn camera() -> Camera {
        Camera::new(
            Point3f::new(0.0, -4.0, 2.0),
            Point3f::zero(),
            Vector3f::new(0.0, 0.0, 1.0),
            40.0,
            16,
            16,
        )
    }

    fn random_pss(layout: PssLayout, n: usize, seed: u64) -> Vec<Float> {
        let mut rng = RNG::with_seed(seed, 0);
        let mut pss = vec![0.0; n * layout.len()];
        rng.fill_uniform(&mut pss);
        pss
    }

    #[test]
    fn evaluation_is_a_pure_function_of_the_samples() {
        let scene = scene();
        let mut evaluator = SbdptEvaluator::new(camera(), 1, 4).unwrap();
        let (split, tables) = init_split_data_uniform(1, 4, 1024).unwrap();
        let pss = random_pss(evaluator.layout(), split.len(), 7);

        let mut a = vec![PathSample::default(); split.len()];
        let mut b = vec![PathSample::default(); split.len()];
        evaluator.evaluate(&scene, &pss, &split, &tables, &mut a).unwrap();
        evaluator.evaluate(&scene, &pss, &split, &tables, &mut b).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().any(|p| !p.contribution.is_black()));
        assert!(a.iter().all(|p| !p.contribution.has_nans() && p.contribution.c.iter().all(|c| *c >= 0.0)));
    }

    #[test]
    fn slot_result_does_not_depend_on_batch() {
        let scene = scene();
        let mut evaluator = SbdptEvaluator::new(camera(), 1, 3).unwrap();
        let (split, tables) = init_split_data_uniform(1, 3, 768).unwrap();
        let layout = evaluator.layout();
        let pss = random_pss(layout, split.len(), 3);

        let mut all = vec![PathSample::default(); split.len()];
        evaluator.evaluate(&scene, &pss, &split, &tables, &mut all).unwrap();

        // Re-evaluate a single slot of each depth on its own.
        for i in [0, 300, 700] {
            let single_split = [split[i]];
            let mut single_tables = tables.clone();
            single_tables.recompute_active_threads(&single_split);
            let mut one = [PathSample::default()];
            evaluator
                .evaluate(&scene, layout.slot(&pss, i), &single_split, &single_tables, &mut one)
                .unwrap();
            assert_eq!(one[0], all[i]);
        }
    }

    #[test]
    fn light_traced_paths_land_on_their_projection() {
        let scene = scene();
        let camera = camera();
        let mut evaluator = SbdptEvaluator::new(camera, 2, 2).unwrap();
        let (split, tables) = init_split_data_uniform(2, 2, 8192).unwrap();
        let layout = evaluator.layout();
        let mut pss = random_pss(layout, split.len(), 5);
        // Force the strategy that traces the whole path from the light.
        for i in 0..split.len() {
            pss[i * layout.len() + 2] = 0.999;
        }

        let mut out = vec![PathSample::default(); split.len()];
        evaluator.evaluate(&scene, &pss, &split, &tables, &mut out).unwrap();

        let mut lit = 0;
        for (o, slot) in out.iter().zip(evaluator.slots.iter()) {
            assert_eq!(slot.strategy, 3);
            assert!(slot.camera.is_empty());
            if o.contribution.is_black() {
                continue;
            }
            lit += 1;
            assert_eq!(slot.light.len(), 3);
            let (pixel, _) = camera.project(&slot.light[2].pos).unwrap();
            assert_eq!(o.pixel, pixel);
        }
        assert!(lit > 0);
    }

    #[test]
    fn camera_progress_is_recorded() {
        let scene = scene();
        let mut evaluator = SbdptEvaluator::new(camera(), 3, 3).unwrap();
        let (split, tables) = init_split_data_uniform(3, 3, 256).unwrap();
        let pss = random_pss(evaluator.layout(), split.len(), 9);
        let mut out = vec![PathSample::default(); split.len()];
        evaluator.evaluate(&scene, &pss, &split, &tables, &mut out).unwrap();

        for slot in evaluator.slots.iter().take(split.len()) {
            assert_eq!(slot.split.current_depth, slot.camera.len());
            assert!(slot.split.current_depth <= slot.camera_vertices_needed());
        }
    }

    #[test]
    fn mismatched_buffers_are_rejected() {
        let scene = scene();
        let mut evaluator = SbdptEvaluator::new(camera(), 1, 2).unwrap();
        let (split, tables) = init_split_data_uniform(1, 2, 512).unwrap();
        let pss = random_pss(evaluator.layout(), split.len() - 1, 0);
        let mut out = vec![PathSample::default(); split.len()];
        assert!(evaluator.evaluate(&scene, &pss, &split, &tables, &mut out).is_err());
    }
}
