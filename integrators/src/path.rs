//! Path Integrators

use light_core::app::*;
use light_core::base::*;
use light_core::camera::*;
use light_core::error::*;
use light_core::geometry::*;
use light_core::integrator::*;
use light_core::interaction::*;
use light_core::rng::*;
use light_core::scene::*;
use light_core::screen::*;
use light_core::spectrum::*;
use rayon::prelude::*;

/// Path integrator variants, in increasing order of sophistication.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathVariant {
    /// BSDF sampling only; a path contributes when it hits an emitter or escapes.
    Naive,

    /// One unweighted shadow ray per bounce; emitters hit by BSDF samples and escaped rays contribute nothing.
    Shadow,

    /// Light and BSDF sampling combined with the power heuristic.
    Mis,
}

/// Path integrator settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PathConfig {
    /// Maximum number of path segments.
    pub max_depth: usize,

    /// Seed of the per-pixel random streams.
    pub seed: u64,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self { max_depth: 5, seed: 0 }
    }
}

/// Reference path tracer. Every pass traces one path per pixel and the image is the running per-pixel
/// average over passes.
pub struct PathIntegrator {
    /// Variant.
    variant: PathVariant,

    /// Settings.
    config: PathConfig,

    /// The camera.
    camera: Camera,

    /// Accumulated radiance.
    screen: ScreenAccumulator,

    /// Completed passes.
    spp: usize,
}

impl PathIntegrator {
    /// Create a new `PathIntegrator`.
    ///
    /// * `variant` - Variant.
    /// * `camera`  - The camera.
    /// * `config`  - Settings.
    pub fn new(variant: PathVariant, camera: Camera, config: PathConfig) -> Self {
        Self {
            variant,
            config,
            screen: ScreenAccumulator::new(camera.width, camera.height),
            camera,
            spp: 0,
        }
    }

    /// Returns the number of completed passes.
    pub fn spp(&self) -> usize {
        self.spp
    }

    /// Returns the radiance arriving along a ray.
    ///
    /// * `scene` - The scene.
    /// * `ray`   - The ray.
    /// * `rng`   - Random stream of the path.
    pub fn li(&self, scene: &dyn Scene, ray: &Ray, rng: &mut RNG) -> Spectrum {
        match self.variant {
            PathVariant::Naive => self.li_naive(scene, *ray, rng),
            PathVariant::Shadow => self.li_shadow(scene, *ray, rng),
            PathVariant::Mis => self.li_mis(scene, *ray, rng),
        }
    }

    fn li_naive(&self, scene: &dyn Scene, mut ray: Ray, rng: &mut RNG) -> Spectrum {
        let mut throughput = Spectrum::ONE;

        for _depth in 0..self.config.max_depth {
            let Some(hit) = scene.trace_ray(&ray) else {
                return throughput * scene.environment(&ray.d);
            };
            let surf = scene.surface_eval(&ray, &hit);

            let emission = scene.emission_eval(&ray.d, &surf);
            if emission.dot_self() > 1e-6 {
                return throughput * emission;
            }

            let mat_sam = scene.sample_and_eval_bxdf(&ray.d, &surf, &rand3(rng));
            let bxdf_val = mat_sam.color / max(mat_sam.pdf, DEPSILON2);
            let cos_theta = mat_sam.direction.abs_dot(&surf.normal);

            throughput *= bxdf_val * cos_theta;
            if throughput.is_black() {
                break;
            }
            ray = Ray::new(
                offset_ray_pos(&surf.pos, &surf.normal, &mat_sam.direction),
                mat_sam.direction,
            );
        }
        Spectrum::ZERO
    }

    fn li_shadow(&self, scene: &dyn Scene, mut ray: Ray, rng: &mut RNG) -> Spectrum {
        let mut color = Spectrum::ZERO;
        let mut throughput = Spectrum::ONE;

        for _depth in 0..self.config.max_depth {
            // Every escaped ray counts as shadowed, including camera rays.
            let Some(hit) = scene.trace_ray(&ray) else {
                break;
            };
            let surf = scene.surface_eval(&ray, &hit);

            // Emitters are accounted for by the shadow rays.
            let emission = scene.emission_eval(&ray.d, &surf);
            if emission.dot_self() > 1e-3 {
                break;
            }

            if let Some((light_id, pick_prob)) = scene.select_light(rng.uniform_float(), &surf.pos) {
                let ls = scene.sample_light(light_id, &rand2(rng), &surf.pos);

                let shadow_dir = (ls.pos - surf.pos).normalize();
                let shadow_pos = surf.pos + shadow_dir * (max(surf.pos.max_abs_component(), 1.0) * GEPSILON);
                let shadow = scene.shadow_trace(&shadow_pos, &shadow_dir, ls.max_dist * SHADOW_DISTANCE_SCALE);

                let brdf = scene.bxdf_eval(&surf, &shadow_dir, &-ray.d).brdf;
                let cos_out = max(shadow_dir.dot(&surf.normal), 0.0);

                let explicit = ls.color * (1.0 / max(ls.pdf, DEPSILON)) * brdf * (cos_out * shadow / pick_prob);
                color += throughput * explicit;
            }

            let mat_sam = scene.sample_and_eval_bxdf(&ray.d, &surf, &rand3(rng));
            let bxdf_val = mat_sam.color / max(mat_sam.pdf, DEPSILON);
            let cos_theta = mat_sam.direction.dot(&surf.normal);

            throughput *= bxdf_val * cos_theta;
            if throughput.is_black() {
                break;
            }
            ray = Ray::new(
                offset_ray_pos(&surf.pos, &surf.normal, &mat_sam.direction),
                mat_sam.direction,
            );
        }
        color
    }

    fn li_mis(&self, scene: &dyn Scene, mut ray: Ray, rng: &mut RNG) -> Spectrum {
        let mut color = Spectrum::ZERO;
        let mut throughput = Spectrum::ONE;
        let mut mis_prev = MisData::initial();

        for depth in 0..self.config.max_depth {
            let Some(hit) = scene.trace_ray(&ray) else {
                break;
            };
            let surf = scene.surface_eval(&ray, &hit);

            let emission = scene.emission_eval(&ray.d, &surf);
            if emission.dot_self() > 1e-3 {
                let mis_weight = match surf.light_id {
                    Some(light_id) if !mis_prev.is_specular => {
                        let light_pdf = scene.light_select_pdf(light_id, &ray.o)
                            * scene.light_pdf(light_id, &ray.o, &surf.pos, &surf.normal);
                        mis_weight_heuristic(mis_prev.mat_sample_pdf, light_pdf)
                    }
                    _ => 1.0,
                };
                color += throughput * emission * mis_weight;
                break;
            } else if depth + 1 >= self.config.max_depth {
                break;
            }

            if let Some((light_id, pick_prob)) = scene.select_light(rng.uniform_float(), &surf.pos) {
                let ls = scene.sample_light(light_id, &rand2(rng), &surf.pos);

                let shadow_dir = (ls.pos - surf.pos).normalize();
                let shadow_pos = offset_shadow_ray_pos(&surf.pos, &surf.normal, &shadow_dir, surf.s_ray_off);
                let shadow = scene.shadow_trace(
                    &shadow_pos,
                    &shadow_dir,
                    shadow_pos.distance(&ls.pos) * SHADOW_DISTANCE_SCALE,
                );

                let eval = scene.bxdf_eval(&surf, &shadow_dir, &-ray.d);
                let cos_out1 = max(shadow_dir.dot(&surf.normal), 0.0);
                let cos_out2 = max(-shadow_dir.dot(&surf.normal), 0.0);
                let bxdf_val = eval.brdf * cos_out1 + eval.btdf * cos_out2;

                let light_pdf = ls.pdf * pick_prob;
                let mis_weight = if ls.is_point {
                    1.0
                } else {
                    mis_weight_heuristic(light_pdf, eval.pdf_fwd)
                };

                let explicit = ls.color * (1.0 / max(ls.pdf, DEPSILON2)) * bxdf_val * (mis_weight * shadow / pick_prob);
                color += throughput * explicit;
            }

            let mat_sam = scene.sample_and_eval_bxdf(&ray.d, &surf, &rand3(rng));
            let bxdf_val = mat_sam.color / max(mat_sam.pdf, DEPSILON);
            let cos_theta = mat_sam.direction.abs_dot(&surf.normal);

            throughput *= bxdf_val * cos_theta;
            if throughput.is_black() {
                break;
            }
            mis_prev = MisData {
                is_specular: mat_sam.is_specular,
                mat_sample_pdf: mat_sam.pdf,
            };
            ray = Ray::new(
                offset_ray_pos(&surf.pos, &surf.normal, &mat_sam.direction),
                mat_sam.direction,
            );
        }
        color
    }

    /// Trace one path per pixel and add it to the running average.
    ///
    /// * `scene` - The scene.
    fn trace_pass(&self, scene: &dyn Scene) {
        let n_pixels = self.camera.pixel_count();
        let pass = self.spp as u64;
        (0..n_pixels).into_par_iter().with_min_len(64).for_each(|pixel| {
            let mut rng = RNG::with_seed(self.config.seed, pass * n_pixels as u64 + pixel as u64);
            let x = pixel % self.camera.width;
            let y = pixel / self.camera.width;
            let fx = (x as Float + rng.uniform_float()) / self.camera.width as Float;
            let fy = (y as Float + rng.uniform_float()) / self.camera.height as Float;

            let (ray, _) = self.camera.make_ray(fx, fy);
            let color = self.li(scene, &ray, &mut rng);
            self.screen.accumulate(&color, pixel, 1.0);
        });
    }
}

impl Integrator for PathIntegrator {
    fn name(&self) -> &'static str {
        match self.variant {
            PathVariant::Naive => "naive path tracer",
            PathVariant::Shadow => "shadow ray path tracer",
            PathVariant::Mis => "MIS path tracer",
        }
    }

    fn run_pass(&mut self, scene: &dyn Scene, pass_count: usize) -> RenderResult<()> {
        let progress = create_progress_bar(pass_count as u64);
        progress.set_message("Tracing paths");
        for _ in 0..pass_count {
            self.trace_pass(scene);
            self.spp += 1;
            progress.inc(1);
        }
        progress.finish_and_clear();
        info!("{}: spp = {}", self.name(), self.spp);
        Ok(())
    }

    fn get_image(&self, out: &mut [Spectrum]) -> RenderResult<()> {
        self.screen.get_image(ResolveMode::Average, out)
    }

    fn pixel_count(&self) -> usize {
        self.camera.pixel_count()
    }
}

/// Draw two uniform samples.
#[inline]
fn rand2(rng: &mut RNG) -> [Float; 2] {
    [rng.uniform_float(), rng.uniform_float()]
}

/// Draw three uniform samples.
#[inline]
fn rand3(rng: &mut RNG) -> [Float; 3] {
    [rng.uniform_float(), rng.uniform_float(), rng.uniform_float()]
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
