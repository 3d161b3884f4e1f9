//! Camera

use crate::base::*;
use crate::geometry::*;

/// Pinhole camera generating eye rays from film coordinates in [0, 1)^2.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// Eye position.
    pub pos: Point3f,

    /// Camera space to world space basis: right, up, forward.
    basis: [Vector3f; 3],

    /// Half extent of the image plane at unit distance, horizontally and vertically.
    half_extent: [Float; 2],

    /// Image width in pixels.
    pub width: usize,

    /// Image height in pixels.
    pub height: usize,
}

impl Camera {
    /// Create a new camera.
    ///
    /// * `pos`    - Eye position.
    /// * `look`   - Point the camera looks at.
    /// * `up`     - Up vector.
    /// * `fov`    - Vertical field of view in degrees.
    /// * `width`  - Image width in pixels.
    /// * `height` - Image height in pixels.
    pub fn new(pos: Point3f, look: Point3f, up: Vector3f, fov: Float, width: usize, height: usize) -> Self {
        let forward = (look - pos).normalize();
        let right = forward.cross(&up).normalize();
        let true_up = right.cross(&forward);

        let tan_half = (0.5 * fov.to_radians()).tan();
        let aspect = width as Float / height as Float;

        Self {
            pos,
            basis: [right, true_up, forward],
            half_extent: [tan_half * aspect, tan_half],
            width,
            height,
        }
    }

    /// Returns the number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Returns the index of the pixel containing the film position.
    ///
    /// * `film_x` - Horizontal film coordinate in [0, 1).
    /// * `film_y` - Vertical film coordinate in [0, 1), top row first.
    pub fn pixel_index(&self, film_x: Float, film_y: Float) -> usize {
        let x = ((film_x * self.width as Float) as usize).min(self.width.saturating_sub(1));
        let y = ((film_y * self.height as Float) as usize).min(self.height.saturating_sub(1));
        y * self.width + x
    }

    /// Generate the eye ray through a film position. Returns the ray and the pixel it belongs to.
    ///
    /// * `film_x` - Horizontal film coordinate in [0, 1).
    /// * `film_y` - Vertical film coordinate in [0, 1), top row first.
    pub fn make_ray(&self, film_x: Float, film_y: Float) -> (Ray, usize) {
        let sx = (2.0 * film_x - 1.0) * self.half_extent[0];
        let sy = (1.0 - 2.0 * film_y) * self.half_extent[1];
        let [right, up, forward] = self.basis;
        let dir = (right * sx + up * sy + forward).normalize();
        (Ray::new(self.pos, dir), self.pixel_index(film_x, film_y))
    }

    /// Returns the solid angle density of generating an eye ray in a direction when film positions are
    /// sampled uniformly.
    ///
    /// * `dir` - Unit direction leaving the eye.
    pub fn pdf_dir(&self, dir: &Vector3f) -> Float {
        let cos = dir.dot(&self.basis[2]);
        if cos <= 0.0 {
            return 0.0;
        }
        let film_area = 4.0 * self.half_extent[0] * self.half_extent[1];
        1.0 / (film_area * cos * cos * cos)
    }

    /// Project a point onto the film. Returns the pixel it lands in and the unit direction from the eye to
    /// the point, or `None` when the point is behind the camera or outside the film.
    ///
    /// * `p` - Point in world space.
    pub fn project(&self, p: &Point3f) -> Option<(usize, Vector3f)> {
        let v = *p - self.pos;
        let dist = v.length();
        if dist <= 0.0 {
            return None;
        }
        let dir = v / dist;
        let [right, up, forward] = self.basis;
        let cos = dir.dot(&forward);
        if cos <= 0.0 {
            return None;
        }

        let film_x = 0.5 * (dir.dot(&right) / (cos * self.half_extent[0]) + 1.0);
        let film_y = 0.5 * (1.0 - dir.dot(&up) / (cos * self.half_extent[1]));
        if !(0.0..1.0).contains(&film_x) || !(0.0..1.0).contains(&film_y) {
            return None;
        }
        Some((self.pixel_index(film_x, film_y), dir))
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

    fn camera() -> Camera {
        Camera::new(
            Point3f::new(0.0, 0.0, 5.0),
            Point3f::zero(),
            Vector3f::new(0.0, 1.0, 0.0),
            45.0,
            64,
            32,
        )
    }

    #[test]
    fn centre_ray_looks_at_target() {
        let (ray, _) = camera().make_ray(0.5, 0.5);
        assert!(approx_eq!(f32, ray.d.z, -1.0, epsilon = 1e-6));
    }

    #[test]
    fn top_left_film_corner_maps_to_first_pixel() {
        let c = camera();
        assert_eq!(c.pixel_index(0.0, 0.0), 0);
        assert_eq!(c.pixel_index(0.99999, 0.99999), c.pixel_count() - 1);

        let (ray, _) = c.make_ray(0.0, 0.0);
        assert!(ray.d.x < 0.0 && ray.d.y > 0.0);
    }

    #[test]
    fn projection_inverts_eye_rays() {
        let c = camera();
        let (ray, pixel) = c.make_ray(0.3, 0.8);
        let (projected, dir) = c.project(&ray.at(7.0)).unwrap();
        assert_eq!(projected, pixel);
        assert!(approx_eq!(f32, dir.dot(&ray.d), 1.0, epsilon = 1e-5));

        assert!(c.project(&Point3f::new(0.0, 0.0, 6.0)).is_none());
        assert!(c.project(&Point3f::new(100.0, 0.0, 4.0)).is_none());
    }

    #[test]
    fn eye_ray_density_integrates_to_one() {
        // Midpoint rule over the film: dw = cos^3 dA on the unit distance plane.
        let c = camera();
        let n = 64;
        let [hx, hy] = c.half_extent;
        let da = (2.0 * hx / n as Float) * (2.0 * hy / n as Float);
        let mut total = 0.0;
        for i in 0..n {
            for j in 0..n {
                let (ray, _) = c.make_ray((i as Float + 0.5) / n as Float, (j as Float + 0.5) / n as Float);
                let cos = -ray.d.z;
                total += c.pdf_dir(&ray.d) * cos * cos * cos * da;
            }
        }
        assert!(approx_eq!(f32, total, 1.0, epsilon = 1e-3));
        assert_eq!(c.pdf_dir(&Vector3f::new(0.0, 0.0, 1.0)), 0.0);
    }

    #[test]
    fn empty_film_does_not_underflow() {
        let c = Camera::new(Point3f::zero(), Point3f::new(0.0, 0.0, -1.0), Vector3f::new(0.0, 1.0, 0.0), 45.0, 0, 0);
        assert_eq!(c.pixel_count(), 0);
        assert_eq!(c.pixel_index(0.5, 0.5), 0);
    }

    proptest! {
        #[test]
        fn eye_rays_are_normalized_and_pixels_in_range(fx in 0.0f32..1.0, fy in 0.0f32..1.0) {
            let c = camera();
            let (ray, pixel) = c.make_ray(fx, fy);
            prop_assert!(approx_eq!(f32, ray.d.length(), 1.0, epsilon = 1e-5));
            prop_assert!(pixel < c.pixel_count());
        }
    }
}
