//! Demo scene

use light_core::base::*;
use light_core::camera::*;
use light_core::geometry::*;
use light_core::scene::*;
use light_core::spectrum::*;

/// Build a closed box with a mirror ball, a diffuse ball, a spherical ceiling light and a point light.
///
/// * `width`  - Image width.
/// * `height` - Image height.
pub fn demo_scene(width: usize, height: usize) -> (AnalyticScene, Camera) {
    let mut scene = AnalyticScene::default();

    let white = scene.add_material(Material::Lambertian {
        albedo: Spectrum::new(0.73),
    });
    let red = scene.add_material(Material::Lambertian {
        albedo: Spectrum::from_rgb(0.65, 0.05, 0.05),
    });
    let green = scene.add_material(Material::Lambertian {
        albedo: Spectrum::from_rgb(0.12, 0.45, 0.15),
    });
    let mirror = scene.add_material(Material::Mirror {
        reflectance: Spectrum::new(0.9),
    });

    // Walls of a 2x2x2 box open towards the camera.
    scene.add_plane(Point3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0), white);
    scene.add_plane(Point3f::new(0.0, 0.0, 2.0), Vector3f::new(0.0, 0.0, -1.0), white);
    scene.add_plane(Point3f::new(0.0, 1.0, 0.0), Vector3f::new(0.0, -1.0, 0.0), white);
    scene.add_plane(Point3f::new(-1.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0), red);
    scene.add_plane(Point3f::new(1.0, 0.0, 0.0), Vector3f::new(-1.0, 0.0, 0.0), green);

    scene.add_sphere(Point3f::new(-0.45, 0.35, 0.35), 0.35, mirror);
    scene.add_sphere(Point3f::new(0.45, -0.1, 0.3), 0.3, white);

    scene.add_sphere_light(Point3f::new(0.0, 0.2, 1.75), 0.15, Spectrum::new(12.0));
    scene.add_point_light(Point3f::new(0.6, -0.6, 1.6), Spectrum::new(0.5));

    let fov: Float = 40.0;
    let camera = Camera::new(
        Point3f::new(0.0, -3.7, 1.0),
        Point3f::new(0.0, 0.0, 1.0),
        Vector3f::new(0.0, 0.0, 1.0),
        fov,
        width,
        height,
    );
    (scene, camera)
}
