//! Shading frames and ray offsets

use super::*;
use crate::base::*;

/// Build an orthonormal tangent frame around a unit normal.
///
/// * `n` - The unit normal.
pub fn coordinate_system(n: &Vector3f) -> (Vector3f, Vector3f) {
    let sign = 1.0_f32.copysign(n.z);
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;
    let tangent = Vector3f::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bitangent = Vector3f::new(b, sign + n.y * n.y * a, -n.y);
    (tangent, bitangent)
}

/// Transform a direction given in the local frame `(tangent, bitangent, normal)` to world space.
///
/// * `v`         - Local direction.
/// * `tangent`   - Tangent.
/// * `bitangent` - Bitangent.
/// * `n`         - Normal.
#[inline]
pub fn local_to_world(v: &Vector3f, tangent: &Vector3f, bitangent: &Vector3f, n: &Vector3f) -> Vector3f {
    *tangent * v.x + *bitangent * v.y + *n * v.z
}

/// Offset the origin of a continuation ray to the side of the surface the ray leaves towards.
///
/// * `pos` - Surface position.
/// * `n`   - Surface normal.
/// * `dir` - Direction of the new ray.
pub fn offset_ray_pos(pos: &Point3f, n: &Vector3f, dir: &Vector3f) -> Point3f {
    let eps = max(pos.max_abs_component(), 1.0) * GEPSILON;
    if dir.dot(n) < 0.0 {
        *pos - *n * eps
    } else {
        *pos + *n * eps
    }
}

/// Offset the origin of a shadow ray. The surface hint scales the offset for surfaces whose tessellation
/// is coarser than their shading.
///
/// * `pos`        - Surface position.
/// * `n`          - Surface normal.
/// * `dir`        - Shadow ray direction.
/// * `s_ray_off`  - Surface specific offset hint.
pub fn offset_shadow_ray_pos(pos: &Point3f, n: &Vector3f, dir: &Vector3f, s_ray_off: Float) -> Point3f {
    let eps = max(pos.max_abs_component(), 1.0) * GEPSILON * (1.0 + s_ray_off);
    if dir.dot(n) < 0.0 {
        *pos - *n * eps
    } else {
        *pos + *n * eps
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
