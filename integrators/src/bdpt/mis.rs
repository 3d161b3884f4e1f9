//! Bidirectional MIS weights

use light_core::base::*;

/// Densities of one vertex of a complete path `x_0 .. x_d`, where `x_0` lies on the light.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MisVertex {
    /// Area density of generating the vertex from the light side.
    pub pdf_light: Float,

    /// Area density of generating the vertex from the camera side.
    pub pdf_camera: Float,

    /// The vertex scatters through a Dirac delta lobe.
    pub delta: bool,
}

// Deltas have a continuous density of 0; map it to 1 so ratios cancel.
#[inline]
fn remap0(f: Float) -> Float {
    if f != 0.0 {
        f
    } else {
        1.0
    }
}

/// Returns true if strategy `s` can produce the path: it must not connect through a delta vertex, and a
/// camera subpath cannot hit a light with a delta position. Strategy `s = path.len()` connects the last light
/// vertex to the eye.
///
/// * `path`        - Path densities.
/// * `s`           - Number of light subpath vertices.
/// * `delta_light` - The light has a delta position distribution.
#[inline]
fn is_realizable(path: &[MisVertex], s: usize, delta_light: bool) -> bool {
    if s == 0 {
        !delta_light
    } else if s == path.len() {
        !path[s - 1].delta
    } else {
        !path[s - 1].delta && !path[s].delta
    }
}

/// Returns the balance heuristic weight of strategy `s` among the strategies `s' = 0 ..= d + 1` that sample a
/// path with `d + 1 = path.len()` scattering and light vertices before the eye. Strategy `d + 1` generates every
/// vertex from the light and connects to the eye; the others generate `x_d` from the eye ray.
///
/// * `path`        - Densities of `x_0 .. x_d`, with the connection overrides applied.
/// * `s`           - Number of light subpath vertices of the sampled strategy.
/// * `delta_light` - The light has a delta position distribution.
pub fn bdpt_mis_weight(path: &[MisVertex], s: usize, delta_light: bool) -> Float {
    let n = path.len();
    debug_assert!(s <= n);

    let mut sum_ri = 0.0;

    // Strategies with more light vertices.
    let mut ri = 1.0;
    for i in s..n {
        ri *= remap0(path[i].pdf_light) / remap0(path[i].pdf_camera);
        if is_realizable(path, i + 1, delta_light) {
            sum_ri += ri;
        }
    }

    // Strategies with fewer light vertices.
    ri = 1.0;
    for i in (0..s).rev() {
        ri *= remap0(path[i].pdf_camera) / remap0(path[i].pdf_light);
        if is_realizable(path, i, delta_light) {
            sum_ri += ri;
        }
    }

    1.0 / (1.0 + sum_ri)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    fn vertex(pdf_light: Float, pdf_camera: Float) -> MisVertex {
        MisVertex {
            pdf_light,
            pdf_camera,
            delta: false,
        }
    }

    #[test]
    fn hitting_the_light_competes_with_light_tracing() {
        // Strategy 0 density p_E(0), strategy 1 density p_L(0).
        let path = [vertex(0.5, 0.25)];
        assert!(approx_eq!(f32, bdpt_mis_weight(&path, 0, false), 1.0 / 3.0, ulps = 2));
        assert!(approx_eq!(f32, bdpt_mis_weight(&path, 1, false), 2.0 / 3.0, ulps = 2));
    }

    #[test]
    fn balance_heuristic_for_three_strategies() {
        // Strategy densities: p_E(0) p_E(1) = 6, p_L(0) p_E(1) = 2, p_L(0) p_L(1) = 2.
        let path = [vertex(2.0, 6.0), vertex(1.0, 1.0)];
        assert!(approx_eq!(f32, bdpt_mis_weight(&path, 0, false), 0.6, ulps = 2));
        assert!(approx_eq!(f32, bdpt_mis_weight(&path, 1, false), 0.2, ulps = 2));
        assert!(approx_eq!(f32, bdpt_mis_weight(&path, 2, false), 0.2, ulps = 2));
    }

    #[test]
    fn delta_light_cannot_be_hit() {
        let path = [vertex(1.0, 3.0), vertex(1.0, 4.0)];
        // Strategy densities: p_L(0) p_E(1) = 4 and p_L(0) p_L(1) = 1.
        assert!(approx_eq!(f32, bdpt_mis_weight(&path, 1, true), 0.8, ulps = 2));
        assert!(approx_eq!(f32, bdpt_mis_weight(&path, 2, true), 0.2, ulps = 2));
    }

    #[test]
    fn specular_vertex_excludes_connections_through_it() {
        let mut path = [vertex(1.0, 1.0), vertex(0.0, 0.0), vertex(1.0, 1.0)];
        path[1].delta = true;
        // Strategies 1 and 2 connect at the mirror; hitting the light and tracing to the eye are left.
        assert!(approx_eq!(f32, bdpt_mis_weight(&path, 0, false), 0.5, ulps = 2));
        assert!(approx_eq!(f32, bdpt_mis_weight(&path, 3, false), 0.5, ulps = 2));
    }

    #[test]
    fn caustic_from_point_light_is_only_traced_to_the_eye() {
        // Point light, mirror, diffuse vertex seen by the eye.
        let mut path = [vertex(1.0, 2.0), vertex(0.0, 0.0), vertex(3.0, 0.5)];
        path[1].delta = true;
        assert_eq!(bdpt_mis_weight(&path, 3, true), 1.0);
    }

    proptest! {
        #[test]
        fn weights_partition_unity(
            pdfs in proptest::collection::vec((0.01f32..10.0, 0.01f32..10.0), 1..7),
        ) {
            let path: Vec<MisVertex> = pdfs.iter().map(|(l, c)| vertex(*l, *c)).collect();
            let sum: Float = (0..=path.len()).map(|s| bdpt_mis_weight(&path, s, false)).sum();
            prop_assert!(approx_eq!(f32, sum, 1.0, epsilon = 1e-4));
        }

        #[test]
        fn weights_with_delta_light_partition_unity(
            pdfs in proptest::collection::vec((0.01f32..10.0, 0.01f32..10.0), 2..7),
        ) {
            let path: Vec<MisVertex> = pdfs.iter().map(|(l, c)| vertex(*l, *c)).collect();
            let sum: Float = (1..=path.len()).map(|s| bdpt_mis_weight(&path, s, true)).sum();
            prop_assert!(approx_eq!(f32, sum, 1.0, epsilon = 1e-4));
        }
    }
}
