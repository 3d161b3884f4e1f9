//! Primary sample space layout

use light_core::base::*;

/// Number of coordinates in one group of the primary sample vector.
pub const RANDS_PER_GROUP: usize = 6;

/// Layout of a primary sample vector: `1 + 2 * max_bounce` groups of `RANDS_PER_GROUP` coordinates.
///
/// | group                    | use                                                    |
/// |--------------------------|--------------------------------------------------------|
/// | 0                        | film x, film y, strategy selector                      |
/// | 1 ..= max_bounce         | BSDF sample at camera vertex `b` (u, v, lobe)          |
/// | max_bounce + 1           | light selector, position (u, v), direction (u, v)      |
/// | max_bounce + 1 + b       | BSDF sample at light vertex `b`, `b` in 1..max_bounce  |
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PssLayout {
    /// Maximum number of scattering vertices.
    pub max_bounce: usize,
}

impl PssLayout {
    /// Create a new `PssLayout`.
    ///
    /// * `max_bounce` - Maximum number of scattering vertices.
    pub fn new(max_bounce: usize) -> Self {
        Self { max_bounce }
    }

    /// Returns the number of coordinate groups.
    pub fn group_count(&self) -> usize {
        1 + 2 * self.max_bounce
    }

    /// Returns the number of coordinates in a primary sample vector.
    pub fn len(&self) -> usize {
        self.group_count() * RANDS_PER_GROUP
    }

    /// Returns the group of the BSDF sample at camera vertex `bounce`.
    ///
    /// * `bounce` - Vertex index along the camera subpath, starting at 1.
    pub fn camera_bsdf_group(&self, bounce: usize) -> usize {
        debug_assert!(bounce >= 1 && bounce <= self.max_bounce);
        bounce
    }

    /// Returns the group of the light emission sample.
    pub fn light_emission_group(&self) -> usize {
        self.max_bounce + 1
    }

    /// Returns the group of the BSDF sample at light vertex `bounce`.
    ///
    /// * `bounce` - Vertex index along the light subpath, starting at 1.
    pub fn light_bsdf_group(&self, bounce: usize) -> usize {
        debug_assert!(bounce >= 1 && bounce < self.max_bounce);
        self.max_bounce + 1 + bounce
    }

    /// Returns the coordinates of a group.
    ///
    /// * `x`     - Primary sample vector.
    /// * `group` - The group.
    pub fn group<'a>(&self, x: &'a [Float], group: usize) -> &'a [Float; RANDS_PER_GROUP] {
        let start = group * RANDS_PER_GROUP;
        let g: &[Float] = &x[start..start + RANDS_PER_GROUP];
        g.try_into().unwrap_or(&[0.0; RANDS_PER_GROUP])
    }

    /// Returns the primary sample vector of a slot in a slot-major buffer.
    ///
    /// * `buffer` - `len()` coordinates per slot.
    /// * `slot`   - The slot.
    pub fn slot<'a>(&self, buffer: &'a [Float], slot: usize) -> &'a [Float] {
        let len = self.len();
        &buffer[slot * len..(slot + 1) * len]
    }
}

/// Select the connection strategy (number of light subpath vertices) for a path with `depth` scattering
/// vertices, uniformly from `[0, depth + 1]`. Strategy `depth + 1` traces the whole path from the light and
/// connects it to the eye.
///
/// * `u`     - Uniform sample.
/// * `depth` - Target depth.
pub fn select_strategy(u: Float, depth: usize) -> usize {
    min((u * strategy_count(depth) as Float) as usize, depth + 1)
}

/// Returns the number of connection strategies of a path with `depth` scattering vertices.
///
/// * `depth` - Target depth.
#[inline]
pub fn strategy_count(depth: usize) -> usize {
    depth + 2
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn groups_do_not_overlap() {
        let layout = PssLayout::new(5);
        assert_eq!(layout.group_count(), 11);
        assert_eq!(layout.len(), 66);

        let mut groups = vec![0];
        groups.extend((1..=5).map(|b| layout.camera_bsdf_group(b)));
        groups.push(layout.light_emission_group());
        groups.extend((1..5).map(|b| layout.light_bsdf_group(b)));
        groups.sort_unstable();
        assert_eq!(groups, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn every_strategy_is_selectable() {
        assert_eq!(select_strategy(0.0, 2), 0);
        assert_eq!(select_strategy(0.5, 2), 2);
        assert_eq!(select_strategy(0.99, 2), 3);
        assert_eq!(select_strategy(1.0, 2), 3);
        assert_eq!(strategy_count(2), 4);
    }

    #[test]
    fn group_returns_its_coordinates() {
        let layout = PssLayout::new(2);
        let x: Vec<Float> = (0..layout.len()).map(|i| i as Float).collect();
        assert_eq!(layout.group(&x, 3)[0], 18.0);
        assert_eq!(layout.slot(&x, 0).len(), layout.len());
    }

    proptest! {
        #[test]
        fn strategy_is_within_depth(u in 0.0f32..1.0, depth in 1usize..16) {
            prop_assert!(select_strategy(u, depth) <= depth + 1);
        }
    }
}
