//! Ray

use super::*;
use crate::base::*;
use std::fmt;

/// A semi-infinite line specified by its origin and direction. Immutable for the duration of a trace call.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    /// Origin.
    pub o: Point3f,

    /// Direction (unit length).
    pub d: Vector3f,
}

impl Ray {
    /// Create a new ray.
    ///
    /// * `o` - Origin.
    /// * `d` - Direction.
    pub fn new(o: Point3f, d: Vector3f) -> Self {
        Self { o, d }
    }

    /// Returns the point at a given distance along the ray.
    ///
    /// * `t` - The distance.
    pub fn at(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[o={}, d={}]", self.o, self.d)
    }
}
