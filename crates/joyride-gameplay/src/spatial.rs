//! Horizontal spatial predicates shared by spawning and despawn logic.
//!
//! All queries here flatten to the XZ plane first. Vertical offsets
//! never change the outcome, so agents on bridges or in underpasses are
//! treated the same as agents at street level.

use glam::Vec3;
use joyride_common::pose::{horizontal, horizontal_distance_squared};

/// Offsets shorter than this are treated as coincident with the origin.
const DEGENERATE_LENGTH_SQUARED: f32 = 1e-8;

/// Returns `true` when `point` lies inside the horizontal cone of
/// half-angle `fov / 2.0` centered on `forward` at `origin`.
///
/// Degenerate inputs (a point on top of the origin, or a `forward`
/// with no horizontal component, such as straight up) count as inside:
/// a viewer with no meaningful facing cannot exclude anything.
#[must_use]
pub fn is_within_fov(origin: Vec3, forward: Vec3, point: Vec3, fov: f32) -> bool {
    let flat_forward = horizontal(forward);
    let offset = horizontal(point - origin);
    if flat_forward.length_squared() < DEGENERATE_LENGTH_SQUARED
        || offset.length_squared() < DEGENERATE_LENGTH_SQUARED
    {
        return true;
    }
    let angle = flat_forward.angle_between(offset);
    angle <= fov / 2.0
}

/// Returns `true` when `point` is within `radius` of `origin`,
/// measured horizontally.
#[must_use]
pub fn is_within_radius(origin: Vec3, point: Vec3, radius: f32) -> bool {
    horizontal_distance_squared(origin, point) <= radius * radius
}

/// A horizontal viewing cone: apex, axis and full angular width.
///
/// Bundles the arguments of [`is_within_fov`] so sampling APIs can take
/// the whole constraint as one optional value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCone {
    /// Cone apex
    pub origin: Vec3,
    /// Cone axis; only its horizontal component matters
    pub forward: Vec3,
    /// Full angular width in radians
    pub angle: f32,
}

impl ViewCone {
    /// Creates a cone at `origin` opening `angle` radians around
    /// `forward`.
    #[must_use]
    pub const fn new(origin: Vec3, forward: Vec3, angle: f32) -> Self {
        Self {
            origin,
            forward,
            angle,
        }
    }

    /// Returns `true` when `point` lies inside the cone.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        is_within_fov(self.origin, self.forward, point, self.angle)
    }
}
