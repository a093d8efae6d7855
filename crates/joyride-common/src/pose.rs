//! World-space pose and horizontal geometry helpers.
//!
//! Everything in the simulation reasons about headings on the ground
//! plane (Y up). The renderer and physics collaborators keep their own
//! vector types; this module is the single representation the core
//! itself uses, converted only at the collaborator boundary.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of an entity in world space.
///
/// Local forward is −Z, matching the renderer's object convention, so
/// [`Pose::forward`] for an identity orientation points down negative Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// World-space position
    pub position: Vec3,
    /// World-space orientation
    pub orientation: Quat,
}

impl Pose {
    /// Creates a pose from position and orientation.
    #[must_use]
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Creates a pose at a position with identity orientation.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Creates a pose at `position` facing along the horizontal
    /// direction `dir`. A near-zero `dir` yields identity orientation.
    #[must_use]
    pub fn facing(position: Vec3, dir: Vec3) -> Self {
        Self::new(position, yaw_facing(dir))
    }

    /// Returns the world-space forward vector (local −Z).
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// Returns the world-space up vector (local +Y).
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Projects a vector onto the ground plane (zeroes the Y component).
#[must_use]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Horizontal (ground-plane) offset from `from` to `to`.
#[must_use]
pub fn horizontal_delta(from: Vec3, to: Vec3) -> Vec3 {
    horizontal(to - from)
}

/// Horizontal distance between two points.
#[must_use]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal_delta(a, b).length()
}

/// Squared horizontal distance between two points.
#[must_use]
pub fn horizontal_distance_squared(a: Vec3, b: Vec3) -> f32 {
    horizontal_delta(a, b).length_squared()
}

/// Yaw-only orientation whose forward axis (−Z) points along the
/// horizontal projection of `dir`.
///
/// Returns identity when the horizontal projection is near zero, so a
/// direction straight up or down never produces a garbage heading.
#[must_use]
pub fn yaw_facing(dir: Vec3) -> Quat {
    let flat = horizontal(dir);
    if flat.length_squared() < f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y((-flat.x).atan2(-flat.z))
}
