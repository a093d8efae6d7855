//! Sidewalk surface registry and random point sampling.
//!
//! The world layer registers walkable rectangles here; spawning and
//! target selection draw random points from them. An empty map is a
//! supported state: sampling returns `None` and callers synthesize
//! positions instead.

use crate::spatial::{is_within_radius, ViewCone};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Rejection-sampling attempts before the radius/cone constraints are
/// dropped.
const SAMPLE_ATTEMPTS: usize = 25;

/// An axis-aligned rectangular walkable surface in the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidewalkSurface {
    /// Center of the rectangle; `center.y` is the walking height
    pub center: Vec3,
    /// Half extents along X and Z
    pub half_extents: Vec2,
}

impl SidewalkSurface {
    /// Creates a surface centered at `center` extending `half_extents`
    /// along X and Z.
    #[must_use]
    pub const fn new(center: Vec3, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Uniformly samples a point on the surface.
    #[must_use]
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Vec3 {
        let x = self.center.x + (rng.f32() * 2.0 - 1.0) * self.half_extents.x;
        let z = self.center.z + (rng.f32() * 2.0 - 1.0) * self.half_extents.y;
        Vec3::new(x, self.center.y, z)
    }

    /// Returns `true` when `point` lies over the rectangle, ignoring
    /// height.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        (point.x - self.center.x).abs() <= self.half_extents.x
            && (point.z - self.center.z).abs() <= self.half_extents.y
    }
}

/// The set of walkable surfaces known to the crowd simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SidewalkMap {
    surfaces: Vec<SidewalkSurface>,
}

impl SidewalkMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            surfaces: Vec::new(),
        }
    }

    /// Creates a map from an existing surface list.
    #[must_use]
    pub fn with_surfaces(surfaces: Vec<SidewalkSurface>) -> Self {
        Self { surfaces }
    }

    /// Registers a surface.
    pub fn add(&mut self, surface: SidewalkSurface) {
        self.surfaces.push(surface);
    }

    /// Registered surfaces, in registration order.
    #[must_use]
    pub fn surfaces(&self) -> &[SidewalkSurface] {
        &self.surfaces
    }

    /// Number of registered surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns `true` when no surfaces are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Samples a uniformly random point on a uniformly random surface,
    /// or `None` when the map is empty.
    #[must_use]
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Option<Vec3> {
        if self.surfaces.is_empty() {
            None
        } else {
            Some(self.sample_any(rng))
        }
    }

    /// Samples a sidewalk point near `origin`.
    ///
    /// Draws up to 25 candidates and returns the first within `radius`
    /// of `origin` (horizontally) that also lies inside `cone` when one
    /// is given. If every candidate misses, an unconstrained sample is
    /// returned instead; callers needing the constraints must
    /// re-validate. `None` only for an empty map.
    #[must_use]
    pub fn sample_near(
        &self,
        rng: &mut fastrand::Rng,
        origin: Vec3,
        radius: f32,
        cone: Option<ViewCone>,
    ) -> Option<Vec3> {
        if self.surfaces.is_empty() {
            return None;
        }
        for _ in 0..SAMPLE_ATTEMPTS {
            let candidate = self.sample_any(rng);
            if !is_within_radius(origin, candidate, radius) {
                continue;
            }
            if let Some(cone) = cone {
                if !cone.contains(candidate) {
                    continue;
                }
            }
            return Some(candidate);
        }
        // Relaxed fallback: no radius or cone guarantee
        Some(self.sample_any(rng))
    }

    fn sample_any(&self, rng: &mut fastrand::Rng) -> Vec3 {
        let index = rng.usize(..self.surfaces.len());
        self.surfaces[index].sample(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn strip(center: Vec3) -> SidewalkSurface {
        SidewalkSurface::new(center, Vec2::new(2.0, 10.0))
    }

    #[test]
    fn test_surface_sample_stays_on_surface() {
        let surface = strip(Vec3::new(5.0, 0.2, -30.0));
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..100 {
            let point = surface.sample(&mut rng);
            assert!(surface.contains(point));
            assert!((point.y - 0.2).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_empty_map_samples_none() {
        let map = SidewalkMap::new();
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(map.sample(&mut rng).is_none());
        assert!(map
            .sample_near(&mut rng, Vec3::ZERO, 100.0, None)
            .is_none());
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_sample_near_honors_radius() {
        // One strip inside the radius, one far outside
        let map = SidewalkMap::with_surfaces(vec![
            strip(Vec3::new(0.0, 0.0, -10.0)),
            strip(Vec3::new(500.0, 0.0, 500.0)),
        ]);
        let mut rng = fastrand::Rng::with_seed(42);
        for _ in 0..20 {
            let point = map
                .sample_near(&mut rng, Vec3::ZERO, 30.0, None)
                .expect("map is not empty");
            assert!(is_within_radius(Vec3::ZERO, point, 30.0));
        }
    }

    #[test]
    fn test_sample_near_honors_cone() {
        let map = SidewalkMap::with_surfaces(vec![
            strip(Vec3::new(0.0, 0.0, -10.0)),
            strip(Vec3::new(0.0, 0.0, 10.0)),
        ]);
        let cone = ViewCone::new(Vec3::ZERO, Vec3::NEG_Z, PI / 2.0);
        let mut rng = fastrand::Rng::with_seed(9);
        for _ in 0..20 {
            let point = map
                .sample_near(&mut rng, Vec3::ZERO, 50.0, Some(cone))
                .expect("map is not empty");
            assert!(cone.contains(point));
        }
    }

    #[test]
    fn test_sample_near_relaxes_when_unsatisfiable() {
        // Every surface is outside the radius, so the relaxed fallback
        // must still produce a sidewalk point
        let far = strip(Vec3::new(500.0, 0.0, 500.0));
        let map = SidewalkMap::with_surfaces(vec![far]);
        let mut rng = fastrand::Rng::with_seed(3);
        let point = map
            .sample_near(&mut rng, Vec3::ZERO, 10.0, None)
            .expect("map is not empty");
        assert!(far.contains(point));
        assert!(!is_within_radius(Vec3::ZERO, point, 10.0));
    }
}
