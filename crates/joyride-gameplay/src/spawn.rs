//! Spawn position planning ahead of the player.
//!
//! Placement prefers sidewalk geometry but never depends on it: a
//! graduated fallback chain ends in a synthesized position, so a spawn
//! point always exists.

use crate::config::CrowdConfig;
use crate::sidewalk::SidewalkMap;
use crate::spatial::{is_within_fov, ViewCone};
use glam::{Quat, Vec3};
use joyride_common::pose::{horizontal, horizontal_distance, Pose};
use tracing::{debug, warn};

/// Synthesis attempts before the absolute fallback position.
const SYNTHESIS_ATTEMPTS: usize = 10;

/// Chooses spawn positions within the player's forward cone.
#[derive(Debug, Clone)]
pub struct SpawnPlanner {
    min_radius: f32,
    max_radius: f32,
    fov: f32,
}

impl SpawnPlanner {
    /// Creates a planner tuned from `config`.
    #[must_use]
    pub const fn new(config: &CrowdConfig) -> Self {
        Self {
            min_radius: config.min_spawn_radius,
            max_radius: config.spawn_radius,
            fov: config.spawn_fov,
        }
    }

    /// Plans a spawn position for the current player pose.
    ///
    /// Stages, each tried only when the previous yields nothing
    /// usable: a sidewalk point inside the spawn annulus and forward
    /// cone; a synthesized point sampled directly in that region; a
    /// fixed point behind the player at the minimum radius.
    pub fn plan(&self, rng: &mut fastrand::Rng, player: &Pose, sidewalks: &SidewalkMap) -> Vec3 {
        let cone = ViewCone::new(player.position, player.forward(), self.fov);
        match sidewalks.sample_near(rng, player.position, self.max_radius, Some(cone)) {
            Some(candidate) if self.is_valid(player, candidate) => return candidate,
            Some(candidate) => {
                debug!("Rejected sidewalk spawn candidate {:?}", candidate);
            }
            None => {
                warn!("No sidewalk data, synthesizing spawn position");
            }
        }

        for _ in 0..SYNTHESIS_ATTEMPTS {
            let candidate = self.synthesize(rng, player);
            if self.is_valid(player, candidate) {
                return candidate;
            }
        }

        // Unreachable with validated config; still yields a position
        player.position - forward_basis(player) * self.min_radius
    }

    /// Returns `true` when `point` sits inside the spawn annulus and
    /// the player's forward cone.
    #[must_use]
    pub fn is_valid(&self, player: &Pose, point: Vec3) -> bool {
        let distance = horizontal_distance(player.position, point);
        distance >= self.min_radius
            && distance <= self.max_radius
            && is_within_fov(player.position, player.forward(), point, self.fov)
    }

    fn synthesize(&self, rng: &mut fastrand::Rng, player: &Pose) -> Vec3 {
        let yaw_offset = (rng.f32() - 0.5) * self.fov;
        let distance = self.min_radius + rng.f32() * (self.max_radius - self.min_radius);
        let direction = Quat::from_rotation_y(yaw_offset) * forward_basis(player);
        player.position + direction * distance
    }
}

/// Horizontal unit forward for `player`, with a fixed stand-in when
/// the player looks straight up or down.
fn forward_basis(player: &Pose) -> Vec3 {
    horizontal(player.forward())
        .try_normalize()
        .unwrap_or(Vec3::NEG_Z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sidewalk::SidewalkSurface;
    use glam::Vec2;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    fn planner() -> SpawnPlanner {
        SpawnPlanner::new(&CrowdConfig::default())
    }

    #[test]
    fn test_sidewalk_point_preferred_when_valid() {
        // A strip 60 units ahead, well inside the annulus and cone
        let surface = SidewalkSurface::new(Vec3::new(0.0, 0.0, -60.0), Vec2::new(3.0, 20.0));
        let map = SidewalkMap::with_surfaces(vec![surface]);
        let player = Pose::at(Vec3::ZERO);
        let mut rng = fastrand::Rng::with_seed(11);

        let point = planner().plan(&mut rng, &player, &map);
        assert!(surface.contains(point));
        assert!(planner().is_valid(&player, point));
    }

    #[test]
    fn test_synthesis_without_sidewalks() {
        let map = SidewalkMap::new();
        let player = Pose::at(Vec3::new(10.0, 2.0, 30.0));
        let mut rng = fastrand::Rng::with_seed(12);

        let point = planner().plan(&mut rng, &player, &map);
        assert!(planner().is_valid(&player, point));
        // Synthesized points sit at the player's height
        assert!((point.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_too_close_sidewalk_rejected() {
        // The only sidewalk is under the player, inside the minimum
        // radius, so planning must fall through to synthesis
        let surface = SidewalkSurface::new(Vec3::ZERO, Vec2::new(1.0, 1.0));
        let map = SidewalkMap::with_surfaces(vec![surface]);
        let player = Pose::at(Vec3::ZERO);
        let mut rng = fastrand::Rng::with_seed(13);

        let point = planner().plan(&mut rng, &player, &map);
        let distance = horizontal_distance(player.position, point);
        assert!(distance >= CrowdConfig::default().min_spawn_radius);
        assert!(!surface.contains(point));
    }

    #[test]
    fn test_plan_handles_degenerate_forward() {
        // Pitch the player straight up so the forward vector has no
        // horizontal component
        let player = Pose::new(Vec3::ZERO, Quat::from_rotation_x(PI / 2.0));
        assert!(horizontal(player.forward()).length() < 1e-6);
        let map = SidewalkMap::new();
        let mut rng = fastrand::Rng::with_seed(14);

        let point = planner().plan(&mut rng, &player, &map);
        let distance = horizontal_distance(player.position, point);
        assert!(distance >= CrowdConfig::default().min_spawn_radius);
        assert!(distance <= CrowdConfig::default().spawn_radius);
    }

    proptest! {
        #[test]
        fn test_synthesized_spawns_stay_in_bounds(
            seed in any::<u64>(),
            yaw in 0.0f32..(2.0 * PI),
            x in -200.0f32..200.0,
            z in -200.0f32..200.0,
        ) {
            let planner = planner();
            let player = Pose::new(
                Vec3::new(x, 0.0, z),
                Quat::from_rotation_y(yaw),
            );
            let map = SidewalkMap::new();
            let mut rng = fastrand::Rng::with_seed(seed);

            let point = planner.plan(&mut rng, &player, &map);
            let distance = horizontal_distance(player.position, point);
            prop_assert!(distance >= planner.min_radius - 1e-3);
            prop_assert!(distance <= planner.max_radius + 1e-3);
            prop_assert!(is_within_fov(
                player.position,
                player.forward(),
                point,
                planner.fov + 1e-3,
            ));
        }
    }
}
