//! # Joyride Gameplay
//!
//! Gameplay systems for the Joyride driving game.
//!
//! This crate simulates the pedestrian crowd around the player's car
//! and tracks the vehicle's posture:
//! - Sidewalk surface registry with random point sampling
//! - Spawn planning inside the player's forward cone
//! - Per-agent steering, head tracking and walk-cycle animation
//! - Lifecycle orchestration (spawn timer, despawn predicates)
//! - Event bus announcing spawns and despawns
//! - Player vehicle overturn monitoring
//!
//! Everything runs single-threaded inside [`CrowdManager::tick`],
//! reaching the host's physics and scene layers only through the
//! injected [`WorldServices`] boundary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod behavior;
pub mod config;
pub mod events;
pub mod lifecycle;
pub mod registry;
pub mod sidewalk;
pub mod spatial;
pub mod spawn;
pub mod vehicle;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::behavior::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::lifecycle::*;
    pub use crate::registry::*;
    pub use crate::sidewalk::*;
    pub use crate::spatial::*;
    pub use crate::spawn::*;
    pub use crate::vehicle::*;
    pub use crate::world::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use joyride_common::pose::Pose;

    #[test]
    fn test_crowd_runs_against_memory_world() {
        let sidewalks = SidewalkMap::with_surfaces(vec![SidewalkSurface::new(
            Vec3::new(0.0, 0.0, -40.0),
            Vec2::new(4.0, 30.0),
        )]);
        let mut manager = CrowdManager::new(sidewalks);
        let mut world = MemoryWorld::new();
        world.set_player_pose(Pose::at(Vec3::ZERO));

        for _ in 0..600 {
            manager.tick(1.0 / 60.0, &mut world);
            world.step(1.0 / 60.0);
        }

        assert!(!manager.is_empty());
        assert!(manager.len() <= manager.config().max_pedestrians);
        assert_eq!(world.body_count(), manager.len());
        assert!(manager.events().pending_count() > 0);
    }

    #[test]
    fn test_vehicle_monitor_default_upright() {
        let monitor = VehicleMonitor::new();
        assert_eq!(monitor.status(), VehicleStatus::Upright);
    }
}
