//! Per-agent steering, head tracking and walk-cycle animation.
//!
//! Runs once per live agent per tick. Steering seeks the current walk
//! target and picks a new one on arrival; the head blends toward the
//! player when close; limb angles swing with the walk phase and are
//! always interpolated, never snapped.

use crate::config::BehaviorConfig;
use crate::registry::{MotionState, Pedestrian, PedestrianRegistry};
use crate::sidewalk::SidewalkMap;
use crate::spatial::ViewCone;
use crate::world::WorldServices;
use glam::{Quat, Vec3};
use joyride_common::pose::{horizontal, horizontal_delta, horizontal_distance, yaw_facing, Pose};
use std::f32::consts::TAU;
use tracing::{debug, warn};

/// Horizontal look offsets shorter than this leave the head target
/// untouched for the tick.
const HEAD_LOOK_EPSILON: f32 = 0.01;

/// Drives motion and animation for every live pedestrian.
#[derive(Debug, Clone)]
pub struct BehaviorSystem {
    config: BehaviorConfig,
}

impl BehaviorSystem {
    /// Creates a behavior system with the given tuning.
    #[must_use]
    pub const fn new(config: BehaviorConfig) -> Self {
        Self { config }
    }

    /// Tuning in effect.
    #[must_use]
    pub const fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Updates every live agent for this tick.
    pub fn update<W: WorldServices>(
        &self,
        rng: &mut fastrand::Rng,
        world: &mut W,
        sidewalks: &SidewalkMap,
        registry: &mut PedestrianRegistry,
        dt: f32,
    ) {
        for pedestrian in registry.iter_mut() {
            self.update_agent(rng, world, sidewalks, pedestrian, dt);
        }
    }

    /// Updates a single agent: steering, head tracking, walk-cycle
    /// animation, then rig application.
    ///
    /// An agent without a body is skipped whole (with a warning); an
    /// agent without a rig still steers and animates its state, only
    /// the rig application is dropped.
    pub fn update_agent<W: WorldServices>(
        &self,
        rng: &mut fastrand::Rng,
        world: &mut W,
        sidewalks: &SidewalkMap,
        pedestrian: &mut Pedestrian,
        dt: f32,
    ) {
        let Some(pose) = world.body_pose(pedestrian.id) else {
            warn!("Pedestrian {:?} has no body, skipping update", pedestrian.id);
            return;
        };
        let pose = self.steer(rng, world, sidewalks, pedestrian, pose);
        let player = world.player_pose();
        self.track_player(pedestrian, &pose, &player);
        self.animate_limbs(world, pedestrian, dt);
        if !world.apply_rig_pose(pedestrian.id, pedestrian.rig) {
            debug!("Pedestrian {:?} has no rig, pose not applied", pedestrian.id);
        }
    }

    /// Seek steering. Returns the agent's pose after any orientation
    /// update so later stages read current data.
    fn steer<W: WorldServices>(
        &self,
        rng: &mut fastrand::Rng,
        world: &mut W,
        sidewalks: &SidewalkMap,
        pedestrian: &mut Pedestrian,
        pose: Pose,
    ) -> Pose {
        // Arrival clears the target
        if let MotionState::Walking { target } = pedestrian.state {
            if horizontal_distance(pose.position, target) < self.config.arrival_tolerance {
                pedestrian.state = MotionState::Idle;
            }
        }

        // Idle agents ask the sidewalk map for a destination ahead of
        // their own facing
        if pedestrian.state == MotionState::Idle {
            let cone = ViewCone::new(pose.position, pose.forward(), self.config.target_search_fov);
            let found = sidewalks.sample_near(
                rng,
                pose.position,
                self.config.target_search_radius,
                Some(cone),
            );
            match found {
                Some(target) => pedestrian.state = MotionState::Walking { target },
                None => {
                    self.halt(world, pedestrian);
                    return pose;
                }
            }
        }

        let MotionState::Walking { target } = pedestrian.state else {
            return pose;
        };
        let offset = horizontal_delta(pose.position, target);
        if offset.length() <= self.config.steer_epsilon {
            return pose;
        }
        let direction = offset.normalize();
        let vertical = world.body_velocity(pedestrian.id).map_or(0.0, |v| v.y);
        world.set_body_velocity(
            pedestrian.id,
            direction * pedestrian.speed + Vec3::Y * vertical,
        );

        let desired = yaw_facing(direction);
        let orientation = pose.orientation.slerp(desired, self.config.turn_smoothing);
        let updated = Pose::new(pose.position, orientation);
        world.set_body_pose(pedestrian.id, updated);
        updated
    }

    /// Zeroes horizontal motion, leaving gravity's vertical component
    /// alone.
    fn halt<W: WorldServices>(&self, world: &mut W, pedestrian: &Pedestrian) {
        let vertical = world.body_velocity(pedestrian.id).map_or(0.0, |v| v.y);
        world.set_body_velocity(pedestrian.id, Vec3::new(0.0, vertical, 0.0));
    }

    /// Blends the head toward the player when close, back to straight
    /// ahead when not.
    fn track_player(&self, pedestrian: &mut Pedestrian, pose: &Pose, player: &Pose) {
        let head_position = pose.position + Vec3::Y * self.config.head_height;
        if head_position.distance(player.position) <= self.config.head_turn_radius {
            let look = horizontal(player.position - head_position);
            if look.length_squared() >= HEAD_LOOK_EPSILON * HEAD_LOOK_EPSILON {
                // Yaw in body-local space so the head turns relative
                // to wherever the body points
                let local = pose.orientation.inverse() * look;
                pedestrian.head_target = yaw_facing(local);
            }
            // Player straight above or below: keep drifting toward the
            // last target
        } else {
            pedestrian.head_target = Quat::IDENTITY;
        }
        pedestrian.rig.head = pedestrian
            .rig
            .head
            .slerp(pedestrian.head_target, self.config.head_smoothing);
    }

    /// Advances the walk phase from current speed and eases the four
    /// limb angles toward their swing targets.
    fn animate_limbs<W: WorldServices>(&self, world: &W, pedestrian: &mut Pedestrian, dt: f32) {
        let speed = world
            .body_velocity(pedestrian.id)
            .map_or(0.0, |v| horizontal(v).length());
        pedestrian.walk_phase =
            (pedestrian.walk_phase + speed * self.config.walk_phase_rate * dt).rem_euclid(TAU);

        let (leg, arm) = if speed > self.config.min_animation_speed {
            (
                pedestrian.walk_phase.sin() * self.config.walk_amplitude,
                pedestrian.walk_phase.sin() * self.config.arm_amplitude,
            )
        } else {
            (0.0, 0.0)
        };

        let rig = &mut pedestrian.rig;
        let factor = self.config.limb_smoothing;
        // Legs swing in opposite phase; arms counter their same-side leg
        rig.left_leg = approach(rig.left_leg, leg, factor);
        rig.right_leg = approach(rig.right_leg, -leg, factor);
        rig.left_arm = approach(rig.left_arm, -arm, factor);
        rig.right_arm = approach(rig.right_arm, arm, factor);
    }
}

/// Moves `current` a fixed fraction of the way to `target`.
fn approach(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}
