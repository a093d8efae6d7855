//! Boundary to the hosting world: physics bodies, visuals and the
//! player vehicle.
//!
//! The crowd simulation never reaches for scene or physics globals;
//! everything it needs is injected through [`WorldServices`].
//! [`MemoryWorld`] is a self-contained implementation for tests and
//! headless runs.

use crate::registry::{Appearance, RigPose};
use glam::Vec3;
use joyride_common::ids::AgentId;
use joyride_common::pose::Pose;
use std::collections::HashMap;

/// Services the crowd simulation requires from its host.
///
/// Getters return `None` for unknown agents; destroy methods report
/// whether anything was removed so callers can log stale handles.
pub trait WorldServices {
    /// Pose of the player vehicle.
    fn player_pose(&self) -> Pose;
    /// Creates a rigid-body representation for `agent` at `pose`.
    fn create_body(&mut self, agent: AgentId, pose: Pose);
    /// Destroys the rigid-body representation. Returns `true` when one
    /// existed.
    fn destroy_body(&mut self, agent: AgentId) -> bool;
    /// Creates a visual representation styled by `appearance`.
    fn create_visual(&mut self, agent: AgentId, appearance: Appearance);
    /// Destroys the visual representation. Returns `true` when one
    /// existed.
    fn destroy_visual(&mut self, agent: AgentId) -> bool;
    /// Current body pose of `agent`.
    fn body_pose(&self, agent: AgentId) -> Option<Pose>;
    /// Overwrites the body pose of `agent`. Unknown agents are ignored.
    fn set_body_pose(&mut self, agent: AgentId, pose: Pose);
    /// Current linear velocity of `agent`.
    fn body_velocity(&self, agent: AgentId) -> Option<Vec3>;
    /// Sets the linear velocity of `agent`. Unknown agents are ignored.
    fn set_body_velocity(&mut self, agent: AgentId, velocity: Vec3);
    /// Applies limb and head targets to the agent's visual rig.
    /// Returns `false` when the agent has no rig.
    fn apply_rig_pose(&mut self, agent: AgentId, rig: RigPose) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct BodyState {
    pose: Pose,
    velocity: Vec3,
}

/// Hash-map backed [`WorldServices`] implementation.
///
/// Bodies integrate position from velocity when [`MemoryWorld::step`]
/// is called, which stands in for the host physics update between
/// crowd ticks.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
    player: Pose,
    bodies: HashMap<AgentId, BodyState>,
    rigs: HashMap<AgentId, RigPose>,
    visuals: HashMap<AgentId, Appearance>,
}

impl MemoryWorld {
    /// Creates an empty world with the player at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the player vehicle.
    pub fn set_player_pose(&mut self, pose: Pose) {
        self.player = pose;
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live visuals.
    #[must_use]
    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    /// Last rig pose applied to `agent`.
    #[must_use]
    pub fn rig_pose(&self, agent: AgentId) -> Option<&RigPose> {
        self.rigs.get(&agent)
    }

    /// Appearance the visual for `agent` was created with.
    #[must_use]
    pub fn appearance(&self, agent: AgentId) -> Option<&Appearance> {
        self.visuals.get(&agent)
    }

    /// Integrates every body forward by `dt` at its current velocity.
    pub fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            body.pose.position += body.velocity * dt;
        }
    }
}

impl WorldServices for MemoryWorld {
    fn player_pose(&self) -> Pose {
        self.player
    }

    fn create_body(&mut self, agent: AgentId, pose: Pose) {
        self.bodies.insert(
            agent,
            BodyState {
                pose,
                velocity: Vec3::ZERO,
            },
        );
    }

    fn destroy_body(&mut self, agent: AgentId) -> bool {
        self.bodies.remove(&agent).is_some()
    }

    fn create_visual(&mut self, agent: AgentId, appearance: Appearance) {
        self.visuals.insert(agent, appearance);
        self.rigs.insert(agent, RigPose::default());
    }

    fn destroy_visual(&mut self, agent: AgentId) -> bool {
        self.rigs.remove(&agent);
        self.visuals.remove(&agent).is_some()
    }

    fn body_pose(&self, agent: AgentId) -> Option<Pose> {
        self.bodies.get(&agent).map(|body| body.pose)
    }

    fn set_body_pose(&mut self, agent: AgentId, pose: Pose) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.pose = pose;
        }
    }

    fn body_velocity(&self, agent: AgentId) -> Option<Vec3> {
        self.bodies.get(&agent).map(|body| body.velocity)
    }

    fn set_body_velocity(&mut self, agent: AgentId, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.velocity = velocity;
        }
    }

    fn apply_rig_pose(&mut self, agent: AgentId, rig: RigPose) -> bool {
        match self.rigs.get_mut(&agent) {
            Some(slot) => {
                *slot = rig;
                true
            }
            None => false,
        }
    }
}
