//! Live pedestrian collection and per-agent state.
//!
//! Position and orientation are owned by the host physics and scene
//! layers; agents here carry only the simulation-side fields plus the
//! [`AgentId`] that ties the three representations together.

use crate::config::CrowdConfig;
use crate::world::WorldServices;
use glam::{Quat, Vec3};
use joyride_common::ids::AgentId;
use joyride_common::pose::Pose;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Entries in the skin-tone palette.
pub const SKIN_TONE_COUNT: u8 = 6;
/// Entries in the shirt palette.
pub const SHIRT_COLOR_COUNT: u8 = 8;
/// Entries in the trouser palette.
pub const TROUSER_COLOR_COUNT: u8 = 5;
/// Smallest height scale in percent of the base model.
pub const MIN_HEIGHT_PERCENT: u8 = 90;
/// Largest height scale in percent of the base model.
pub const MAX_HEIGHT_PERCENT: u8 = 110;

/// What an agent's legs are currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionState {
    /// Standing still, waiting for a destination
    Idle,
    /// Walking toward a destination
    Walking {
        /// Destination in world space
        target: Vec3,
    },
}

impl MotionState {
    /// Current destination, if any.
    #[must_use]
    pub const fn target(&self) -> Option<Vec3> {
        match self {
            Self::Idle => None,
            Self::Walking { target } => Some(*target),
        }
    }

    /// Returns `true` while a destination is set.
    #[must_use]
    pub const fn is_walking(&self) -> bool {
        matches!(self, Self::Walking { .. })
    }
}

/// Limb swing angles and head orientation applied to an agent's rig.
///
/// Angles are radians around each limb's swing pivot; zero is the rest
/// pose. The head orientation is relative to the body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigPose {
    /// Left leg swing angle
    pub left_leg: f32,
    /// Right leg swing angle
    pub right_leg: f32,
    /// Left arm swing angle
    pub left_arm: f32,
    /// Right arm swing angle
    pub right_arm: f32,
    /// Head orientation in body-local space
    pub head: Quat,
}

impl Default for RigPose {
    fn default() -> Self {
        Self {
            left_leg: 0.0,
            right_leg: 0.0,
            left_arm: 0.0,
            right_arm: 0.0,
            head: Quat::IDENTITY,
        }
    }
}

/// Cosmetic look rolled once at spawn. No gameplay effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    /// Index into the skin-tone palette
    pub skin_tone: u8,
    /// Index into the shirt palette
    pub shirt_color: u8,
    /// Index into the trouser palette
    pub trouser_color: u8,
    /// Height scale in percent of the base model
    pub height_percent: u8,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            skin_tone: 0,
            shirt_color: 0,
            trouser_color: 0,
            height_percent: 100,
        }
    }
}

impl Appearance {
    /// Draws a random appearance from the palettes.
    #[must_use]
    pub fn roll(rng: &mut fastrand::Rng) -> Self {
        Self {
            skin_tone: rng.u8(..SKIN_TONE_COUNT),
            shirt_color: rng.u8(..SHIRT_COLOR_COUNT),
            trouser_color: rng.u8(..TROUSER_COLOR_COUNT),
            height_percent: rng.u8(MIN_HEIGHT_PERCENT..=MAX_HEIGHT_PERCENT),
        }
    }
}

/// A live crowd agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pedestrian {
    /// Stable identifier shared with the host body and visual
    pub id: AgentId,
    /// Walk speed in units per second, rolled at spawn
    pub speed: f32,
    /// Current motion state
    pub state: MotionState,
    /// Walk-cycle phase in radians, wrapped to [0, 2π)
    pub walk_phase: f32,
    /// Seconds continuously spent behind the player
    pub time_behind: f32,
    /// Orientation the head is drifting toward, in body-local space
    pub head_target: Quat,
    /// Current limb and head targets
    pub rig: RigPose,
    /// Cosmetic look
    pub appearance: Appearance,
}

/// Capacity-bounded collection of live pedestrians.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedestrianRegistry {
    pedestrians: Vec<Pedestrian>,
    capacity: usize,
    speed_min: f32,
    speed_max: f32,
}

impl PedestrianRegistry {
    /// Creates an empty registry sized and tuned from `config`.
    #[must_use]
    pub fn new(config: &CrowdConfig) -> Self {
        Self {
            pedestrians: Vec::with_capacity(config.max_pedestrians),
            capacity: config.max_pedestrians,
            speed_min: config.walk_speed_min,
            speed_max: config.walk_speed_max,
        }
    }

    /// Number of live agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pedestrians.len()
    }

    /// Returns `true` when no agents are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pedestrians.is_empty()
    }

    /// Population cap.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` while the population is below the cap.
    #[must_use]
    pub fn has_room(&self) -> bool {
        self.pedestrians.len() < self.capacity
    }

    /// Agent at `index`, if in bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Pedestrian> {
        self.pedestrians.get(index)
    }

    /// Mutable agent at `index`, if in bounds.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Pedestrian> {
        self.pedestrians.get_mut(index)
    }

    /// Iterates over live agents.
    pub fn iter(&self) -> impl Iterator<Item = &Pedestrian> {
        self.pedestrians.iter()
    }

    /// Iterates mutably over live agents.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pedestrian> {
        self.pedestrians.iter_mut()
    }

    /// Spawns a pedestrian at `position`, creating its body and visual
    /// through `world`.
    ///
    /// Speed and appearance are rolled from `rng`. Returns the new
    /// agent's id, or `None` (with a warning) when the cap is already
    /// reached.
    pub fn spawn<W: WorldServices>(
        &mut self,
        rng: &mut fastrand::Rng,
        world: &mut W,
        position: Vec3,
    ) -> Option<AgentId> {
        if !self.has_room() {
            warn!("Pedestrian cap {} reached, skipping spawn", self.capacity);
            return None;
        }
        let id = AgentId::new();
        let speed = self.speed_min + rng.f32() * (self.speed_max - self.speed_min);
        let appearance = Appearance::roll(rng);
        world.create_body(id, Pose::at(position));
        world.create_visual(id, appearance);
        self.pedestrians.push(Pedestrian {
            id,
            speed,
            state: MotionState::Idle,
            walk_phase: 0.0,
            time_behind: 0.0,
            head_target: Quat::IDENTITY,
            rig: RigPose::default(),
            appearance,
        });
        debug!("Spawned pedestrian {:?} at {:?}", id, position);
        Some(id)
    }

    /// Despawns the agent at `index`, destroying its body and visual
    /// through `world`.
    ///
    /// Returns the removed agent's id. An out-of-bounds index is a
    /// warned no-op.
    pub fn despawn<W: WorldServices>(&mut self, world: &mut W, index: usize) -> Option<AgentId> {
        if index >= self.pedestrians.len() {
            warn!(
                "Despawn index {} out of bounds (len {})",
                index,
                self.pedestrians.len()
            );
            return None;
        }
        let pedestrian = self.pedestrians.remove(index);
        if !world.destroy_body(pedestrian.id) {
            warn!("Pedestrian {:?} had no body to destroy", pedestrian.id);
        }
        if !world.destroy_visual(pedestrian.id) {
            warn!("Pedestrian {:?} had no visual to destroy", pedestrian.id);
        }
        debug!("Despawned pedestrian {:?}", pedestrian.id);
        Some(pedestrian.id)
    }
}
