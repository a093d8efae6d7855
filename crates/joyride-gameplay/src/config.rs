//! Tuning configuration for the crowd simulation.
//!
//! Every threshold the lifecycle and behavior systems consult lives in
//! one of the two structs here, with documented defaults. Configs are
//! validated once at construction of the owning manager; the tick path
//! never re-checks them.

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use thiserror::Error;

/// Default population cap.
const DEFAULT_MAX_PEDESTRIANS: usize = 20;
/// Default seconds between spawn attempts.
const DEFAULT_SPAWN_INTERVAL: f32 = 3.0;
/// Default maximum spawn distance from the player.
const DEFAULT_SPAWN_RADIUS: f32 = 150.0;
/// Default minimum spawn distance from the player.
const DEFAULT_MIN_SPAWN_RADIUS: f32 = 20.0;
/// Default spawn field of view in radians (120 degrees).
const DEFAULT_SPAWN_FOV: f32 = PI * 2.0 / 3.0;
/// Default distance beyond which agents despawn immediately.
const DEFAULT_DESPAWN_DISTANCE: f32 = 150.0;
/// Default normalized-dot threshold below which an agent counts as
/// behind the player. Hand-tuned in the original game; a default, not
/// an invariant.
const DEFAULT_BEHIND_DOT_THRESHOLD: f32 = -0.1;
/// Default seconds an agent may stay behind the player before despawn.
const DEFAULT_BEHIND_DESPAWN_DELAY: f32 = 4.0;
/// Default walk speed range in units per second.
const DEFAULT_WALK_SPEED_MIN: f32 = 2.0;
const DEFAULT_WALK_SPEED_MAX: f32 = 5.0;
/// Default upper bound on a single simulation step in seconds.
const DEFAULT_MAX_TIME_STEP: f32 = 0.1;
/// Default RNG seed.
const DEFAULT_SEED: u64 = 12345;

/// Default arrival tolerance before a new walk target is requested.
const DEFAULT_ARRIVAL_TOLERANCE: f32 = 1.0;
/// Default radius for the sidewalk walk-target search.
const DEFAULT_TARGET_SEARCH_RADIUS: f32 = 50.0;
/// Default field of view for the walk-target search (180 degrees).
const DEFAULT_TARGET_SEARCH_FOV: f32 = PI;
/// Default minimum horizontal offset length worth steering along.
const DEFAULT_STEER_EPSILON: f32 = 0.1;
/// Default per-tick slerp factor for body orientation.
const DEFAULT_TURN_SMOOTHING: f32 = 0.1;
/// Default radius around the head within which the player is tracked.
const DEFAULT_HEAD_TURN_RADIUS: f32 = 25.0;
/// Default per-tick slerp factor for head orientation.
const DEFAULT_HEAD_SMOOTHING: f32 = 0.05;
/// Default head height above an agent's ground position.
const DEFAULT_HEAD_HEIGHT: f32 = 1.6;
/// Default walk-phase advance in radians per travelled unit.
const DEFAULT_WALK_PHASE_RATE: f32 = 2.0;
/// Default leg swing amplitude in radians.
const DEFAULT_WALK_AMPLITUDE: f32 = 0.6;
/// Default arm swing amplitude in radians.
const DEFAULT_ARM_AMPLITUDE: f32 = 0.3;
/// Default per-tick interpolation factor for limb angles.
const DEFAULT_LIMB_SMOOTHING: f32 = 0.15;
/// Default speed below which limbs return to rest.
const DEFAULT_MIN_ANIMATION_SPEED: f32 = 0.1;

/// Errors raised by config validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A field that must be strictly positive was zero or negative
    #[error("{field} must be positive (got {value})")]
    NotPositive {
        /// Offending field name
        field: &'static str,
        /// Value supplied
        value: f32,
    },
    /// A min/max pair was inverted
    #[error("{field} range is inverted ({min} > {max})")]
    InvertedRange {
        /// Offending field name
        field: &'static str,
        /// Lower bound supplied
        min: f32,
        /// Upper bound supplied
        max: f32,
    },
    /// Spawn radius reaches past the despawn distance
    #[error("spawn radius {spawn} exceeds despawn distance {despawn}")]
    SpawnBeyondDespawn {
        /// Spawn radius supplied
        spawn: f32,
        /// Despawn distance supplied
        despawn: f32,
    },
    /// A field-of-view angle was outside (0, 2π]
    #[error("{field} must be within (0, 2π] radians (got {value})")]
    FovOutOfRange {
        /// Offending field name
        field: &'static str,
        /// Value supplied
        value: f32,
    },
    /// An interpolation factor was outside (0, 1]
    #[error("{field} must be within (0, 1] (got {value})")]
    SmoothingOutOfRange {
        /// Offending field name
        field: &'static str,
        /// Value supplied
        value: f32,
    },
    /// The behind-player dot threshold was outside [-1, 1]
    #[error("behind dot threshold must be within [-1, 1] (got {value})")]
    ThresholdOutOfRange {
        /// Value supplied
        value: f32,
    },
}

/// Result type for config validation.
pub type ConfigResult = Result<(), ConfigError>;

fn require_positive(field: &'static str, value: f32) -> ConfigResult {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn require_fov(field: &'static str, value: f32) -> ConfigResult {
    if value > 0.0 && value <= TAU {
        Ok(())
    } else {
        Err(ConfigError::FovOutOfRange { field, value })
    }
}

fn require_smoothing(field: &'static str, value: f32) -> ConfigResult {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::SmoothingOutOfRange { field, value })
    }
}

/// Population and lifecycle tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdConfig {
    /// Maximum number of live pedestrians
    pub max_pedestrians: usize,
    /// Seconds between spawn attempts
    pub spawn_interval: f32,
    /// Maximum spawn distance from the player
    pub spawn_radius: f32,
    /// Minimum spawn distance from the player
    pub min_spawn_radius: f32,
    /// Field of view ahead of the player for spawn placement (radians)
    pub spawn_fov: f32,
    /// Distance from the player beyond which agents despawn immediately
    pub despawn_distance: f32,
    /// Normalized-dot threshold below which an agent counts as behind
    pub behind_dot_threshold: f32,
    /// Seconds an agent may stay behind the player before despawn
    pub behind_despawn_delay: f32,
    /// Minimum walk speed drawn at creation (units per second)
    pub walk_speed_min: f32,
    /// Maximum walk speed drawn at creation (units per second)
    pub walk_speed_max: f32,
    /// Upper bound on a single simulation step in seconds
    pub max_time_step: f32,
    /// Seed for all crowd randomness (spawn sampling, speeds, appearance)
    pub seed: u64,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            max_pedestrians: DEFAULT_MAX_PEDESTRIANS,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            spawn_radius: DEFAULT_SPAWN_RADIUS,
            min_spawn_radius: DEFAULT_MIN_SPAWN_RADIUS,
            spawn_fov: DEFAULT_SPAWN_FOV,
            despawn_distance: DEFAULT_DESPAWN_DISTANCE,
            behind_dot_threshold: DEFAULT_BEHIND_DOT_THRESHOLD,
            behind_despawn_delay: DEFAULT_BEHIND_DESPAWN_DELAY,
            walk_speed_min: DEFAULT_WALK_SPEED_MIN,
            walk_speed_max: DEFAULT_WALK_SPEED_MAX,
            max_time_step: DEFAULT_MAX_TIME_STEP,
            seed: DEFAULT_SEED,
        }
    }
}

impl CrowdConfig {
    /// Creates a default config with the given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Sets the population cap.
    #[must_use]
    pub const fn with_max_pedestrians(mut self, cap: usize) -> Self {
        self.max_pedestrians = cap;
        self
    }

    /// Sets the spawn interval in seconds.
    #[must_use]
    pub const fn with_spawn_interval(mut self, interval: f32) -> Self {
        self.spawn_interval = interval;
        self
    }

    /// Sets the spawn radius bounds.
    #[must_use]
    pub const fn with_spawn_radii(mut self, min: f32, max: f32) -> Self {
        self.min_spawn_radius = min;
        self.spawn_radius = max;
        self
    }

    /// Validates every field, returning the first violation found.
    pub fn validate(&self) -> ConfigResult {
        require_positive("spawn_interval", self.spawn_interval)?;
        require_positive("min_spawn_radius", self.min_spawn_radius)?;
        require_positive("spawn_radius", self.spawn_radius)?;
        if self.min_spawn_radius > self.spawn_radius {
            return Err(ConfigError::InvertedRange {
                field: "spawn_radius",
                min: self.min_spawn_radius,
                max: self.spawn_radius,
            });
        }
        require_fov("spawn_fov", self.spawn_fov)?;
        require_positive("despawn_distance", self.despawn_distance)?;
        if self.spawn_radius > self.despawn_distance {
            return Err(ConfigError::SpawnBeyondDespawn {
                spawn: self.spawn_radius,
                despawn: self.despawn_distance,
            });
        }
        if !(-1.0..=1.0).contains(&self.behind_dot_threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                value: self.behind_dot_threshold,
            });
        }
        require_positive("behind_despawn_delay", self.behind_despawn_delay)?;
        require_positive("walk_speed_min", self.walk_speed_min)?;
        require_positive("walk_speed_max", self.walk_speed_max)?;
        if self.walk_speed_min > self.walk_speed_max {
            return Err(ConfigError::InvertedRange {
                field: "walk_speed",
                min: self.walk_speed_min,
                max: self.walk_speed_max,
            });
        }
        require_positive("max_time_step", self.max_time_step)?;
        Ok(())
    }
}

/// Per-tick steering, head-tracking and animation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Horizontal distance at which a walk target counts as reached
    pub arrival_tolerance: f32,
    /// Radius of the sidewalk search for new walk targets
    pub target_search_radius: f32,
    /// Field of view of the walk-target search, centered on the agent's
    /// own forward vector (radians)
    pub target_search_fov: f32,
    /// Minimum horizontal offset length worth steering along
    pub steer_epsilon: f32,
    /// Per-tick slerp factor rotating the body toward its heading
    pub turn_smoothing: f32,
    /// Radius around the head within which the player is tracked
    pub head_turn_radius: f32,
    /// Per-tick slerp factor for the head orientation
    pub head_smoothing: f32,
    /// Head height above the agent's ground position
    pub head_height: f32,
    /// Walk-phase advance in radians per travelled unit
    pub walk_phase_rate: f32,
    /// Leg swing amplitude in radians
    pub walk_amplitude: f32,
    /// Arm swing amplitude in radians
    pub arm_amplitude: f32,
    /// Per-tick interpolation factor for limb angles
    pub limb_smoothing: f32,
    /// Speed below which limb targets return to rest
    pub min_animation_speed: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            arrival_tolerance: DEFAULT_ARRIVAL_TOLERANCE,
            target_search_radius: DEFAULT_TARGET_SEARCH_RADIUS,
            target_search_fov: DEFAULT_TARGET_SEARCH_FOV,
            steer_epsilon: DEFAULT_STEER_EPSILON,
            turn_smoothing: DEFAULT_TURN_SMOOTHING,
            head_turn_radius: DEFAULT_HEAD_TURN_RADIUS,
            head_smoothing: DEFAULT_HEAD_SMOOTHING,
            head_height: DEFAULT_HEAD_HEIGHT,
            walk_phase_rate: DEFAULT_WALK_PHASE_RATE,
            walk_amplitude: DEFAULT_WALK_AMPLITUDE,
            arm_amplitude: DEFAULT_ARM_AMPLITUDE,
            limb_smoothing: DEFAULT_LIMB_SMOOTHING,
            min_animation_speed: DEFAULT_MIN_ANIMATION_SPEED,
        }
    }
}

impl BehaviorConfig {
    /// Sets the head tracking radius.
    #[must_use]
    pub const fn with_head_turn_radius(mut self, radius: f32) -> Self {
        self.head_turn_radius = radius;
        self
    }

    /// Sets the leg and arm swing amplitudes.
    #[must_use]
    pub const fn with_amplitudes(mut self, legs: f32, arms: f32) -> Self {
        self.walk_amplitude = legs;
        self.arm_amplitude = arms;
        self
    }

    /// Validates every field, returning the first violation found.
    pub fn validate(&self) -> ConfigResult {
        require_positive("arrival_tolerance", self.arrival_tolerance)?;
        require_positive("target_search_radius", self.target_search_radius)?;
        require_fov("target_search_fov", self.target_search_fov)?;
        require_positive("steer_epsilon", self.steer_epsilon)?;
        require_smoothing("turn_smoothing", self.turn_smoothing)?;
        require_positive("head_turn_radius", self.head_turn_radius)?;
        require_smoothing("head_smoothing", self.head_smoothing)?;
        require_positive("head_height", self.head_height)?;
        require_positive("walk_phase_rate", self.walk_phase_rate)?;
        require_positive("walk_amplitude", self.walk_amplitude)?;
        require_positive("arm_amplitude", self.arm_amplitude)?;
        require_smoothing("limb_smoothing", self.limb_smoothing)?;
        if self.min_animation_speed < 0.0 {
            return Err(ConfigError::NotPositive {
                field: "min_animation_speed",
                value: self.min_animation_speed,
            });
        }
        Ok(())
    }
}
