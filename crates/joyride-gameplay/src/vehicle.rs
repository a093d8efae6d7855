//! Player vehicle posture tracking.
//!
//! Watches the vehicle's up vector and keeps an explicit posture state
//! so outer layers can offer a reset once the car has been on its roof
//! for a while.

use glam::Vec3;
use joyride_common::pose::Pose;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Up-vector alignment with world up below which the vehicle counts
/// as overturned.
const DEFAULT_OVERTURN_DOT: f32 = 0.1;
/// Seconds overturned before recovery should be offered.
const DEFAULT_RECOVERY_DELAY: f32 = 3.0;

/// Player vehicle posture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VehicleStatus {
    /// Wheels down
    Upright,
    /// Rolled onto its side or roof
    Overturned {
        /// Seconds spent overturned so far
        elapsed: f32,
    },
}

/// Tracks the player vehicle's posture across ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleMonitor {
    status: VehicleStatus,
    overturn_dot: f32,
    recovery_delay: f32,
}

impl Default for VehicleMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleMonitor {
    /// Creates a monitor with default thresholds, assuming an upright
    /// start.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: VehicleStatus::Upright,
            overturn_dot: DEFAULT_OVERTURN_DOT,
            recovery_delay: DEFAULT_RECOVERY_DELAY,
        }
    }

    /// Overrides the overturn threshold and recovery delay.
    #[must_use]
    pub const fn with_thresholds(mut self, overturn_dot: f32, recovery_delay: f32) -> Self {
        self.overturn_dot = overturn_dot;
        self.recovery_delay = recovery_delay;
        self
    }

    /// Feeds this tick's vehicle pose. Returns `true` when the posture
    /// flipped.
    pub fn update(&mut self, pose: &Pose, dt: f32) -> bool {
        let upright = pose.up().dot(Vec3::Y) >= self.overturn_dot;
        match self.status {
            VehicleStatus::Upright if !upright => {
                debug!("Vehicle overturned");
                self.status = VehicleStatus::Overturned { elapsed: 0.0 };
                true
            }
            VehicleStatus::Overturned { .. } if upright => {
                debug!("Vehicle back upright");
                self.status = VehicleStatus::Upright;
                true
            }
            VehicleStatus::Overturned { elapsed } => {
                self.status = VehicleStatus::Overturned {
                    elapsed: elapsed + dt,
                };
                false
            }
            VehicleStatus::Upright => false,
        }
    }

    /// Current posture.
    #[must_use]
    pub const fn status(&self) -> VehicleStatus {
        self.status
    }

    /// Returns `true` while the vehicle is on its side or roof.
    #[must_use]
    pub const fn is_overturned(&self) -> bool {
        matches!(self.status, VehicleStatus::Overturned { .. })
    }

    /// Returns `true` once the vehicle has been overturned past the
    /// recovery delay.
    #[must_use]
    pub fn needs_recovery(&self) -> bool {
        matches!(self.status, VehicleStatus::Overturned { elapsed } if elapsed >= self.recovery_delay)
    }
}
