//! # Joyride Common
//!
//! Common types and shared abstractions for Joyride.
//!
//! This crate provides the foundational types used across the Joyride
//! subsystems:
//! - ID types (`AgentId`)
//! - Pose and ground-plane geometry helpers
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ids;
pub mod pose;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::pose::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_prelude_exports() {
        let id = AgentId::new();
        let pose = Pose::facing(Vec3::ZERO, Vec3::X);
        assert!(id.is_valid());
        assert!(pose.forward().abs_diff_eq(Vec3::X, 1e-4));
    }
}
