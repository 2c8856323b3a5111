//! Skirmish - a tunable real-time combat simulator
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, AI, skills, hazards, spawning)
//! - `catalog`: Authored definitions the simulation reads but never mutates
//! - `tuning`: Data-driven balance constants
//! - `error`: Typed rejections for commands and catalog loading

pub mod catalog;
pub mod error;
pub mod sim;
pub mod tuning;

pub use catalog::Catalog;
pub use error::{CatalogError, CommandError, UseRejection};
pub use tuning::{Difficulty, Tuning};

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest dt a single step will honour (seconds)
    pub const MAX_STEP_DT: f32 = 0.25;

    /// Skill slots per loadout (the basic attack has its own slot)
    pub const SKILL_SLOTS: usize = 4;
    /// Inventory slots on the controlled entity
    pub const ITEM_SLOTS: usize = 6;

    /// Default collision radius for entities
    pub const ENTITY_RADIUS: f32 = 16.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Angle of a direction vector (radians, 0 along +x)
#[inline]
pub fn angle_of(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
    }

    #[test]
    fn test_polar_round_trip_angle() {
        let p = polar_to_cartesian(10.0, PI / 3.0);
        assert!((angle_of(p) - PI / 3.0).abs() < 1e-5);
        assert!((p.length() - 10.0).abs() < 1e-4);
    }
}
