//! Geometry and collision queries
//!
//! Pure functions over positions: distances, circle overlap, and the
//! conical containment test melee effects use. No state lives here.

use glam::Vec2;

use crate::{angle_of, normalize_angle};

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Circle-circle overlap (radius-sum test, touching counts)
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a.distance_squared(b) <= reach * reach
}

/// Signed angle from `from` to `to` in [-π, π)
pub fn signed_angle_between(from: Vec2, to: Vec2) -> f32 {
    normalize_angle(angle_of(to) - angle_of(from))
}

/// A cone anchored at `origin`, opening along `facing`
///
/// `half_width` is measured on each side of the facing direction. A cone
/// with `half_width >= π` is a full circle.
#[derive(Debug, Clone, Copy)]
pub struct Cone {
    pub origin: Vec2,
    pub facing: Vec2,
    pub half_width: f32,
    pub range: f32,
}

impl Cone {
    /// Build a cone from an authored full arc width in degrees
    pub fn from_arc_deg(origin: Vec2, facing: Vec2, arc_width_deg: Option<f32>, range: f32) -> Self {
        let half_width = match arc_width_deg {
            Some(deg) if deg.is_finite() && deg < 360.0 => (deg.max(0.0) * 0.5).to_radians(),
            _ => std::f32::consts::PI,
        };
        Self { origin, facing, half_width, range }
    }

    /// Check if an angle offset from facing is within the cone's arc
    pub fn contains_direction(&self, dir: Vec2) -> bool {
        if self.half_width >= std::f32::consts::PI {
            return true;
        }
        if self.facing.length_squared() < 1e-8 || dir.length_squared() < 1e-8 {
            // Degenerate: target sits on the origin or there is no facing
            return true;
        }
        signed_angle_between(self.facing, dir).abs() <= self.half_width
    }

    /// Check if a point is inside both the radial range and the arc
    pub fn contains_point(&self, point: Vec2) -> bool {
        if !point.is_finite() {
            return false;
        }
        let offset = point - self.origin;
        offset.length() <= self.range && self.contains_direction(offset)
    }
}

/// Rotate `velocity` toward `desired` by at most `max_turn` radians,
/// keeping its magnitude
pub fn steer_toward(velocity: Vec2, desired: Vec2, max_turn: f32) -> Vec2 {
    let speed = velocity.length();
    if speed < 1e-6 || desired.length_squared() < 1e-8 {
        return velocity;
    }
    let delta = signed_angle_between(velocity, desired);
    let turn = delta.clamp(-max_turn.abs(), max_turn.abs());
    let heading = angle_of(velocity) + turn;
    Vec2::new(heading.cos(), heading.sin()) * speed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 5.0));
        assert!(!circles_overlap(Vec2::ZERO, 10.0, Vec2::new(15.1, 0.0), 5.0));
    }

    #[test]
    fn test_signed_angle() {
        let a = signed_angle_between(Vec2::X, Vec2::Y);
        assert!((a - FRAC_PI_2).abs() < 1e-5);
        let b = signed_angle_between(Vec2::X, -Vec2::Y);
        assert!((b + FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_cone_contains_point() {
        // 90 degree cone facing +x, range 50
        let cone = Cone::from_arc_deg(Vec2::ZERO, Vec2::X, Some(90.0), 50.0);
        assert!(cone.contains_point(Vec2::new(30.0, 0.0)));
        assert!(cone.contains_point(Vec2::new(30.0, 29.0))); // ~44 degrees
        assert!(!cone.contains_point(Vec2::new(30.0, 31.0))); // ~46 degrees
        assert!(!cone.contains_point(Vec2::new(-30.0, 0.0))); // behind
        assert!(!cone.contains_point(Vec2::new(60.0, 0.0))); // out of range
    }

    #[test]
    fn test_cone_wraps_behind() {
        // Facing -x: the arc straddles the ±π seam
        let cone = Cone::from_arc_deg(Vec2::ZERO, -Vec2::X, Some(60.0), 100.0);
        assert!(cone.contains_point(Vec2::new(-50.0, 10.0)));
        assert!(cone.contains_point(Vec2::new(-50.0, -10.0)));
        assert!(!cone.contains_point(Vec2::new(50.0, 0.0)));
    }

    #[test]
    fn test_cone_without_arc_is_circle() {
        let cone = Cone::from_arc_deg(Vec2::ZERO, Vec2::X, None, 40.0);
        assert!(cone.contains_point(Vec2::new(-39.0, 0.0)));
        assert!(!cone.contains_point(Vec2::new(0.0, 41.0)));
    }

    #[test]
    fn test_steer_limits_turn() {
        let v = Vec2::new(10.0, 0.0);
        let steered = steer_toward(v, -Vec2::X, 0.5);
        assert!((steered.length() - 10.0).abs() < 1e-4);
        assert!((signed_angle_between(v, steered).abs() - 0.5).abs() < 1e-4);

        // Small turns land exactly
        let steered = steer_toward(v, Vec2::new(1.0, 0.1), PI);
        assert!((signed_angle_between(Vec2::new(1.0, 0.1), steered)).abs() < 1e-4);
    }
}
