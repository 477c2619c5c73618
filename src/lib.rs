//! Orbitwalk - simulation core for exploring many small planets
//!
//! Core modules:
//! - `sim`: Per-frame simulation (zones, gravity, collisions, motion, orientation)
//! - `tuning`: Data-driven physics balance

pub mod sim;
pub mod tuning;

pub use tuning::Tuning;

use glam::Vec3;

/// Simulation constants that are not meant to be tuned
pub mod consts {
    /// Nominal frame time the host loop aims for (60 Hz)
    pub const NOMINAL_DT: f32 = 1.0 / 60.0;
    /// Starting and maximum jetpack fuel
    pub const MAX_FUEL: f32 = 100.0;
    /// Starting and maximum sprint stamina
    pub const MAX_STAMINA: f32 = 100.0;
    /// Pitch limit for free look (radians, ~89 degrees)
    pub const MAX_PITCH: f32 = 1.553;
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

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Remove the component of `v` along the unit vector `normal`
#[inline]
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * v.dot(normal)
}

/// Angle (radians) between two unit quaternions, ignoring double cover
#[inline]
pub fn quat_angle(a: glam::Quat, b: glam::Quat) -> f32 {
    let d = a.dot(b).abs().min(1.0);
    2.0 * d.acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_project_on_plane() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let p = project_on_plane(v, Vec3::Y);
        assert_eq!(p, Vec3::new(1.0, 0.0, 3.0));
    }

    #[test]
    fn test_quat_angle_double_cover() {
        let q = Quat::from_rotation_y(0.5);
        assert!(quat_angle(q, -q) < 1e-3);
        assert!((quat_angle(Quat::IDENTITY, q) - 0.5).abs() < 1e-3);
    }
}
