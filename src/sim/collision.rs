//! Collision detection and response against spherical surfaces
//!
//! Single contact per tick: the first body (in list order) the avatar touches
//! is resolved and scanning stops. Bodies are expected to be well separated.

use glam::Vec3;

use super::body::Body;
use crate::project_on_plane;
use crate::tuning::CollisionTuning;

/// Result of a collision pass
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionResult {
    pub on_ground: bool,
    /// Index of the body in contact
    pub collided_body: Option<usize>,
    /// Outward unit normal at the contact
    pub surface_normal: Option<Vec3>,
    /// How far the position was pushed out
    pub correction: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            on_ground: false,
            collided_body: None,
            surface_normal: None,
            correction: 0.0,
        }
    }
}

/// Resolve contact between a point avatar and the bodies.
///
/// Pushes `position` out to `ground_radius` above the first touched surface,
/// cancels the inward velocity component and damps the velocity on impact.
pub fn resolve(
    position: &mut Vec3,
    velocity: &mut Vec3,
    bodies: &[Body],
    ground_radius: f32,
    tuning: &CollisionTuning,
) -> CollisionResult {
    for (index, body) in bodies.iter().enumerate() {
        let Some(radius) = body.valid_radius() else {
            continue;
        };

        let offset = *position - body.center;
        let center_distance = offset.length();
        let surface_distance = center_distance - radius;
        let in_contact = surface_distance < ground_radius + tuning.contact_slop;
        if !surface_distance.is_finite() || !in_contact {
            continue;
        }

        let normal = offset.normalize_or_zero();
        let normal = if normal == Vec3::ZERO { Vec3::Y } else { normal };

        let correction = (ground_radius - surface_distance).max(0.0);
        *position += normal * correction;

        let normal_speed = velocity.dot(normal);
        if normal_speed < 0.0 {
            *velocity -= normal * normal_speed;
            *velocity *= tuning.impact_damping;
        }

        return CollisionResult {
            on_ground: true,
            collided_body: Some(index),
            surface_normal: Some(normal),
            correction,
        };
    }

    CollisionResult::miss()
}

/// Re-project a grounded avatar onto the sphere at `ground_radius` above `body`.
///
/// Tangential steps on a curved surface drift outward; `resolve` only pushes
/// out, so this pulls the avatar back down after integration. Returns the
/// surface normal at the settled position.
pub fn settle_on_surface(position: &mut Vec3, body: &Body, ground_radius: f32) -> Option<Vec3> {
    let radius = body.valid_radius()?;
    let normal = (*position - body.center).normalize_or_zero();
    if normal == Vec3::ZERO {
        return None;
    }
    *position = body.center + normal * (radius + ground_radius);
    Some(normal)
}

/// Ground friction applied after position integration.
///
/// Damps sliding along the surface and removes small normal drift; larger
/// outward speeds (jumps) are left alone.
pub fn apply_ground_friction(
    velocity: Vec3,
    normal: Vec3,
    dt: f32,
    tuning: &CollisionTuning,
) -> Vec3 {
    let normal_speed = velocity.dot(normal);
    let tangential = project_on_plane(velocity, normal);
    let retain = 1.0 - (tuning.ground_friction * dt).clamp(0.0, 1.0);

    let normal_part = if normal_speed.abs() < tuning.drift_threshold {
        Vec3::ZERO
    } else {
        normal * normal_speed
    };

    tangential * retain + normal_part
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planet() -> Vec<Body> {
        vec![Body::new(Vec3::ZERO, 10.0)]
    }

    #[test]
    fn test_pushes_out_and_cancels_inward_velocity() {
        let tuning = CollisionTuning::default();
        let mut pos = Vec3::new(0.0, 10.5, 0.0);
        let mut vel = Vec3::new(2.0, -5.0, 0.0);

        let result = resolve(&mut pos, &mut vel, &planet(), 1.0, &tuning);
        assert!(result.on_ground);
        assert_eq!(result.collided_body, Some(0));
        assert!((pos.y - 11.0).abs() < 1e-5);
        assert!(vel.y.abs() < 1e-6);
        assert!((vel.x - 2.0 * tuning.impact_damping).abs() < 1e-5);
    }

    #[test]
    fn test_outward_velocity_untouched() {
        let tuning = CollisionTuning::default();
        let mut pos = Vec3::new(0.0, 11.0, 0.0);
        let mut vel = Vec3::new(0.0, 8.0, 0.0);

        let result = resolve(&mut pos, &mut vel, &planet(), 1.0, &tuning);
        assert!(result.on_ground);
        assert_eq!(vel, Vec3::new(0.0, 8.0, 0.0));
    }

    #[test]
    fn test_miss_when_far() {
        let tuning = CollisionTuning::default();
        let mut pos = Vec3::new(0.0, 20.0, 0.0);
        let mut vel = Vec3::ZERO;
        let result = resolve(&mut pos, &mut vel, &planet(), 1.0, &tuning);
        assert_eq!(result, CollisionResult::miss());
        assert_eq!(pos, Vec3::new(0.0, 20.0, 0.0));
    }

    #[test]
    fn test_second_resolve_is_idempotent() {
        let tuning = CollisionTuning::default();
        let mut pos = Vec3::new(3.0, 8.0, -2.0);
        let mut vel = Vec3::new(0.0, -3.0, 0.0);
        resolve(&mut pos, &mut vel, &planet(), 1.0, &tuning);

        let again = resolve(&mut pos, &mut vel, &planet(), 1.0, &tuning);
        assert!(again.on_ground);
        assert!(again.correction < 1e-4);
    }

    #[test]
    fn test_first_body_in_list_wins() {
        let tuning = CollisionTuning::default();
        // Overlapping bodies; the second is closer but the first is listed first
        let bodies = vec![
            Body::new(Vec3::new(0.0, -10.0, 0.0), 10.5),
            Body::new(Vec3::new(0.0, 10.0, 0.0), 10.0),
        ];
        let mut pos = Vec3::new(0.0, 0.2, 0.0);
        let mut vel = Vec3::ZERO;
        let result = resolve(&mut pos, &mut vel, &bodies, 1.0, &tuning);
        assert_eq!(result.collided_body, Some(0));
    }

    #[test]
    fn test_settle_pulls_back_down_to_ground_radius() {
        let body = Body::new(Vec3::new(5.0, 0.0, 0.0), 10.0);

        let mut pos = Vec3::new(5.0, 11.04, 0.3);
        let normal = settle_on_surface(&mut pos, &body, 1.0).unwrap();
        assert!((pos.distance(body.center) - 11.0).abs() < 1e-5);
        assert!((normal - Vec3::new(0.0, 11.04, 0.3).normalize()).length() < 1e-5);

        let mut at_center = body.center;
        assert_eq!(settle_on_surface(&mut at_center, &body, 1.0), None);
        assert_eq!(at_center, body.center);
    }

    #[test]
    fn test_friction_keeps_jump_and_removes_drift() {
        let tuning = CollisionTuning::default();
        let dt = 1.0 / 60.0;

        let drift = apply_ground_friction(Vec3::new(4.0, 0.2, 0.0), Vec3::Y, dt, &tuning);
        assert_eq!(drift.y, 0.0);
        assert!(drift.x < 4.0 && drift.x > 0.0);

        let jump = apply_ground_friction(Vec3::new(0.0, 8.0, 0.0), Vec3::Y, dt, &tuning);
        assert_eq!(jump.y, 8.0);
    }
}
