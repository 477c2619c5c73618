//! Gravity field
//!
//! Pairwise inverse-square attraction toward every body, with the distance
//! clamped near small bodies and each contribution capped so gameplay stays
//! controllable.

use glam::Vec3;

use super::body::{Body, NearestBody};
use crate::tuning::GravityTuning;

/// Mass proxy for a body: its radius, or a fixed mass for the primary light
pub fn body_mass(body: &Body, tuning: &GravityTuning) -> Option<f32> {
    let radius = body.valid_radius()?;
    Some(if body.primary_light {
        tuning.primary_mass
    } else {
        radius
    })
}

/// Acceleration contributed by a single body, `None` when skipped
pub fn body_acceleration(
    position: Vec3,
    body: &Body,
    mass: f32,
    tuning: &GravityTuning,
) -> Option<Vec3> {
    let radius = body.valid_radius()?;
    let body_mass = body_mass(body, tuning)?;

    let to_center = body.center - position;
    let distance = to_center.length();
    if !distance.is_finite() || distance <= tuning.epsilon {
        return None;
    }
    let direction = to_center / distance;

    let effective = distance.max(radius * tuning.min_distance_ratio);
    let magnitude = (tuning.gravitational_constant * body_mass * mass / (effective * effective))
        .min(tuning.max_acceleration);

    Some(direction * magnitude)
}

/// Sum of all body contributions at `position`
pub fn acceleration_at(position: Vec3, bodies: &[Body], mass: f32, tuning: &GravityTuning) -> Vec3 {
    bodies
        .iter()
        .filter_map(|body| body_acceleration(position, body, mass, tuning))
        .fold(Vec3::ZERO, |acc, a| acc + a)
}

/// Simple constant-strength pull toward the nearest body
pub fn directional_gravity(position: Vec3, nearest: &NearestBody, tuning: &GravityTuning) -> Vec3 {
    -nearest.up_at(position) * tuning.directional_strength
}

/// Escape velocity from a body of `mass` at `distance`
#[inline]
pub fn escape_velocity(mass: f32, distance: f32, tuning: &GravityTuning) -> f32 {
    if distance <= tuning.epsilon {
        return f32::INFINITY;
    }
    (2.0 * tuning.gravitational_constant * mass / distance).sqrt()
}
