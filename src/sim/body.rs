//! Planetary body descriptors
//!
//! Bodies are owned by the world layer and handed to the simulation each tick.
//! They are treated as perfect spheres.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A spherical body (planet, moon or star)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub center: Vec3,
    /// Sphere radius. Bodies without a usable radius are ignored by every system.
    pub radius: Option<f32>,
    /// Primary light source (the star); gets a fixed, larger mass proxy
    #[serde(default)]
    pub primary_light: bool,
}

impl Body {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: Some(radius),
            primary_light: false,
        }
    }

    /// Mark this body as the primary light source
    pub fn star(center: Vec3, radius: f32) -> Self {
        Self {
            primary_light: true,
            ..Self::new(center, radius)
        }
    }

    /// Radius if it is finite and positive
    #[inline]
    pub fn valid_radius(&self) -> Option<f32> {
        self.radius.filter(|r| r.is_finite() && *r > 0.0)
    }

    /// Distance from `point` to the surface (negative inside)
    pub fn surface_distance(&self, point: Vec3) -> Option<f32> {
        let radius = self.valid_radius()?;
        Some(point.distance(self.center) - radius)
    }
}

/// The body closest to a point, measured to its surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestBody {
    /// Index into the body list
    pub index: usize,
    pub center: Vec3,
    pub radius: f32,
    /// Distance from the point to the body center
    pub center_distance: f32,
    /// Distance from the point to the surface
    pub surface_distance: f32,
}

impl NearestBody {
    /// Unit vector from the body center toward `point`, or world up when degenerate
    pub fn up_at(&self, point: Vec3) -> Vec3 {
        let up = (point - self.center).normalize_or_zero();
        if up == Vec3::ZERO { Vec3::Y } else { up }
    }
}

/// Linear scan for the nearest valid body by surface distance
pub fn nearest_body(point: Vec3, bodies: &[Body]) -> Option<NearestBody> {
    let mut best: Option<NearestBody> = None;

    for (index, body) in bodies.iter().enumerate() {
        let Some(radius) = body.valid_radius() else {
            continue;
        };
        let center_distance = point.distance(body.center);
        let surface_distance = center_distance - radius;
        if !surface_distance.is_finite() {
            continue;
        }

        if best.is_none_or(|b| surface_distance < b.surface_distance) {
            best = Some(NearestBody {
                index,
                center: body.center,
                radius,
                center_distance,
                surface_distance,
            });
        }
    }

    best
}
