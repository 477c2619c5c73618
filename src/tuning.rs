//! Physics tuning
//!
//! Every balance knob of the simulation lives here so it can be tweaked from a
//! JSON file without recompiling. Missing fields fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Zone classification thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentTuning {
    /// Center distance (in radii) below which the avatar is in the atmosphere
    pub atmosphere_ratio: f32,
    /// Center distance (in radii) below which the avatar is in the upper atmosphere
    pub outer_ratio: f32,
    /// Absolute surface distance counted as "on the surface"
    pub ground_threshold: f32,
    /// Extra margin on the ground threshold while already on the surface
    pub hysteresis_band: f32,
    /// Consecutive ticks a new zone must be proposed before it is accepted
    pub zone_switch_delay: u32,
}

impl Default for EnvironmentTuning {
    fn default() -> Self {
        Self {
            atmosphere_ratio: 1.25,
            outer_ratio: 1.5,
            ground_threshold: 1.5,
            hysteresis_band: 0.5,
            zone_switch_delay: 3,
        }
    }
}

/// Gravity field parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityTuning {
    pub gravitational_constant: f32,
    /// Mass proxy used for the primary light source instead of its radius
    pub primary_mass: f32,
    /// Effective distance never drops below `radius * min_distance_ratio`
    pub min_distance_ratio: f32,
    /// Per-body acceleration cap
    pub max_acceleration: f32,
    /// Distances at or below this are skipped
    pub epsilon: f32,
    /// Strength of the simple "toward nearest body" gravity near planets
    pub directional_strength: f32,
}

impl Default for GravityTuning {
    fn default() -> Self {
        Self {
            gravitational_constant: 50.0,
            primary_mass: 400.0,
            min_distance_ratio: 0.5,
            max_acceleration: 20.0,
            epsilon: 1e-3,
            directional_strength: 12.0,
        }
    }
}

/// Surface contact parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Resting distance between avatar origin and the surface
    pub ground_radius: f32,
    /// Extra distance still counted as contact
    pub contact_slop: f32,
    /// Velocity multiplier applied on impact
    pub impact_damping: f32,
    /// Tangential friction rate while grounded (per second)
    pub ground_friction: f32,
    /// Normal speeds below this are treated as drift and removed while grounded
    pub drift_threshold: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            ground_radius: 1.0,
            contact_slop: 0.05,
            impact_damping: 0.8,
            ground_friction: 8.0,
            drift_threshold: 0.5,
        }
    }
}

/// Movement, drag and resource parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Per-step drag coefficients at the reference rate
    pub space_drag: f32,
    pub high_altitude_drag: f32,
    pub atmosphere_drag: f32,
    /// Ceiling on the fraction of velocity removed in one step
    pub max_drag_per_step: f32,
    /// Frame rate the drag coefficients are expressed at
    pub reference_rate: f32,

    pub move_accel: f32,
    pub space_speed_factor: f32,
    pub ground_speed_factor: f32,
    pub sprint_multiplier: f32,
    pub jump_speed: f32,

    pub noclip_speed: f32,
    pub noclip_sprint_multiplier: f32,

    pub stamina_drain: f32,
    pub stamina_regen: f32,
    pub fuel_drain: f32,
    pub jetpack_thrust: f32,
    pub down_thrust: f32,
    /// Thrusters push along local up inside `radius * jetpack_range_ratio`
    pub jetpack_range_ratio: f32,

    /// Largest step the integrator accepts. Longer frames are clamped, so one
    /// tick never drains more than `fuel_drain * max_delta_time` fuel.
    pub max_delta_time: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            space_drag: 0.0005,
            high_altitude_drag: 0.02,
            atmosphere_drag: 0.1,
            max_drag_per_step: 0.5,
            reference_rate: 60.0,

            move_accel: 60.0,
            space_speed_factor: 0.4,
            ground_speed_factor: 1.0,
            sprint_multiplier: 1.8,
            jump_speed: 8.0,

            noclip_speed: 20.0,
            noclip_sprint_multiplier: 3.0,

            stamina_drain: 20.0,
            stamina_regen: 10.0,
            fuel_drain: 10.0,
            jetpack_thrust: 25.0,
            down_thrust: 25.0,
            jetpack_range_ratio: 1.5,

            max_delta_time: 0.1,
        }
    }
}

/// Body alignment parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentTuning {
    pub alignment_speed: f32,
    /// Scales `factor * speed * dt` into a slerp fraction
    pub tuning: f32,
    /// Gravity acceleration that maps to full influence
    pub influence_reference: f32,
    /// Below this factor the body no longer needs alignment
    pub well_aligned_threshold: f32,
    /// |up . reference| above this switches to the fallback reference axis
    pub parallel_threshold: f32,
}

impl Default for AlignmentTuning {
    fn default() -> Self {
        Self {
            alignment_speed: 3.0,
            tuning: 2.0,
            influence_reference: 2.0,
            well_aligned_threshold: 0.05,
            parallel_threshold: 0.999,
        }
    }
}

/// Complete tuning set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub environment: EnvironmentTuning,
    pub gravity: GravityTuning,
    pub collision: CollisionTuning,
    pub motion: MotionTuning,
    pub alignment: AlignmentTuning,
}

impl Tuning {
    /// Parse tuning from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load tuning from a file, falling back to defaults on any error
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not read tuning {}: {}, using defaults", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Invalid tuning {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write tuning as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Tuning saved to {}", path.as_ref().display());
        Ok(())
    }
}
