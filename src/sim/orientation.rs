//! Body and head orientation
//!
//! The avatar's rotation is split in two. The body orientation follows the
//! local "up" of the nearest planet and is only ever moved by the aligner.
//! The head orientation is free look (yaw and pitch, no roll) owned by the
//! input layer. The view is always `body * head`.

use glam::{EulerRot, Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::body::{Body, nearest_body};
use super::gravity::{body_mass, escape_velocity};
use super::state::PlayerState;
use crate::consts::MAX_PITCH;
use crate::project_on_plane;
use crate::tuning::{AlignmentTuning, GravityTuning};

/// Free-look rotation relative to the body
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadOrientation {
    /// Radians around body up, positive turns left
    pub yaw: f32,
    /// Radians around body right, positive looks up
    pub pitch: f32,
}

impl HeadOrientation {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Apply a mouse-look delta; pitch is clamped short of straight up/down
    pub fn look(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = crate::normalize_angle(self.yaw + delta_yaw);
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }
}

/// Outcome of one alignment step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    /// Gravitational influence after escape-velocity suppression, in [0, 1]
    pub factor: f32,
    /// True once the body no longer needs aligning (e.g. deep space)
    pub well_aligned: bool,
}

impl Alignment {
    fn skipped() -> Self {
        Self {
            factor: 0.0,
            well_aligned: false,
        }
    }
}

/// World axis the heading is measured from, shared by both ups of one re-basing.
///
/// World +Z unless either up is nearly parallel to it, then world +X. Picking
/// it once per pair keeps the extracted and re-applied headings in the same
/// frame.
pub fn reference_axis(old_up: Vec3, new_up: Vec3, parallel_threshold: f32) -> Vec3 {
    let along_z = old_up.dot(Vec3::Z).abs().max(new_up.dot(Vec3::Z).abs());
    if along_z > parallel_threshold {
        Vec3::X
    } else {
        Vec3::Z
    }
}

/// Rotation whose local +Y is `up` and whose forward is derived from `reference`
pub fn up_basis(up: Vec3, reference: Vec3) -> Quat {
    let right = up.cross(reference).normalize();
    let back = right.cross(up).normalize();
    Quat::from_mat3(&Mat3::from_cols(right, up, back)).normalize()
}

/// Heading of `orientation` around its own up axis, relative to `up_basis`
pub fn heading(orientation: Quat, reference: Vec3) -> f32 {
    let up = (orientation * Vec3::Y).normalize();
    let forward = project_on_plane(orientation * Vec3::NEG_Z, up).normalize_or_zero();
    if forward == Vec3::ZERO {
        return 0.0;
    }

    let basis_forward = up_basis(up, reference) * Vec3::NEG_Z;
    let sin = basis_forward.cross(forward).dot(up);
    let cos = basis_forward.dot(forward);
    sin.atan2(cos)
}

/// Body orientation with `new_up` as its up axis and the heading of `current`
pub fn target_orientation(current: Quat, new_up: Vec3, parallel_threshold: f32) -> Quat {
    let old_up = (current * Vec3::Y).normalize();
    let reference = reference_axis(old_up, new_up, parallel_threshold);
    let yaw = heading(current, reference);
    (Quat::from_axis_angle(new_up, yaw) * up_basis(new_up, reference)).normalize()
}

/// Keeps the body orientation aligned with the local surface
#[derive(Debug, Clone, Default)]
pub struct OrientationAligner {
    pub tuning: AlignmentTuning,
    pub gravity: GravityTuning,
}

impl OrientationAligner {
    pub fn new(tuning: AlignmentTuning, gravity: GravityTuning) -> Self {
        Self { tuning, gravity }
    }

    /// How strongly the nearest body pulls the body orientation, in [0, 1].
    ///
    /// Full when grounded. Otherwise inverse-square influence, faded out
    /// linearly between half and full escape velocity.
    pub fn alignment_factor(&self, player: &PlayerState, bodies: &[Body]) -> f32 {
        if player.on_ground {
            return 1.0;
        }

        let Some(nearest) = nearest_body(player.position, bodies) else {
            return 0.0;
        };
        let Some(mass) = body_mass(&bodies[nearest.index], &self.gravity) else {
            return 0.0;
        };

        let distance = nearest.center_distance.max(self.gravity.epsilon);
        let pull = self.gravity.gravitational_constant * mass / (distance * distance);
        let influence = (pull / self.tuning.influence_reference).clamp(0.0, 1.0);

        let escape = escape_velocity(mass, distance, &self.gravity);
        influence * escape_suppression(player.speed(), escape)
    }

    /// Move the body orientation toward `up`. No-op in noclip.
    pub fn align(
        &self,
        player: &mut PlayerState,
        up: Vec3,
        dt: f32,
        alignment_speed: f32,
        bodies: &[Body],
    ) -> Alignment {
        if player.noclip {
            return Alignment::skipped();
        }

        let factor = self.alignment_factor(player, bodies);
        let well_aligned = factor < self.tuning.well_aligned_threshold;

        let up = up.normalize_or_zero();
        if up == Vec3::ZERO || !up.is_finite() {
            return Alignment { factor, well_aligned };
        }

        let threshold = self.tuning.parallel_threshold;
        let target = target_orientation(player.body_orientation, up, threshold);
        let t = if player.on_ground {
            1.0
        } else {
            (factor * alignment_speed * dt * self.tuning.tuning).clamp(0.0, 1.0)
        };

        if t > 0.0 {
            player.body_orientation = player.body_orientation.slerp(target, t).normalize();
        }

        Alignment { factor, well_aligned }
    }
}

/// 1 up to half escape velocity, then linearly down to 0 at escape velocity
pub fn escape_suppression(speed: f32, escape_velocity: f32) -> f32 {
    if !escape_velocity.is_finite() || escape_velocity <= 0.0 {
        return 1.0;
    }
    let ratio = speed / escape_velocity;
    if ratio <= 0.5 {
        1.0
    } else {
        (1.0 - (ratio - 0.5) / 0.5).clamp(0.0, 1.0)
    }
}
