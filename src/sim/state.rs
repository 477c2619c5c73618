//! Avatar state, per-tick input and simulation events

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::environment::Zone;
use super::orientation::HeadOrientation;
use crate::consts::*;

/// Everything the simulation owns about the avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Trunk alignment to the nearest surface (world up in deep space)
    pub body_orientation: Quat,
    /// Free look relative to the body
    pub head: HeadOrientation,
    pub on_ground: bool,
    pub fuel: f32,
    pub max_fuel: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    /// Kinematic fly mode: no gravity, drag or collision
    pub noclip: bool,
}

impl PlayerState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            body_orientation: Quat::IDENTITY,
            head: HeadOrientation::default(),
            on_ground: false,
            fuel: MAX_FUEL,
            max_fuel: MAX_FUEL,
            stamina: MAX_STAMINA,
            max_stamina: MAX_STAMINA,
            noclip: false,
        }
    }

    /// Final view rotation: body first, head second
    pub fn look_rotation(&self) -> Quat {
        (self.body_orientation * self.head.rotation()).normalize()
    }

    /// Camera-relative forward direction
    pub fn look_forward(&self) -> Vec3 {
        self.look_rotation() * Vec3::NEG_Z
    }

    /// Camera-relative right direction
    pub fn look_right(&self) -> Vec3 {
        self.look_rotation() * Vec3::X
    }

    /// Local up of the body orientation
    pub fn body_up(&self) -> Vec3 {
        self.body_orientation * Vec3::Y
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Input intents for a single tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub jetpack: bool,
    pub sprint: bool,
    pub down_thrusters: bool,
    /// One-shot: flip noclip this tick
    pub noclip_toggle: bool,
    /// Camera forward in world space
    pub camera_forward: Vec3,
    /// Camera right in world space
    pub camera_right: Vec3,
}

impl InputState {
    /// Input with camera axes taken from the avatar's current look
    pub fn looking_from(player: &PlayerState) -> Self {
        Self {
            camera_forward: player.look_forward(),
            camera_right: player.look_right(),
            ..Default::default()
        }
    }

    /// Forward/back and right/left as -1, 0 or 1
    pub fn move_axes(&self) -> (f32, f32) {
        let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f32;
        (axis(self.forward, self.back), axis(self.right, self.left))
    }

    pub fn wants_move(&self) -> bool {
        self.move_axes() != (0.0, 0.0)
    }
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    ZoneChanged { from: Zone, to: Zone },
    /// Touched down on a body
    Landed { body: usize },
    /// Left the surface of a body
    TookOff { body: usize },
    FuelDepleted,
    StaminaDepleted,
}
