//! Simulation core
//!
//! Everything that runs once per frame for the avatar lives here:
//! - Single-threaded, synchronous, no globals
//! - Bodies and tuning are passed in explicitly
//! - No rendering, input wiring or platform dependencies

pub mod body;
pub mod collision;
pub mod environment;
pub mod gravity;
pub mod motion;
pub mod orientation;
pub mod state;
pub mod tick;

pub use body::{Body, NearestBody, nearest_body};
pub use collision::{CollisionResult, apply_ground_friction, resolve, settle_on_surface};
pub use environment::{EnvironmentClassifier, EnvironmentResult, Zone, ZoneHysteresis};
pub use gravity::{acceleration_at, body_mass, directional_gravity, escape_velocity};
pub use motion::{MotionIntegrator, MotionReport};
pub use orientation::{Alignment, HeadOrientation, OrientationAligner};
pub use state::{InputState, PlayerState, SimEvent};
pub use tick::{Simulation, TickReport};
