//! Per-frame simulation tick
//!
//! Classify environment, integrate motion (drag, movement, gravity, thrusters,
//! contact), align the body orientation, then publish a report for the
//! camera, HUD and discovery layers.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::environment::{EnvironmentClassifier, Zone};
use super::motion::MotionIntegrator;
use super::orientation::OrientationAligner;
use super::state::{InputState, PlayerState, SimEvent};
use crate::tuning::Tuning;

/// Everything collaborators read after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub zone: Zone,
    pub transition_factor: f32,
    /// Index of the nearest body, if any
    pub nearest_body: Option<usize>,
    /// Distance to the nearest surface
    pub altitude: Option<f32>,
    pub speed: f32,
    pub fuel: f32,
    pub stamina: f32,
    pub on_ground: bool,
    pub collided_body: Option<usize>,
    pub surface_normal: Option<Vec3>,
    pub alignment_factor: f32,
    pub well_aligned: bool,
    pub body_orientation: Quat,
    /// Final camera rotation (body * head)
    pub look_rotation: Quat,
    pub events: Vec<SimEvent>,
}

/// Owns the per-avatar simulation state that persists between ticks
#[derive(Debug, Clone)]
pub struct Simulation {
    pub tuning: Tuning,
    classifier: EnvironmentClassifier,
    integrator: MotionIntegrator,
    aligner: OrientationAligner,
    ticks: u64,
    last_report: Option<TickReport>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

impl Simulation {
    pub fn new(tuning: Tuning) -> Self {
        log::info!(
            "Simulation created (ground radius {}, zone delay {} ticks)",
            tuning.collision.ground_radius,
            tuning.environment.zone_switch_delay
        );
        Self {
            classifier: EnvironmentClassifier::new(tuning.environment.clone()),
            integrator: MotionIntegrator::new(tuning.clone()),
            aligner: OrientationAligner::new(tuning.alignment.clone(), tuning.gravity.clone()),
            tuning,
            ticks: 0,
            last_report: None,
        }
    }

    pub fn classifier(&self) -> &EnvironmentClassifier {
        &self.classifier
    }

    /// Report published by the previous tick
    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance the avatar by one frame
    pub fn tick(
        &mut self,
        player: &mut PlayerState,
        input: &InputState,
        bodies: &[Body],
        dt: f32,
    ) -> TickReport {
        self.ticks += 1;

        if input.noclip_toggle {
            player.noclip = !player.noclip;
            if player.noclip {
                player.velocity = Vec3::ZERO;
                player.on_ground = false;
            }
            log::info!("Noclip {}", if player.noclip { "on" } else { "off" });
        }

        let previous_fuel = player.fuel;
        let previous_stamina = player.stamina;

        let env = self.classifier.classify(player.position, bodies);
        let motion = self.integrator.step(player, input, dt, bodies, &env);
        let alignment = self.aligner.align(
            player,
            motion.up,
            motion.dt,
            self.tuning.alignment.alignment_speed,
            bodies,
        );

        let mut report = TickReport {
            tick: self.ticks,
            zone: env.zone,
            transition_factor: env.transition_factor,
            nearest_body: env.nearest.map(|n| n.index),
            altitude: env.distance_to_surface(),
            speed: player.speed(),
            fuel: player.fuel,
            stamina: player.stamina,
            on_ground: player.on_ground,
            collided_body: motion.collision.collided_body,
            surface_normal: motion.collision.surface_normal,
            alignment_factor: alignment.factor,
            well_aligned: alignment.well_aligned,
            body_orientation: player.body_orientation,
            look_rotation: player.look_rotation(),
            events: Vec::new(),
        };

        report.events = self.collect_events(&report, previous_fuel, previous_stamina);
        self.last_report = Some(report.clone());
        report
    }

    /// Compare this tick against the previous one
    fn collect_events(
        &self,
        report: &TickReport,
        previous_fuel: f32,
        previous_stamina: f32,
    ) -> Vec<SimEvent> {
        let mut events = Vec::new();

        if let Some(prev) = &self.last_report {
            if prev.zone != report.zone {
                events.push(SimEvent::ZoneChanged {
                    from: prev.zone,
                    to: report.zone,
                });
            }

            match (prev.collided_body, report.collided_body) {
                (None, Some(body)) => {
                    log::debug!("Landed on body {} at speed {:.2}", body, prev.speed);
                    events.push(SimEvent::Landed { body });
                }
                (Some(body), None) => {
                    log::debug!("Took off from body {}", body);
                    events.push(SimEvent::TookOff { body });
                }
                (Some(from), Some(to)) if from != to => {
                    events.push(SimEvent::TookOff { body: from });
                    events.push(SimEvent::Landed { body: to });
                }
                _ => {}
            }
        } else if let Some(body) = report.collided_body {
            events.push(SimEvent::Landed { body });
        }

        if previous_fuel > 0.0 && report.fuel <= 0.0 {
            log::debug!("Fuel depleted");
            events.push(SimEvent::FuelDepleted);
        }
        if previous_stamina > 0.0 && report.stamina <= 0.0 {
            events.push(SimEvent::StaminaDepleted);
        }

        events
    }
}
