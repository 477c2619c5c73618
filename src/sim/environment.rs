//! Environment classification
//!
//! Decides which zone the avatar is in relative to its nearest body and how far
//! it is through the upper-atmosphere band. Zone changes go through a
//! hysteresis band (for the ground test) and a switch delay so positions
//! sitting on a threshold do not flicker between zones.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::{Body, NearestBody, nearest_body};
use crate::tuning::EnvironmentTuning;

/// Where the avatar is relative to the nearest body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    DeepSpace,
    UpperAtmosphere,
    Atmosphere,
    Surface,
}

impl Zone {
    /// HUD label
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::DeepSpace => "Deep Space",
            Zone::UpperAtmosphere => "Upper Atmosphere",
            Zone::Atmosphere => "Atmosphere",
            Zone::Surface => "Surface",
        }
    }
}

/// Result of one classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentResult {
    pub zone: Zone,
    /// 0 = fully surface-coupled, 1 = fully orbital
    pub transition_factor: f32,
    pub nearest: Option<NearestBody>,
}

impl EnvironmentResult {
    /// Result used when there is nothing to be near
    pub fn deep_space() -> Self {
        Self {
            zone: Zone::DeepSpace,
            transition_factor: 1.0,
            nearest: None,
        }
    }

    pub fn distance_to_surface(&self) -> Option<f32> {
        self.nearest.map(|n| n.surface_distance)
    }
}

/// Zone hysteresis state carried between ticks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneHysteresis {
    /// Last accepted zone (`None` before the first tick)
    pub last_zone: Option<Zone>,
    /// Zone waiting to be accepted
    pub pending_zone: Option<Zone>,
    /// Consecutive ticks `pending_zone` has been proposed
    pub switch_counter: u32,
}

/// Stateful zone classifier
#[derive(Debug, Clone, Default)]
pub struct EnvironmentClassifier {
    pub tuning: EnvironmentTuning,
    pub state: ZoneHysteresis,
}

impl EnvironmentClassifier {
    pub fn new(tuning: EnvironmentTuning) -> Self {
        Self {
            tuning,
            state: ZoneHysteresis::default(),
        }
    }

    /// Start from a known prior state (used to resume or to test in isolation)
    pub fn with_state(tuning: EnvironmentTuning, state: ZoneHysteresis) -> Self {
        Self { tuning, state }
    }

    /// Zone the geometry alone suggests, before the switch delay
    pub fn propose(&self, nearest: &NearestBody) -> Zone {
        let t = &self.tuning;

        let ground_threshold = if self.state.last_zone == Some(Zone::Surface) {
            t.ground_threshold + t.hysteresis_band
        } else {
            t.ground_threshold
        };

        if nearest.surface_distance <= ground_threshold {
            Zone::Surface
        } else if nearest.center_distance <= nearest.radius * t.atmosphere_ratio {
            Zone::Atmosphere
        } else if nearest.center_distance <= nearest.radius * t.outer_ratio {
            Zone::UpperAtmosphere
        } else {
            Zone::DeepSpace
        }
    }

    /// Classify a position for this tick, updating hysteresis state
    pub fn classify(&mut self, position: Vec3, bodies: &[Body]) -> EnvironmentResult {
        let Some(nearest) = nearest_body(position, bodies) else {
            if self.state.last_zone != Some(Zone::DeepSpace) {
                log::debug!("No bodies in range, switching to deep space");
            }
            self.state = ZoneHysteresis {
                last_zone: Some(Zone::DeepSpace),
                ..Default::default()
            };
            return EnvironmentResult::deep_space();
        };

        let proposed = self.propose(&nearest);
        let zone = self.apply_switch_delay(proposed);

        EnvironmentResult {
            zone,
            transition_factor: self.transition_factor(zone, &nearest),
            nearest: Some(nearest),
        }
    }

    /// Hold the previous zone until a change has been proposed on enough
    /// consecutive ticks
    fn apply_switch_delay(&mut self, proposed: Zone) -> Zone {
        let state = &mut self.state;

        let Some(last) = state.last_zone else {
            state.last_zone = Some(proposed);
            return proposed;
        };

        if proposed == last {
            state.pending_zone = None;
            state.switch_counter = 0;
            return last;
        }

        if state.pending_zone == Some(proposed) {
            state.switch_counter += 1;
        } else {
            state.pending_zone = Some(proposed);
            state.switch_counter = 1;
        }

        if state.switch_counter >= self.tuning.zone_switch_delay {
            log::debug!("Zone {} -> {}", last.as_str(), proposed.as_str());
            state.last_zone = Some(proposed);
            state.pending_zone = None;
            state.switch_counter = 0;
            proposed
        } else {
            last
        }
    }

    /// Blend value for the reported zone
    fn transition_factor(&self, zone: Zone, nearest: &NearestBody) -> f32 {
        match zone {
            Zone::DeepSpace => 1.0,
            Zone::Atmosphere | Zone::Surface => 0.0,
            Zone::UpperAtmosphere => {
                let inner = nearest.radius * self.tuning.atmosphere_ratio;
                let outer = nearest.radius * self.tuning.outer_ratio;
                let band = outer - inner;
                if band <= f32::EPSILON {
                    return 1.0;
                }
                ((nearest.center_distance - inner) / band).clamp(0.0, 1.0)
            }
        }
    }
}
