use super::sink::{SignalKind, SignalRequest, SignalSink};
use crate::config::SignalConfig;
use crate::geo_math::planar_distance;
use crate::types::PlanarPosition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    Inactive,
    Active,
}

/// What one evaluation did to a vehicle's control state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Inactive -> Active, priority requested
    Entered,
    /// Still inside the enter radius while active
    Passing,
    /// Active -> Inactive past the exit radius, normal operation requested
    Exited,
    /// Active -> Inactive past the force-reset radius, no request sent
    ForcedReset,
    Unchanged,
}

/// Phase the junction should show when nothing else overrides it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionPhase {
    /// Default-safe: every approach held at red
    AllRed,
    /// Green along the priority vehicle's approach
    PriorityGreen,
}

/// Per-vehicle control status, created on first evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalControlStatus {
    pub active: bool,
    pub last_distance: f64,
    pub grants: u32,
    pub releases: u32,
}

impl SignalControlStatus {
    fn new() -> Self {
        SignalControlStatus {
            active: false,
            last_distance: f64::INFINITY,
            grants: 0,
            releases: 0,
        }
    }

    pub fn state(&self) -> ControlState {
        if self.active {
            ControlState::Active
        } else {
            ControlState::Inactive
        }
    }
}

/// Hysteresis controller for junction priority.
///
/// Priority is requested at `enter_radius` and only released past
/// `2 * enter_radius`, so distance noise around a single threshold cannot
/// toggle the signal. Beyond `force_reset_radius` a vehicle is always
/// inactive, which recovers a stuck grant when updates were missed.
pub struct SignalController {
    config: SignalConfig,
    junction: PlanarPosition,
    statuses: BTreeMap<String, SignalControlStatus>,
}

impl SignalController {
    /// `junction` is used unless the config carries an override
    pub fn new(config: SignalConfig, junction: PlanarPosition) -> Self {
        SignalController {
            junction: config.junction.unwrap_or(junction),
            config,
            statuses: BTreeMap::new(),
        }
    }

    pub fn junction(&self) -> PlanarPosition {
        self.junction
    }

    pub fn distance_to_junction(&self, position: &PlanarPosition) -> f64 {
        planar_distance(position, &self.junction)
    }

    pub fn evaluate<S: SignalSink + ?Sized>(
        &mut self,
        vehicle_id: &str,
        position: &PlanarPosition,
        sink: &mut S,
    ) -> Transition {
        let distance = self.distance_to_junction(position);
        let enter = self.config.enter_radius;
        let exit = self.config.exit_radius();
        let force_reset = self.config.force_reset_radius;

        let status = self
            .statuses
            .entry(vehicle_id.to_string())
            .or_insert_with(SignalControlStatus::new);
        status.last_distance = distance;

        let (transition, kind) = if distance <= enter {
            if status.active {
                (Transition::Passing, Some(SignalKind::VehiclePassing))
            } else {
                status.active = true;
                status.grants += 1;
                (Transition::Entered, Some(SignalKind::GrantPriority))
            }
        } else if distance > exit && status.active {
            status.active = false;
            status.releases += 1;
            (Transition::Exited, Some(SignalKind::ResumeNormal))
        } else if distance > force_reset && status.active {
            // Only reachable when the force-reset radius sits inside the exit radius
            status.active = false;
            (Transition::ForcedReset, None)
        } else {
            (Transition::Unchanged, None)
        };

        match transition {
            Transition::Entered => log::info!(
                "{} within {:.1} m of junction ({:.1} m), priority requested",
                vehicle_id,
                enter,
                distance
            ),
            Transition::Exited => log::info!(
                "{} left junction ({:.1} m), normal operation requested",
                vehicle_id,
                distance
            ),
            Transition::ForcedReset => log::warn!(
                "{} force-reset at {:.1} m without release signal",
                vehicle_id,
                distance
            ),
            Transition::Passing | Transition::Unchanged => {}
        }

        if let Some(kind) = kind {
            sink.send(SignalRequest {
                kind,
                vehicle_id: vehicle_id.to_string(),
                distance_m: distance,
            });
        }
        transition
    }

    pub fn any_active(&self) -> bool {
        self.statuses.values().any(|s| s.active)
    }

    pub fn recommended_phase(&self) -> JunctionPhase {
        if self.any_active() {
            JunctionPhase::PriorityGreen
        } else {
            JunctionPhase::AllRed
        }
    }

    /// Inactive for vehicles never evaluated
    pub fn state(&self, vehicle_id: &str) -> ControlState {
        self.statuses
            .get(vehicle_id)
            .map(SignalControlStatus::state)
            .unwrap_or(ControlState::Inactive)
    }

    pub fn status(&self, vehicle_id: &str) -> Option<&SignalControlStatus> {
        self.statuses.get(vehicle_id)
    }

    pub fn statuses(&self) -> &BTreeMap<String, SignalControlStatus> {
        &self.statuses
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }
}
