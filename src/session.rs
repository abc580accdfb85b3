use crate::config::PipelineConfig;
use crate::error::{ConfigError, PlacementError};
use crate::filters::{FilterDecision, NoiseFilter};
use crate::mapping::MappingProfile;
use crate::signal::{JunctionPhase, SignalController, SignalSink, Transition};
use crate::tracker::PositionTracker;
use crate::types::{GeoFix, PlanarPosition};
use chrono::{DateTime, Utc};

/// External consumer that puts the vehicle at a planar position.
///
/// Returns where the vehicle actually ended up, which may differ from the
/// requested target (lane snapping and the like).
pub trait Positioner {
    fn place(&mut self, vehicle_id: &str, target: PlanarPosition) -> Result<PlanarPosition, PlacementError>;
}

/// Places the vehicle exactly at the requested target
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectPositioner;

impl Positioner for DirectPositioner {
    fn place(&mut self, _vehicle_id: &str, target: PlanarPosition) -> Result<PlanarPosition, PlacementError> {
        Ok(target)
    }
}

/// Everything that happened to one fix
#[derive(Clone, Debug)]
pub struct TickReport {
    pub fix: GeoFix,
    pub decision: FilterDecision,
    /// Mapped target, `None` before the filter has a believed position
    pub target: Option<PlanarPosition>,
    pub placed: Option<PlanarPosition>,
    pub step: Option<u64>,
    pub attempts: u32,
    pub placement_error: Option<PlacementError>,
    /// `None` when nothing was placed or the profile has no signalled junction
    pub transition: Option<Transition>,
    pub phase: JunctionPhase,
}

/// One tracked vehicle's pipeline: filter -> mapper -> positioner ->
/// tracker -> signal controller. Driven synchronously, one fix per tick.
pub struct Session {
    config: PipelineConfig,
    session_id: String,
    started_at: DateTime<Utc>,
    filter: NoiseFilter,
    profile: MappingProfile,
    tracker: PositionTracker,
    controller: SignalController,
    step: u64,
    mapped_count: u64,
    placement_failures: u64,
}

impl Session {
    /// Validates the config up front; nothing after this point is fatal
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let started_at = Utc::now();
        let session_id = format!("session_{}", started_at.timestamp_millis());

        log::info!(
            "{} starting: vehicle {}, profile {}, filter {}",
            session_id,
            config.vehicle_id,
            config.profile,
            if config.filter.enabled { "on" } else { "off" }
        );
        if config.filter.enabled {
            log::info!(
                "  min movement {:.6} deg, max speed {:.1} km/h, window {}, stationary {:.1} s",
                config.filter.min_movement_threshold_deg,
                config.filter.max_speed_kmh,
                config.filter.window_size,
                config.filter.stationary_timeout_sec
            );
        }

        let profile = MappingProfile::from_kind(config.profile);
        if !profile.has_signal_control() {
            log::info!("  profile {} has no signalled junction, priority control off", config.profile);
        }

        Ok(Session {
            filter: NoiseFilter::new(config.filter.clone()),
            controller: SignalController::new(config.signal.clone(), profile.junction()),
            profile,
            tracker: PositionTracker::new(),
            config,
            session_id,
            started_at,
            step: 0,
            mapped_count: 0,
            placement_failures: 0,
        })
    }

    pub fn tick<P, S>(&mut self, fix: GeoFix, positioner: &mut P, sink: &mut S) -> TickReport
    where
        P: Positioner + ?Sized,
        S: SignalSink + ?Sized,
    {
        let decision = self.filter.evaluate(fix);
        let mut report = TickReport {
            fix,
            decision,
            target: None,
            placed: None,
            step: None,
            attempts: 0,
            placement_error: None,
            transition: None,
            phase: self.controller.recommended_phase(),
        };

        let believed = match report.decision.position {
            Some(position) => position,
            None => return report,
        };

        let target = self.profile.geo_to_planar(&believed);
        self.mapped_count += 1;
        if self.mapped_count % 10 == 1 {
            log::debug!(
                "mapping #{}: ({:.8}, {:.8}) -> ({:.2}, {:.2})",
                self.mapped_count,
                believed.latitude,
                believed.longitude,
                target.x,
                target.y
            );
        }
        report.target = Some(target);

        let (result, attempts) = self.place_with_fallback(target, positioner);
        report.attempts = attempts;
        let placed = match result {
            Ok(placed) => placed,
            Err(e) => {
                self.placement_failures += 1;
                log::warn!(
                    "{} placement failed after {} attempt(s): {}",
                    self.config.vehicle_id,
                    attempts,
                    e
                );
                report.placement_error = Some(e);
                return report;
            }
        };

        self.step += 1;
        self.tracker
            .record(&self.config.vehicle_id, self.step, placed, believed);
        report.placed = Some(placed);
        report.step = Some(self.step);

        if !self.profile.has_signal_control() {
            return report;
        }
        report.transition = Some(
            self.controller
                .evaluate(&self.config.vehicle_id, &placed, sink),
        );
        report.phase = self.controller.recommended_phase();
        report
    }

    /// Primary target first, then the profile's safe fallbacks
    fn place_with_fallback<P: Positioner + ?Sized>(
        &self,
        target: PlanarPosition,
        positioner: &mut P,
    ) -> (Result<PlanarPosition, PlacementError>, u32) {
        let candidates = [
            target,
            self.profile.nearest_safe_position(&target),
            self.profile.snap_to_road(&target),
        ];
        let vehicle_id = &self.config.vehicle_id;
        let mut last_err = None;

        for attempt in 0..self.config.placement_attempts {
            let candidate = candidates[(attempt as usize).min(candidates.len() - 1)];
            match positioner.place(vehicle_id, candidate) {
                Ok(placed) => return (Ok(placed), attempt + 1),
                Err(e) => {
                    log::debug!(
                        "{} placement attempt {} at ({:.2}, {:.2}) failed: {}",
                        vehicle_id,
                        attempt + 1,
                        candidate.x,
                        candidate.y,
                        e
                    );
                    last_err = Some(e);
                }
            }
        }

        let err = last_err.unwrap_or_else(|| PlacementError::UnknownVehicle(vehicle_id.clone()));
        (Err(err), self.config.placement_attempts)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn vehicle_id(&self) -> &str {
        &self.config.vehicle_id
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn mapped_count(&self) -> u64 {
        self.mapped_count
    }

    pub fn placement_failures(&self) -> u64 {
        self.placement_failures
    }

    pub fn filter(&self) -> &NoiseFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut NoiseFilter {
        &mut self.filter
    }

    pub fn profile(&self) -> &MappingProfile {
        &self.profile
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn controller(&self) -> &SignalController {
        &self.controller
    }
}
