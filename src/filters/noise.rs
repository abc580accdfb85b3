use crate::config::FilterConfig;
use crate::geo_math::{coordinate_delta, haversine_distance};
use crate::types::GeoFix;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Movement below this while parked is treated as residual noise (meters)
const STATIONARY_NOISE_RADIUS_M: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Coordinate change below the receiver's resolution
    BelowMovementThreshold,
    /// Jump implies a physically implausible speed
    ImplausibleSpeed,
    /// Drift while the vehicle has been parked past the stationary timeout
    StationaryNoise,
    /// Non-finite or out-of-range coordinates
    InvalidFix,
}

/// Outcome of feeding one fix through the filter
#[derive(Clone, Debug, PartialEq)]
pub struct FilterDecision {
    /// Position to report downstream; `None` only before the first valid fix
    pub position: Option<GeoFix>,
    /// The fix was not used as the new position. Invalid fixes always set
    /// this, but only count towards `rejected_fixes` while filtering is on;
    /// with filtering off the ratio stays 0 and `reasons` names the cause.
    pub was_filtered: bool,
    pub reasons: Vec<RejectReason>,
    /// Haversine distance to the last significant fix (0 when seeding)
    pub distance_m: f64,
    pub speed_kmh: f64,
}

/// Per-vehicle filter history
#[derive(Clone, Debug, Default)]
pub struct FilterState {
    pub recent_fixes: VecDeque<GeoFix>,
    pub last_significant: Option<GeoFix>,
    pub last_movement_at: f64,
    pub believed_position: Option<GeoFix>,
    /// Blended (lat, lon), diagnostics only
    pub filtered_position: Option<(f64, f64)>,
    pub is_stationary: bool,
    pub total_fixes: u64,
    pub rejected_fixes: u64,
    pub invalid_fixes: u64,
}

/// Snapshot of the filter for status output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterStatus {
    pub last_significant: GeoFix,
    pub seconds_since_movement: f64,
    pub is_stationary: bool,
    pub window_len: usize,
    pub window_size: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseLevel {
    Normal,
    Elevated,
    High,
}

impl NoiseLevel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.8 {
            NoiseLevel::High
        } else if ratio > 0.5 {
            NoiseLevel::Elevated
        } else {
            NoiseLevel::Normal
        }
    }
}

/// Threshold-based GPS noise rejection
///
/// Rejected fixes never move the believed position; the caller keeps
/// reporting the last significant fix until real movement is observed.
/// Calls must be serialized; the filter does no locking of its own.
pub struct NoiseFilter {
    config: FilterConfig,
    state: FilterState,
}

impl NoiseFilter {
    /// Config is assumed validated (`FilterConfig::validate`)
    pub fn new(config: FilterConfig) -> Self {
        let window = config.window_size;
        NoiseFilter {
            config,
            state: FilterState {
                recent_fixes: VecDeque::with_capacity(window),
                ..FilterState::default()
            },
        }
    }

    pub fn evaluate(&mut self, fix: GeoFix) -> FilterDecision {
        if !fix.is_valid() {
            return self.reject_invalid(fix);
        }

        let last = match (self.state.last_significant, self.config.enabled) {
            (Some(last), true) => last,
            (Some(_), false) => {
                // Filtering off: pass everything through
                self.push_window(fix);
                self.state.total_fixes += 1;
                self.accept(fix);
                return FilterDecision {
                    position: Some(fix),
                    was_filtered: false,
                    reasons: Vec::new(),
                    distance_m: 0.0,
                    speed_kmh: 0.0,
                };
            }
            (None, _) => return self.seed(fix),
        };

        let distance_m = haversine_distance(&last, &fix);
        let delta_deg = coordinate_delta(&last, &fix);
        let elapsed = fix.timestamp - last.timestamp;
        let speed_kmh = if elapsed > 0.0 {
            distance_m / elapsed * 3.6
        } else {
            0.0
        };

        let mut reasons = Vec::new();
        if delta_deg < self.config.min_movement_threshold_deg {
            reasons.push(RejectReason::BelowMovementThreshold);
        }
        if speed_kmh > self.config.max_speed_kmh {
            reasons.push(RejectReason::ImplausibleSpeed);
        }
        let since_movement = fix.timestamp - self.state.last_movement_at;
        if since_movement > self.config.stationary_timeout_sec {
            self.state.is_stationary = true;
            if distance_m < STATIONARY_NOISE_RADIUS_M {
                reasons.push(RejectReason::StationaryNoise);
            }
        }

        self.push_window(fix);
        self.state.total_fixes += 1;

        if reasons.is_empty() {
            log::debug!(
                "GPS accepted ({:.8}, {:.8}): moved {:.2} m at {:.1} km/h",
                fix.latitude,
                fix.longitude,
                distance_m,
                speed_kmh
            );
            self.accept(fix);
            return FilterDecision {
                position: Some(fix),
                was_filtered: false,
                reasons,
                distance_m,
                speed_kmh,
            };
        }

        self.state.rejected_fixes += 1;
        self.blend_suppressed(&last);
        log::debug!(
            "GPS noise ({:.8}, {:.8}) rejected {:?}: {:.2} m, {:.1} km/h",
            fix.latitude,
            fix.longitude,
            reasons,
            distance_m,
            speed_kmh
        );

        FilterDecision {
            position: Some(last),
            was_filtered: true,
            reasons,
            distance_m,
            speed_kmh,
        }
    }

    fn seed(&mut self, fix: GeoFix) -> FilterDecision {
        self.push_window(fix);
        self.state.total_fixes += 1;
        self.accept(fix);
        log::info!(
            "GPS filter seeded at ({:.8}, {:.8})",
            fix.latitude,
            fix.longitude
        );
        FilterDecision {
            position: Some(fix),
            was_filtered: false,
            reasons: Vec::new(),
            distance_m: 0.0,
            speed_kmh: 0.0,
        }
    }

    fn accept(&mut self, fix: GeoFix) {
        self.state.last_significant = Some(fix);
        self.state.last_movement_at = fix.timestamp;
        self.state.is_stationary = false;
        self.state.believed_position = Some(fix);
        self.state.filtered_position = Some((fix.latitude, fix.longitude));
    }

    fn reject_invalid(&mut self, fix: GeoFix) -> FilterDecision {
        self.state.total_fixes += 1;
        self.state.invalid_fixes += 1;
        if self.config.enabled {
            self.state.rejected_fixes += 1;
        }

        if self.state.invalid_fixes == 1 {
            log::warn!(
                "Invalid GPS fix ({}, {}) ignored; further invalid fixes logged at debug",
                fix.latitude,
                fix.longitude
            );
        } else {
            log::debug!(
                "Invalid GPS fix #{} ({}, {}) ignored",
                self.state.invalid_fixes,
                fix.latitude,
                fix.longitude
            );
        }

        FilterDecision {
            position: self.state.believed_position,
            was_filtered: true,
            reasons: vec![RejectReason::InvalidFix],
            distance_m: 0.0,
            speed_kmh: 0.0,
        }
    }

    fn push_window(&mut self, fix: GeoFix) {
        self.state.recent_fixes.push_back(fix);
        while self.state.recent_fixes.len() > self.config.window_size {
            self.state.recent_fixes.pop_front();
        }
    }

    /// Weighted mix of the last significant fix and the window mean
    fn blend_suppressed(&mut self, last: &GeoFix) {
        let n = self.state.recent_fixes.len();
        if n < 2 {
            return;
        }
        let (sum_lat, sum_lon) = self
            .state
            .recent_fixes
            .iter()
            .fold((0.0, 0.0), |(lat, lon), f| (lat + f.latitude, lon + f.longitude));
        let avg_lat = sum_lat / n as f64;
        let avg_lon = sum_lon / n as f64;

        let factor = self.config.noise_suppression_factor;
        self.state.filtered_position = Some((
            last.latitude * factor + avg_lat * (1.0 - factor),
            last.longitude * factor + avg_lon * (1.0 - factor),
        ));
    }

    /// rejected / total, 0 before the first fix
    pub fn filter_ratio(&self) -> f64 {
        if self.state.total_fixes == 0 {
            return 0.0;
        }
        self.state.rejected_fixes as f64 / self.state.total_fixes as f64
    }

    pub fn noise_level(&self) -> NoiseLevel {
        NoiseLevel::from_ratio(self.filter_ratio())
    }

    /// Status relative to `now` (seconds, same clock as the fixes)
    pub fn status(&self, now: f64) -> Option<FilterStatus> {
        let last = self.state.last_significant?;
        Some(FilterStatus {
            last_significant: last,
            seconds_since_movement: (now - last.timestamp).max(0.0),
            is_stationary: self.state.is_stationary,
            window_len: self.state.recent_fixes.len(),
            window_size: self.config.window_size,
        })
    }

    pub fn believed_position(&self) -> Option<GeoFix> {
        self.state.believed_position
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        log::info!(
            "GPS noise filtering {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Flip the filter on/off, returns the new setting
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.config.enabled);
        self.config.enabled
    }
}
