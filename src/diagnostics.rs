use crate::filters::{FilterStatus, NoiseLevel};
use crate::mapping::ProfileKind;
use crate::session::Session;
use crate::signal::{JunctionPhase, SignalControlStatus};
use crate::tracker::TrackSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Point-in-time snapshot of a session, written as JSON for dashboards
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionStatus {
    pub session_id: String,
    /// RFC 3339
    pub started_at: String,
    /// Seconds, same clock as the fixes
    pub timestamp: f64,
    pub vehicle_id: String,
    pub profile: ProfileKind,
    pub steps: u64,
    pub mapped_count: u64,
    pub placement_failures: u64,
    // Filter
    pub filter_enabled: bool,
    pub total_fixes: u64,
    pub rejected_fixes: u64,
    pub invalid_fixes: u64,
    pub filter_ratio: f64,
    pub noise_level: NoiseLevel,
    pub filter: Option<FilterStatus>,
    // Signal control
    pub control: BTreeMap<String, SignalControlStatus>,
    pub any_active: bool,
    pub recommended_phase: JunctionPhase,
    // Track
    pub track: Option<TrackSummary>,
}

impl SessionStatus {
    pub fn capture(session: &Session, now: f64) -> Self {
        let filter = session.filter();
        let state = filter.state();
        let controller = session.controller();

        Self {
            session_id: session.session_id().to_string(),
            started_at: session.started_at().to_rfc3339(),
            timestamp: now,
            vehicle_id: session.vehicle_id().to_string(),
            profile: session.profile().kind(),
            steps: session.steps(),
            mapped_count: session.mapped_count(),
            placement_failures: session.placement_failures(),
            filter_enabled: filter.is_enabled(),
            total_fixes: state.total_fixes,
            rejected_fixes: state.rejected_fixes,
            invalid_fixes: state.invalid_fixes,
            filter_ratio: filter.filter_ratio(),
            noise_level: filter.noise_level(),
            filter: filter.status(now),
            control: controller.statuses().clone(),
            any_active: controller.any_active(),
            recommended_phase: controller.recommended_phase(),
            track: session.tracker().summary(session.vehicle_id()),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// One-line summary for periodic logging
    pub fn headline(&self) -> String {
        format!(
            "steps {} | fixes {} (rejected {}, {:.1}% {:?}) | phase {:?}",
            self.steps,
            self.total_fixes,
            self.rejected_fixes,
            self.filter_ratio * 100.0,
            self.noise_level,
            self.recommended_phase
        )
    }
}
