use crate::geo_math::{initial_bearing, planar_distance};
use crate::types::{GeoFix, PlanarPosition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub step: u64,
    pub planar: PlanarPosition,
    pub source: GeoFix,
}

/// First/last range summary of one vehicle's track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub count: usize,
    pub first: PositionRecord,
    pub last: PositionRecord,
    /// Straight-line planar distance first -> last, not path length
    pub total_planar_distance: f64,
    pub geo_bearing_deg: f64,
}

/// Flattened row for file/stream export
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub vehicle_id: String,
    pub step: u64,
    pub planar_x: f64,
    pub planar_y: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Append-only history of placed positions per vehicle
#[derive(Clone, Debug, Default)]
pub struct PositionTracker {
    history: BTreeMap<String, Vec<PositionRecord>>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, vehicle_id: &str, step: u64, planar: PlanarPosition, source: GeoFix) {
        self.history
            .entry(vehicle_id.to_string())
            .or_default()
            .push(PositionRecord {
                step,
                planar,
                source,
            });
    }

    pub fn history(&self, vehicle_id: &str) -> &[PositionRecord] {
        self.history
            .get(vehicle_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn vehicle_ids(&self) -> impl Iterator<Item = &str> {
        self.history.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.history.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self, vehicle_id: &str) -> Option<TrackSummary> {
        let records = self.history.get(vehicle_id)?;
        let first = records.first()?;
        let last = records.last()?;
        Some(TrackSummary {
            count: records.len(),
            first: first.clone(),
            last: last.clone(),
            total_planar_distance: planar_distance(&first.planar, &last.planar),
            geo_bearing_deg: initial_bearing(&first.source, &last.source),
        })
    }

    /// Rows ordered by vehicle id, then by insertion
    pub fn export(&self) -> Vec<ExportRow> {
        self.history
            .iter()
            .flat_map(|(vehicle_id, records)| {
                records.iter().map(move |r| ExportRow {
                    vehicle_id: vehicle_id.clone(),
                    step: r.step,
                    planar_x: round_to(r.planar.x, 2),
                    planar_y: round_to(r.planar.y, 2),
                    latitude: round_to(r.source.latitude, 6),
                    longitude: round_to(r.source.longitude, 6),
                })
            })
            .collect()
    }

    /// Fixed-width text table of one vehicle's track, for logs
    pub fn format_table(&self, vehicle_id: &str) -> String {
        let mut out = String::new();
        let records = self.history(vehicle_id);
        if records.is_empty() {
            let _ = writeln!(out, "{}: no positions recorded", vehicle_id);
            return out;
        }

        let _ = writeln!(out, "{}:", vehicle_id);
        let _ = writeln!(
            out,
            "{:<6} {:>10} {:>10} {:>12} {:>12}",
            "step", "x", "y", "lat", "lon"
        );
        for r in records {
            let _ = writeln!(
                out,
                "{:<6} {:>10.2} {:>10.2} {:>12.6} {:>12.6}",
                r.step, r.planar.x, r.planar.y, r.source.latitude, r.source.longitude
            );
        }
        if let Some(summary) = self.summary(vehicle_id) {
            let _ = writeln!(
                out,
                "{} steps, ({:.2}, {:.2}) -> ({:.2}, {:.2}), range {:.2} m",
                summary.count,
                summary.first.planar.x,
                summary.first.planar.y,
                summary.last.planar.x,
                summary.last.planar.y,
                summary.total_planar_distance
            );
        }
        out
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
