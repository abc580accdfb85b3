use super::{clamp_axis, rescale};
use crate::types::{GeoFix, PlanarPosition};
use geo::{coord, Rect};

/// Collapses a few-meter GPS track onto a single straight road segment.
///
/// Latitude and longitude progress through the reference box are averaged
/// into one scalar in [0, 1], which is then laid out along `start_x..end_x`
/// at a fixed road centre `road_y`. Scaling each axis independently over a
/// span this small amplifies receiver noise into large planar jumps; the
/// single progress value keeps the traversal monotonic.
///
/// The inverse is lossy: it returns the point on the box diagonal at the
/// recovered progress, not the input fix.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressPathProfile {
    /// x = longitude, y = latitude
    pub geo_bounds: Rect<f64>,
    pub start_x: f64,
    pub end_x: f64,
    pub road_y: f64,
    /// Clamp applied to every mapped point
    pub safe_rect: Rect<f64>,
    /// Extent of the simulated network
    pub world: Rect<f64>,
    pub junction: PlanarPosition,
    pub road_half_width: f64,
    /// Used when the reference span collapses or input is not finite
    pub fallback: PlanarPosition,
}

impl ProgressPathProfile {
    /// Single four-way junction network (1020 x 1020 m, centre 510, 510)
    pub fn intersection() -> Self {
        ProgressPathProfile {
            geo_bounds: Rect::new(
                coord! { x: 30.67373167, y: 36.91973000 },
                coord! { x: 30.67379000, y: 36.91979667 },
            ),
            start_x: 200.0,
            end_x: 800.0,
            road_y: 510.0,
            safe_rect: Rect::new(coord! { x: 150.0, y: 505.0 }, coord! { x: 850.0, y: 515.0 }),
            world: Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1020.0, y: 1020.0 }),
            junction: PlanarPosition::new(510.0, 510.0),
            road_half_width: 5.0,
            fallback: PlanarPosition::new(510.0, 510.0),
        }
    }

    /// Averaged lat/lon progress clamped to [0, 1]; `None` for a degenerate box
    pub fn progress(&self, fix: &GeoFix) -> Option<f64> {
        let min = self.geo_bounds.min();
        let max = self.geo_bounds.max();
        let lat_progress = rescale(fix.latitude, min.y, max.y, 0.0, 1.0)?;
        let lon_progress = rescale(fix.longitude, min.x, max.x, 0.0, 1.0)?;
        Some(((lat_progress + lon_progress) / 2.0).clamp(0.0, 1.0))
    }

    pub fn geo_to_planar(&self, fix: &GeoFix) -> PlanarPosition {
        let raw = match self.progress(fix) {
            Some(progress) => PlanarPosition::new(
                self.start_x + progress * (self.end_x - self.start_x),
                self.road_y,
            ),
            None => self.fallback,
        };
        self.clamp(raw)
    }

    /// Lossy inverse, returns (lat, lon) on the reference diagonal
    pub fn planar_to_geo(&self, p: &PlanarPosition) -> (f64, f64) {
        let progress = rescale(p.x, self.start_x, self.end_x, 0.0, 1.0)
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(0.5);
        let min = self.geo_bounds.min();
        let max = self.geo_bounds.max();
        (
            min.y + progress * (max.y - min.y),
            min.x + progress * (max.x - min.x),
        )
    }

    /// Inside the network and on either road corridor through the junction
    pub fn is_within_safe_region(&self, p: &PlanarPosition) -> bool {
        if !p.x.is_finite() || !p.y.is_finite() {
            return false;
        }
        let world_min = self.world.min();
        let world_max = self.world.max();
        if p.x < world_min.x || p.x > world_max.x || p.y < world_min.y || p.y > world_max.y {
            return false;
        }
        self.on_road(p)
    }

    pub fn nearest_safe_position(&self, p: &PlanarPosition) -> PlanarPosition {
        if !p.x.is_finite() || !p.y.is_finite() {
            return self.fallback;
        }
        let world_min = self.world.min();
        let world_max = self.world.max();
        let inside = PlanarPosition::new(
            clamp_axis(p.x, world_min.x, world_max.x),
            clamp_axis(p.y, world_min.y, world_max.y),
        );
        if self.on_road(&inside) {
            return inside;
        }
        self.snap_to_road(&inside)
    }

    /// Move onto the centre line of whichever road is closer
    pub fn snap_to_road(&self, p: &PlanarPosition) -> PlanarPosition {
        let dx = (p.x - self.junction.x).abs();
        let dy = (p.y - self.junction.y).abs();
        if dx <= dy {
            PlanarPosition::new(self.junction.x, p.y)
        } else {
            PlanarPosition::new(p.x, self.junction.y)
        }
    }

    fn on_road(&self, p: &PlanarPosition) -> bool {
        (p.y - self.junction.y).abs() <= self.road_half_width
            || (p.x - self.junction.x).abs() <= self.road_half_width
    }

    fn clamp(&self, p: PlanarPosition) -> PlanarPosition {
        let min = self.safe_rect.min();
        let max = self.safe_rect.max();
        PlanarPosition::new(clamp_axis(p.x, min.x, max.x), clamp_axis(p.y, min.y, max.y))
    }
}
