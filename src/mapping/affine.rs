use super::{clamp_axis, rescale};
use crate::types::{GeoFix, PlanarPosition};
use geo::{coord, Rect};

/// Direct per-axis linear rescale of a geographic box onto a planar box.
///
/// x follows longitude, y follows latitude. Output is kept `margin` meters
/// inside the planar box so the vehicle never lands on the network edge.
#[derive(Clone, Debug, PartialEq)]
pub struct AffineBoxProfile {
    /// x = longitude, y = latitude
    pub geo_bounds: Rect<f64>,
    pub planar_bounds: Rect<f64>,
    pub margin: f64,
}

impl AffineBoxProfile {
    /// Wide-area road network (UTM-projected export, ~10.6 x 9.9 km)
    pub fn wide_area() -> Self {
        AffineBoxProfile {
            geo_bounds: Rect::new(
                coord! { x: 30.494791, y: 37.406898 },
                coord! { x: 30.614099, y: 37.515896 },
            ),
            planar_bounds: Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10604.93, y: 9947.54 }),
            margin: 100.0,
        }
    }

    /// Rectangle every mapped point is clamped into
    pub fn safe_rect(&self) -> Rect<f64> {
        let min = self.planar_bounds.min();
        let max = self.planar_bounds.max();
        Rect::new(
            coord! { x: min.x + self.margin, y: min.y + self.margin },
            coord! { x: max.x - self.margin, y: max.y - self.margin },
        )
    }

    pub fn geo_to_planar(&self, fix: &GeoFix) -> PlanarPosition {
        let geo_min = self.geo_bounds.min();
        let geo_max = self.geo_bounds.max();
        let min = self.planar_bounds.min();
        let max = self.planar_bounds.max();

        // Degenerate axis or garbage input falls back to the axis midpoint
        let x = rescale(fix.longitude, geo_min.x, geo_max.x, min.x, max.x)
            .unwrap_or((min.x + max.x) / 2.0);
        let y = rescale(fix.latitude, geo_min.y, geo_max.y, min.y, max.y)
            .unwrap_or((min.y + max.y) / 2.0);

        self.clamp(PlanarPosition::new(x, y))
    }

    /// Exact algebraic inverse of the forward rescale, returns (lat, lon)
    pub fn planar_to_geo(&self, p: &PlanarPosition) -> (f64, f64) {
        let geo_min = self.geo_bounds.min();
        let geo_max = self.geo_bounds.max();
        let min = self.planar_bounds.min();
        let max = self.planar_bounds.max();

        let lon = rescale(p.x, min.x, max.x, geo_min.x, geo_max.x)
            .unwrap_or((geo_min.x + geo_max.x) / 2.0);
        let lat = rescale(p.y, min.y, max.y, geo_min.y, geo_max.y)
            .unwrap_or((geo_min.y + geo_max.y) / 2.0);
        (lat, lon)
    }

    pub fn is_within_safe_region(&self, p: &PlanarPosition) -> bool {
        let safe = self.safe_rect();
        p.x.is_finite()
            && p.y.is_finite()
            && p.x >= safe.min().x
            && p.x <= safe.max().x
            && p.y >= safe.min().y
            && p.y <= safe.max().y
    }

    pub fn nearest_safe_position(&self, p: &PlanarPosition) -> PlanarPosition {
        if !p.x.is_finite() || !p.y.is_finite() {
            return self.safe_rect().center().into();
        }
        self.clamp(*p)
    }

    fn clamp(&self, p: PlanarPosition) -> PlanarPosition {
        let safe = self.safe_rect();
        PlanarPosition::new(
            clamp_axis(p.x, safe.min().x, safe.max().x),
            clamp_axis(p.y, safe.min().y, safe.max().y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_center_maps_to_center() {
        let profile = AffineBoxProfile::wide_area();
        let center = profile.geo_bounds.center();
        let p = profile.geo_to_planar(&GeoFix::new(center.y, center.x, 0.0));
        assert_relative_eq!(p.x, 10604.93 / 2.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 9947.54 / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_corners_clamped_to_margin() {
        let profile = AffineBoxProfile::wide_area();
        let sw = profile.geo_to_planar(&GeoFix::new(37.406898, 30.494791, 0.0));
        assert_eq!(sw, PlanarPosition::new(100.0, 100.0));

        let far_ne = profile.geo_to_planar(&GeoFix::new(38.0, 31.0, 0.0));
        assert_relative_eq!(far_ne.x, 10504.93, epsilon = 1e-9);
        assert_relative_eq!(far_ne.y, 9847.54, epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip() {
        let profile = AffineBoxProfile::wide_area();
        let fix = GeoFix::new(37.45, 30.55, 0.0);
        let planar = profile.geo_to_planar(&fix);
        let (lat, lon) = profile.planar_to_geo(&planar);
        assert_relative_eq!(lat, fix.latitude, epsilon = 1e-9);
        assert_relative_eq!(lon, fix.longitude, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_axis_uses_midpoint() {
        let profile = AffineBoxProfile {
            geo_bounds: Rect::new(coord! { x: 30.5, y: 37.4 }, coord! { x: 30.5, y: 37.5 }),
            ..AffineBoxProfile::wide_area()
        };
        let p = profile.geo_to_planar(&GeoFix::new(37.45, 30.7, 0.0));
        assert_relative_eq!(p.x, 10604.93 / 2.0, epsilon = 1e-9);
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    #[test]
    fn test_safe_region_and_nearest() {
        let profile = AffineBoxProfile::wide_area();
        assert!(profile.is_within_safe_region(&PlanarPosition::new(5000.0, 5000.0)));
        assert!(!profile.is_within_safe_region(&PlanarPosition::new(50.0, 5000.0)));
        assert!(!profile.is_within_safe_region(&PlanarPosition::new(f64::NAN, 5000.0)));

        let nearest = profile.nearest_safe_position(&PlanarPosition::new(-20.0, 12000.0));
        assert_eq!(nearest, PlanarPosition::new(100.0, 9847.54));
        assert!(profile.is_within_safe_region(&nearest));
    }
}
