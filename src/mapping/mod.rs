//! Geographic to planar projection for the two supported road networks.
pub mod affine;
pub mod progress;

pub use affine::AffineBoxProfile;
pub use progress::ProgressPathProfile;

use crate::types::{GeoFix, PlanarPosition};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Which preset profile a session runs with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    /// City-scale network, direct affine rescale
    WideArea,
    /// Single junction, averaged progress along one road
    Intersection,
}

impl Display for ProfileKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ProfileKind::WideArea => write!(f, "wide-area"),
            ProfileKind::Intersection => write!(f, "intersection"),
        }
    }
}

/// Projection selected once per session
#[derive(Clone, Debug, PartialEq)]
pub enum MappingProfile {
    AffineBox(AffineBoxProfile),
    ProgressPath(ProgressPathProfile),
}

impl MappingProfile {
    pub fn from_kind(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::WideArea => MappingProfile::AffineBox(AffineBoxProfile::wide_area()),
            ProfileKind::Intersection => {
                MappingProfile::ProgressPath(ProgressPathProfile::intersection())
            }
        }
    }

    pub fn kind(&self) -> ProfileKind {
        match self {
            MappingProfile::AffineBox(_) => ProfileKind::WideArea,
            MappingProfile::ProgressPath(_) => ProfileKind::Intersection,
        }
    }

    /// Forward projection; always returns a clamped, finite position
    pub fn geo_to_planar(&self, fix: &GeoFix) -> PlanarPosition {
        match self {
            MappingProfile::AffineBox(p) => p.geo_to_planar(fix),
            MappingProfile::ProgressPath(p) => p.geo_to_planar(fix),
        }
    }

    /// Inverse projection as (lat, lon); exact only for the affine box
    pub fn planar_to_geo(&self, position: &PlanarPosition) -> (f64, f64) {
        match self {
            MappingProfile::AffineBox(p) => p.planar_to_geo(position),
            MappingProfile::ProgressPath(p) => p.planar_to_geo(position),
        }
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self, MappingProfile::AffineBox(_))
    }

    pub fn is_within_safe_region(&self, position: &PlanarPosition) -> bool {
        match self {
            MappingProfile::AffineBox(p) => p.is_within_safe_region(position),
            MappingProfile::ProgressPath(p) => p.is_within_safe_region(position),
        }
    }

    pub fn nearest_safe_position(&self, position: &PlanarPosition) -> PlanarPosition {
        match self {
            MappingProfile::AffineBox(p) => p.nearest_safe_position(position),
            MappingProfile::ProgressPath(p) => p.nearest_safe_position(position),
        }
    }

    /// Road snap for the junction network; the wide-area box has no road
    /// model so it only pulls the point into its safe rectangle
    pub fn snap_to_road(&self, position: &PlanarPosition) -> PlanarPosition {
        match self {
            MappingProfile::AffineBox(p) => p.nearest_safe_position(position),
            MappingProfile::ProgressPath(p) => p.snap_to_road(position),
        }
    }

    /// Only the junction network has a signalled intersection to control
    pub fn has_signal_control(&self) -> bool {
        matches!(self, MappingProfile::ProgressPath(_))
    }

    /// Network centre: the junction, or the middle of the safe box
    pub fn junction(&self) -> PlanarPosition {
        match self {
            MappingProfile::AffineBox(p) => p.safe_rect().center().into(),
            MappingProfile::ProgressPath(p) => p.junction,
        }
    }

    /// Position used when a fix cannot be projected at all
    pub fn fallback_position(&self) -> PlanarPosition {
        match self {
            MappingProfile::AffineBox(p) => p.safe_rect().center().into(),
            MappingProfile::ProgressPath(p) => p.fallback,
        }
    }
}

/// Linear map of `value` from [src_min, src_max] to [dst_min, dst_max].
/// `None` when the source span is empty or any input is not finite.
pub(crate) fn rescale(value: f64, src_min: f64, src_max: f64, dst_min: f64, dst_max: f64) -> Option<f64> {
    let span = src_max - src_min;
    if !value.is_finite() || !span.is_finite() || span.abs() < f64::EPSILON {
        return None;
    }
    Some((value - src_min) / span * (dst_max - dst_min) + dst_min)
}

/// Clamp that tolerates an inverted range by collapsing to its midpoint
pub(crate) fn clamp_axis(value: f64, lo: f64, hi: f64) -> f64 {
    if lo > hi {
        return (lo + hi) / 2.0;
    }
    value.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_kind_round_trip() {
        for kind in [ProfileKind::WideArea, ProfileKind::Intersection] {
            assert_eq!(MappingProfile::from_kind(kind).kind(), kind);
        }
        assert_eq!(ProfileKind::WideArea.to_string(), "wide-area");
        let parsed: ProfileKind = serde_json::from_str("\"intersection\"").unwrap();
        assert_eq!(parsed, ProfileKind::Intersection);
    }

    #[test]
    fn test_only_affine_is_lossless() {
        assert!(MappingProfile::from_kind(ProfileKind::WideArea).is_lossless());
        assert!(!MappingProfile::from_kind(ProfileKind::Intersection).is_lossless());
    }

    #[test]
    fn test_rescale_degenerate() {
        assert_eq!(rescale(1.0, 2.0, 2.0, 0.0, 10.0), None);
        assert_eq!(rescale(f64::NAN, 0.0, 1.0, 0.0, 10.0), None);
        assert_eq!(rescale(0.5, 0.0, 1.0, 0.0, 10.0), Some(5.0));
    }

    #[test]
    fn test_clamp_axis_inverted_range() {
        assert_eq!(clamp_axis(3.0, 10.0, 0.0), 5.0);
        assert_eq!(clamp_axis(-1.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_snap_to_road_per_profile() {
        let junction = MappingProfile::from_kind(ProfileKind::Intersection);
        let snapped = junction.snap_to_road(&PlanarPosition::new(505.0, 700.0));
        assert_eq!(snapped, PlanarPosition::new(510.0, 700.0));

        let wide = MappingProfile::from_kind(ProfileKind::WideArea);
        let pulled = wide.snap_to_road(&PlanarPosition::new(0.0, 0.0));
        assert_eq!(pulled, PlanarPosition::new(100.0, 100.0));
    }

    #[test]
    fn test_junction_and_fallback() {
        let junction = MappingProfile::from_kind(ProfileKind::Intersection);
        assert_eq!(junction.junction(), PlanarPosition::new(510.0, 510.0));
        assert_eq!(junction.fallback_position(), PlanarPosition::new(510.0, 510.0));

        let wide = MappingProfile::from_kind(ProfileKind::WideArea);
        let centre = wide.junction();
        assert!((centre.x - 10604.93 / 2.0).abs() < 1e-9);
        assert!(wide.is_within_safe_region(&wide.fallback_position()));
        assert!(junction.has_signal_control());
        assert!(!wide.has_signal_control());
    }
}
