use ambulance_tracker_rs::config::SignalConfig;
use ambulance_tracker_rs::filters::NoiseFilter;
use ambulance_tracker_rs::handoff::fix_channel;
use ambulance_tracker_rs::mapping::{AffineBoxProfile, MappingProfile};
use ambulance_tracker_rs::signal::{
    ControlState, JunctionPhase, SignalController, SignalKind, SignalRequest, Transition,
};
use ambulance_tracker_rs::{
    DirectPositioner, FilterConfig, GeoFix, PipelineConfig, PlanarPosition, ProfileKind, Session,
    SessionStatus,
};
use approx::assert_relative_eq;
use proptest::prelude::*;
use std::thread;

const LAT_START: f64 = 36.91973000;
const LAT_END: f64 = 36.91979667;
const LON_START: f64 = 30.67373167;
const LON_END: f64 = 30.67379000;

fn along_road(progress: f64, t: f64) -> GeoFix {
    GeoFix::new(
        LAT_START + progress * (LAT_END - LAT_START),
        LON_START + progress * (LON_END - LON_START),
        t,
    )
}

fn kinds(requests: &[SignalRequest]) -> Vec<SignalKind> {
    requests.iter().map(|r| r.kind).collect()
}

#[test]
fn test_drive_through_junction() {
    let mut session = Session::new(PipelineConfig::default()).unwrap();
    let mut sink: Vec<SignalRequest> = Vec::new();

    let mut phases = Vec::new();
    for i in 0..=10 {
        let report = session.tick(along_road(i as f64 / 10.0, i as f64), &mut DirectPositioner, &mut sink);
        assert!(!report.decision.was_filtered, "fix {} filtered", i);
        phases.push(report.phase);
    }

    // x runs 200 -> 800 in 60 m steps; priority from x=440 until past x=660
    assert_eq!(
        kinds(&sink),
        vec![
            SignalKind::GrantPriority,
            SignalKind::VehiclePassing,
            SignalKind::VehiclePassing,
            SignalKind::ResumeNormal,
        ]
    );
    assert_eq!(phases[3], JunctionPhase::AllRed);
    assert_eq!(phases[4], JunctionPhase::PriorityGreen);
    assert_eq!(phases[7], JunctionPhase::PriorityGreen);
    assert_eq!(phases[8], JunctionPhase::AllRed);

    let track = session.tracker().history("ambulance_gps_0");
    assert_eq!(track.len(), 11);
    assert_relative_eq!(track[0].planar.x, 200.0, epsilon = 1e-6);
    assert_relative_eq!(track[10].planar.x, 800.0, epsilon = 1e-6);
    assert!(track.iter().all(|r| r.planar.y == 510.0));

    let status = SessionStatus::capture(&session, 10.0);
    assert_eq!(status.rejected_fixes, 0);
    assert_eq!(status.control["ambulance_gps_0"].grants, 1);
    assert_eq!(status.control["ambulance_gps_0"].releases, 1);
}

#[test]
fn test_parked_jitter_holds_position() {
    let mut session = Session::new(PipelineConfig::default()).unwrap();
    let mut sink: Vec<SignalRequest> = Vec::new();

    let first = session.tick(along_road(0.0, 0.0), &mut DirectPositioner, &mut sink);
    for i in 1..=20 {
        // ~0.1 m of wobble around the parked position
        let wobble = if i % 2 == 0 { 1e-6 } else { -1e-6 };
        let fix = GeoFix::new(LAT_START + wobble, LON_START, i as f64 * 0.5);
        let report = session.tick(fix, &mut DirectPositioner, &mut sink);
        assert!(report.decision.was_filtered);
        assert_eq!(report.placed, first.placed);
    }

    assert_eq!(session.filter().state().rejected_fixes, 20);
    assert!(session.filter().state().is_stationary);
    assert!(sink.is_empty());
}

#[test]
fn test_gps_spike_is_ignored() {
    let mut session = Session::new(PipelineConfig::default()).unwrap();
    let mut sink: Vec<SignalRequest> = Vec::new();

    session.tick(along_road(0.0, 0.0), &mut DirectPositioner, &mut sink);
    // Jump to the far end of the road in 0.1 s
    let spike = session.tick(along_road(1.0, 0.1), &mut DirectPositioner, &mut sink);
    assert!(spike.decision.was_filtered);
    assert_relative_eq!(spike.placed.unwrap().x, 200.0, epsilon = 1e-6);
    assert!(sink.is_empty());
}

#[test]
fn test_unfiltered_session_passes_everything() {
    let mut config = PipelineConfig::default();
    config.filter.enabled = false;
    let mut session = Session::new(config).unwrap();
    let mut sink: Vec<SignalRequest> = Vec::new();

    for i in 0..5 {
        let report = session.tick(along_road(0.0, i as f64), &mut DirectPositioner, &mut sink);
        assert!(!report.decision.was_filtered);
    }
    assert_eq!(session.filter().filter_ratio(), 0.0);
}

#[test]
fn test_wide_area_session() {
    let config = PipelineConfig {
        profile: ProfileKind::WideArea,
        ..PipelineConfig::default()
    };
    let mut session = Session::new(config).unwrap();
    let mut sink: Vec<SignalRequest> = Vec::new();

    // Far outside the box: clamped to the margin corner
    let report = session.tick(GeoFix::new(0.0, 0.0, 0.0), &mut DirectPositioner, &mut sink);
    let placed = report.placed.unwrap();
    assert_eq!(placed, PlanarPosition::new(100.0, 100.0));
    assert!(session.profile().is_within_safe_region(&placed));
    assert!(report.transition.is_none());
    assert!(sink.is_empty());
}

#[test]
fn test_handoff_feeds_session() {
    let (mut tx, rx) = fix_channel(32);
    let producer = thread::spawn(move || {
        for i in 0..=10 {
            tx.offer(along_road(i as f64 / 10.0, i as f64));
        }
    });
    producer.join().unwrap();

    let mut session = Session::new(PipelineConfig::default()).unwrap();
    let mut sink: Vec<SignalRequest> = Vec::new();
    for fix in rx.drain() {
        session.tick(fix, &mut DirectPositioner, &mut sink);
    }
    assert_eq!(rx.dropped(), 0);
    assert_eq!(session.steps(), 11);
    assert_eq!(session.controller().state("ambulance_gps_0"), ControlState::Inactive);
    assert_eq!(sink.len(), 4);
}

proptest! {
    #[test]
    fn prop_filter_ratio_bounded(
        steps in prop::collection::vec((-1e-4f64..1e-4, -1e-4f64..1e-4, 0.0f64..3.0), 1..60)
    ) {
        let mut filter = NoiseFilter::new(FilterConfig::default());
        let mut t = 0.0;
        for (dlat, dlon, dt) in steps {
            t += dt;
            filter.evaluate(GeoFix::new(LAT_START + dlat, LON_START + dlon, t));
            let ratio = filter.filter_ratio();
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
    }

    #[test]
    fn prop_wide_area_output_is_safe(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
        let profile = MappingProfile::from_kind(ProfileKind::WideArea);
        let p = profile.geo_to_planar(&GeoFix::new(lat, lon, 0.0));
        prop_assert!(profile.is_within_safe_region(&p));
    }

    #[test]
    fn prop_intersection_output_is_safe(lat in 36.0f64..38.0, lon in 30.0f64..31.0) {
        let profile = MappingProfile::from_kind(ProfileKind::Intersection);
        let p = profile.geo_to_planar(&GeoFix::new(lat, lon, 0.0));
        prop_assert!(profile.is_within_safe_region(&p));
        prop_assert!((150.0..=850.0).contains(&p.x));
    }

    #[test]
    fn prop_progress_is_monotonic(a in -0.5f64..1.5, b in -0.5f64..1.5) {
        let profile = MappingProfile::from_kind(ProfileKind::Intersection);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let x_lo = profile.geo_to_planar(&along_road(lo, 0.0)).x;
        let x_hi = profile.geo_to_planar(&along_road(hi, 0.0)).x;
        prop_assert!(x_lo <= x_hi + 1e-9);
    }

    #[test]
    fn prop_affine_round_trip(fx in 0.02f64..0.98, fy in 0.02f64..0.98) {
        let profile = AffineBoxProfile::wide_area();
        let min = profile.geo_bounds.min();
        let max = profile.geo_bounds.max();
        let lon = min.x + fx * (max.x - min.x);
        let lat = min.y + fy * (max.y - min.y);

        let p = profile.geo_to_planar(&GeoFix::new(lat, lon, 0.0));
        let (lat_back, lon_back) = profile.planar_to_geo(&p);
        prop_assert!((lat_back - lat).abs() < 1e-9);
        prop_assert!((lon_back - lon).abs() < 1e-9);
    }

    #[test]
    fn prop_controller_hysteresis_bounds(distances in prop::collection::vec(0.0f64..400.0, 1..80)) {
        let config = SignalConfig::default();
        let enter = config.enter_radius;
        let exit = config.exit_radius();
        let mut controller = SignalController::new(config, PlanarPosition::new(510.0, 510.0));
        let mut sink: Vec<SignalRequest> = Vec::new();

        for d in distances {
            let position = PlanarPosition::new(510.0 + d, 510.0);
            let transition = controller.evaluate("amb", &position, &mut sink);
            if transition == Transition::Entered {
                prop_assert!(d <= enter);
            }
            if d > exit {
                prop_assert_eq!(controller.state("amb"), ControlState::Inactive);
            }
            if d <= enter {
                prop_assert_eq!(controller.state("amb"), ControlState::Active);
            }
        }
    }
}
