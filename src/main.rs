use ambulance_tracker_rs::signal::{LogSink, SignalRequest, SignalSink};
use ambulance_tracker_rs::{
    DirectPositioner, GeoFix, PipelineConfig, ProfileKind, Session, SessionStatus, TickReport,
};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "ambulance_tracker")]
#[command(about = "Replay a GPS fix log through the ambulance junction-priority pipeline", long_about = None)]
struct Args {
    /// JSON array of fixes ({latitude, longitude, timestamp}), optionally .gz
    #[arg(value_name = "FIXES")]
    fixes: PathBuf,

    /// Pipeline config JSON; CLI flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Geo -> planar mapping profile
    #[arg(long, value_enum)]
    profile: Option<ProfileKind>,

    /// Pass every fix through unfiltered
    #[arg(long, default_value_t = false)]
    no_filter: bool,

    /// Minimum coordinate change in degrees
    #[arg(long)]
    min_movement: Option<f64>,

    /// Maximum plausible speed (km/h)
    #[arg(long)]
    max_speed: Option<f64>,

    /// Smoothing window length
    #[arg(long)]
    window_size: Option<usize>,

    /// Junction priority radius (meters); release happens at twice this
    #[arg(long)]
    enter_radius: Option<f64>,

    #[arg(long)]
    vehicle_id: Option<String>,

    /// Output directory
    #[arg(long, default_value = "ambulance_sessions")]
    output_dir: PathBuf,
}

fn load_fixes(path: &Path) -> Result<Vec<GeoFix>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    if path.extension().map(|e| e == "gz").unwrap_or(false) {
        let reader = BufReader::new(GzDecoder::new(file));
        Ok(serde_json::from_reader(reader)?)
    } else {
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(profile) = args.profile {
        config.profile = profile;
    }
    if args.no_filter {
        config.filter.enabled = false;
    }
    if let Some(v) = args.min_movement {
        config.filter.min_movement_threshold_deg = v;
    }
    if let Some(v) = args.max_speed {
        config.filter.max_speed_kmh = v;
    }
    if let Some(v) = args.window_size {
        config.filter.window_size = v;
    }
    if let Some(v) = args.enter_radius {
        config.signal.enter_radius = v;
    }
    if let Some(id) = &args.vehicle_id {
        config.vehicle_id = id.clone();
    }
    Ok(config)
}

/// Logs every request and keeps a copy for the session output
struct RecordingSink {
    log: LogSink,
    requests: Vec<SignalRequest>,
}

impl SignalSink for RecordingSink {
    fn send(&mut self, request: SignalRequest) {
        self.log.send(request.clone());
        self.requests.push(request);
    }
}

fn log_tick(report: &TickReport) {
    let placed = match (report.step, report.placed) {
        (Some(step), Some(p)) => format!("step {} at ({:.2}, {:.2})", step, p.x, p.y),
        _ => "not placed".to_string(),
    };
    if report.decision.was_filtered {
        log::debug!(
            "[{:.2}] filtered {:?}, {}",
            report.fix.timestamp,
            report.decision.reasons,
            placed
        );
    } else {
        log::debug!("[{:.2}] accepted, {}", report.fix.timestamp, placed);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = build_config(&args)?;
    let fixes = load_fixes(&args.fixes)?;
    log::info!("Loaded {} fixes from {}", fixes.len(), args.fixes.display());

    let mut session = Session::new(config)?;
    let mut positioner = DirectPositioner;
    let mut sink = RecordingSink {
        log: LogSink,
        requests: Vec::new(),
    };

    for (i, fix) in fixes.iter().enumerate() {
        let report = session.tick(*fix, &mut positioner, &mut sink);
        log_tick(&report);
        if (i + 1) % 100 == 0 {
            log::info!("{}", SessionStatus::capture(&session, fix.timestamp).headline());
        }
    }

    let now = fixes.last().map(|f| f.timestamp).unwrap_or(0.0);
    let status = SessionStatus::capture(&session, now);
    log::info!("{}", status.headline());
    log::info!("\n{}", session.tracker().format_table(session.vehicle_id()));

    fs::create_dir_all(&args.output_dir)?;
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let track_path = args.output_dir.join(format!("track_{}.json", stamp));
    let signals_path = args.output_dir.join(format!("signals_{}.json", stamp));
    let status_path = args.output_dir.join(format!("status_{}.json", stamp));

    fs::write(
        &track_path,
        serde_json::to_string_pretty(&session.tracker().export())?,
    )?;
    fs::write(&signals_path, serde_json::to_string_pretty(&sink.requests)?)?;
    status.save(&status_path)?;

    log::info!(
        "Wrote {}, {} and {}",
        track_path.display(),
        signals_path.display(),
        status_path.display()
    );
    Ok(())
}
