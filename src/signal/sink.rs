use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    GrantPriority,
    ResumeNormal,
    VehiclePassing,
}

impl Display for SignalKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            SignalKind::GrantPriority => write!(f, "GRANT_PRIORITY"),
            SignalKind::ResumeNormal => write!(f, "RESUME_NORMAL"),
            SignalKind::VehiclePassing => write!(f, "VEHICLE_PASSING"),
        }
    }
}

/// Request for the external traffic-light actuator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalRequest {
    pub kind: SignalKind,
    pub vehicle_id: String,
    /// Planar distance to the junction when the request was raised
    pub distance_m: f64,
}

/// Fire-and-forget delivery of signal requests.
///
/// Implementations must not block the tick loop; delivery, retries and
/// timeouts belong to whatever sits behind the sink.
pub trait SignalSink {
    fn send(&mut self, request: SignalRequest);
}

/// Writes each request to the log and nothing else
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl SignalSink for LogSink {
    fn send(&mut self, request: SignalRequest) {
        match request.kind {
            SignalKind::VehiclePassing => log::debug!(
                "[SIGNAL] {} {} at {:.1} m",
                request.kind,
                request.vehicle_id,
                request.distance_m
            ),
            _ => log::info!(
                "[SIGNAL] {} {} at {:.1} m",
                request.kind,
                request.vehicle_id,
                request.distance_m
            ),
        }
    }
}

/// Records requests in order, for replay output and tests
impl SignalSink for Vec<SignalRequest> {
    fn send(&mut self, request: SignalRequest) {
        self.push(request);
    }
}

/// Hands requests to a transport thread; a full or closed channel drops them
impl SignalSink for crossbeam::channel::Sender<SignalRequest> {
    fn send(&mut self, request: SignalRequest) {
        if let Err(e) = self.try_send(request) {
            let full = e.is_full();
            let dropped = e.into_inner();
            log::warn!(
                "[SIGNAL] dropped {} for {} (actuator channel {})",
                dropped.kind,
                dropped.vehicle_id,
                if full { "full" } else { "closed" }
            );
        }
    }
}
