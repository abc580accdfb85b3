pub mod controller;
pub mod sink;

pub use controller::{ControlState, JunctionPhase, SignalControlStatus, SignalController, Transition};
pub use sink::{LogSink, SignalKind, SignalRequest, SignalSink};
