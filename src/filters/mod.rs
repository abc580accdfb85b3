pub mod noise;

pub use noise::{FilterDecision, FilterState, FilterStatus, NoiseFilter, NoiseLevel, RejectReason};
