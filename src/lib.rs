pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filters;
pub mod geo_math;
pub mod handoff;
pub mod mapping;
pub mod session;
pub mod signal;
pub mod tracker;
pub mod types;

pub use config::{FilterConfig, PipelineConfig, SignalConfig};
pub use diagnostics::SessionStatus;
pub use error::{ConfigError, PlacementError};
pub use mapping::{MappingProfile, ProfileKind};
pub use session::{DirectPositioner, Positioner, Session, TickReport};
pub use types::{GeoFix, PlanarPosition};
