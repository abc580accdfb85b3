use crate::error::ConfigError;
use crate::mapping::ProfileKind;
use crate::types::PlanarPosition;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// GPS noise filter parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub enabled: bool,
    /// ~0.5 m at mid latitudes
    pub min_movement_threshold_deg: f64,
    pub max_speed_kmh: f64,
    pub window_size: usize,
    pub stationary_timeout_sec: f64,
    /// Weight of the last significant fix in the blended diagnostic position
    pub noise_suppression_factor: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_movement_threshold_deg: 0.000005,
            max_speed_kmh: 50.0,
            window_size: 3,
            stationary_timeout_sec: 5.0,
            noise_suppression_factor: 0.7,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::InvalidWindowSize(self.window_size));
        }
        let thresholds = [
            ("min_movement_threshold_deg", self.min_movement_threshold_deg),
            ("max_speed_kmh", self.max_speed_kmh),
            ("stationary_timeout_sec", self.stationary_timeout_sec),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.noise_suppression_factor) {
            return Err(ConfigError::InvalidSuppressionFactor(
                self.noise_suppression_factor,
            ));
        }
        Ok(())
    }
}

/// Junction geometry for the priority-signal controller
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Overrides the profile's junction centre; `None` uses the profile's
    pub junction: Option<PlanarPosition>,
    pub enter_radius: f64,
    pub force_reset_radius: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            junction: None,
            enter_radius: 75.0,
            force_reset_radius: 200.0,
        }
    }
}

impl SignalConfig {
    /// Release distance, twice the enter radius
    pub fn exit_radius(&self) -> f64 {
        self.enter_radius * 2.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let radii = [
            ("enter_radius", self.enter_radius),
            ("force_reset_radius", self.force_reset_radius),
        ];
        for (name, value) in radii {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidRadius { name, value });
            }
        }
        if let Some(junction) = self.junction {
            if !junction.x.is_finite() || !junction.y.is_finite() {
                return Err(ConfigError::InvalidJunction {
                    x: junction.x,
                    y: junction.y,
                });
            }
        }
        Ok(())
    }
}

/// Everything a session needs, fixed at start
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub vehicle_id: String,
    pub profile: ProfileKind,
    pub filter: FilterConfig,
    pub signal: SignalConfig,
    pub placement_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            vehicle_id: "ambulance_gps_0".to_string(),
            profile: ProfileKind::Intersection,
            filter: FilterConfig::default(),
            signal: SignalConfig::default(),
            placement_attempts: 3,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vehicle_id.trim().is_empty() {
            return Err(ConfigError::EmptyVehicleId);
        }
        if self.placement_attempts == 0 {
            return Err(ConfigError::NoPlacementAttempts);
        }
        self.filter.validate()?;
        self.signal.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert_eq!(SignalConfig::default().exit_radius(), 150.0);
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = PipelineConfig::default();
        config.filter.window_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidWindowSize(0)));
    }

    #[test]
    fn test_bad_suppression_factor_rejected() {
        let filter = FilterConfig {
            noise_suppression_factor: 1.5,
            ..FilterConfig::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(ConfigError::InvalidSuppressionFactor(_))
        ));
    }

    #[test]
    fn test_non_positive_radius_rejected() {
        let signal = SignalConfig {
            enter_radius: 0.0,
            ..SignalConfig::default()
        };
        assert!(matches!(
            signal.validate(),
            Err(ConfigError::InvalidRadius { name: "enter_radius", .. })
        ));
    }

    #[test]
    fn test_non_finite_junction_rejected() {
        let signal = SignalConfig {
            junction: Some(PlanarPosition::new(f64::NAN, 510.0)),
            ..SignalConfig::default()
        };
        assert!(matches!(
            signal.validate(),
            Err(ConfigError::InvalidJunction { y, .. }) if y == 510.0
        ));

        let signal = SignalConfig {
            junction: Some(PlanarPosition::new(400.0, 400.0)),
            ..SignalConfig::default()
        };
        assert!(signal.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "profile": "wide-area", "filter": { "max_speed_kmh": 80.0 } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.profile, ProfileKind::WideArea);
        assert_eq!(config.filter.max_speed_kmh, 80.0);
        assert_eq!(config.filter.window_size, 3);
        assert_eq!(config.vehicle_id, "ambulance_gps_0");
        assert_eq!(config.signal.junction, None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = PipelineConfig::from_json_file(Path::new("/nonexistent/pipeline.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
