use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::overlay::StyleDescriptor;
use crate::state::{DistanceUnit, RangeType, TravelMode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse control config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid {field} range: min {min} max {max} interval {interval}")]
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
        interval: f64,
    },
    #[error("endpoint must not be empty")]
    EmptyEndpoint,
    #[error("http timeout must be 1..={max} seconds, got {timeout_secs}", max = MAX_TIMEOUT_SECS)]
    InvalidTimeout { timeout_secs: u64 },
}

const APP_DIR: &str = "reachability";
const APP_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_ENDPOINT: &str = "https://api.openrouteservice.org/isochrones";
pub const MAX_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeControlConfig {
    pub min: f64,
    pub max: f64,
    pub interval: f64,
}

impl RangeControlConfig {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        let valid = self.min.is_finite()
            && self.max.is_finite()
            && self.interval.is_finite()
            && self.min > 0.0
            && self.min <= self.max
            && self.interval > 0.0;
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidRange {
                field,
                min: self.min,
                max: self.max,
                interval: self.interval,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TravelProfiles {
    pub driving: String,
    pub cycling: String,
    pub walking: String,
    pub accessibility: String,
}

impl Default for TravelProfiles {
    fn default() -> Self {
        Self {
            driving: "driving-car".to_string(),
            cycling: "cycling-regular".to_string(),
            walking: "foot-walking".to_string(),
            accessibility: "wheelchair".to_string(),
        }
    }
}

impl TravelProfiles {
    pub fn profile(&self, mode: TravelMode) -> &str {
        match mode {
            TravelMode::Driving => &self.driving,
            TravelMode::Cycling => &self.cycling,
            TravelMode::Walking => &self.walking,
            TravelMode::Accessibility => &self.accessibility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub cache: bool,
    pub timeout_secs: u64,
    pub headers: Vec<(String, String)>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cache: false,
            timeout_secs: 30,
            headers: Vec::new(),
        }
    }
}

/// Every option the control recognizes. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    pub api_key: String,
    pub endpoint: String,
    pub range_type: RangeType,
    pub travel_mode: TravelMode,
    pub draw_multiple: bool,
    pub show_intervals: bool,
    pub distance_units: DistanceUnit,
    pub distance_range: RangeControlConfig,
    /// Minutes.
    pub time_range: RangeControlConfig,
    pub profiles: TravelProfiles,
    pub show_origin_marker: bool,
    pub error_flash_ms: u64,
    pub style: StyleDescriptor,
    pub http: HttpConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            range_type: RangeType::Distance,
            travel_mode: TravelMode::Driving,
            draw_multiple: false,
            show_intervals: false,
            distance_units: DistanceUnit::Kilometers,
            distance_range: RangeControlConfig {
                min: 0.5,
                max: 3.0,
                interval: 0.5,
            },
            time_range: RangeControlConfig {
                min: 5.0,
                max: 30.0,
                interval: 5.0,
            },
            profiles: TravelProfiles::default(),
            show_origin_marker: true,
            error_flash_ms: 500,
            style: StyleDescriptor::default(),
            http: HttpConfig::default(),
        }
    }
}

impl ControlConfig {
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.http.timeout_secs) {
            return Err(ConfigError::InvalidTimeout {
                timeout_secs: self.http.timeout_secs,
            });
        }
        self.distance_range.validate("distance")?;
        self.time_range.validate("time")?;
        Ok(())
    }

    pub fn range_control(&self, range_type: RangeType) -> &RangeControlConfig {
        match range_type {
            RangeType::Distance => &self.distance_range,
            RangeType::Time => &self.time_range,
        }
    }
}

pub fn load_control_config() -> ControlConfig {
    let xdg_config_home = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match config_file_path(xdg_config_home.as_deref(), home.as_deref()) {
        Some(path) => load_control_config_from(&path),
        None => {
            tracing::debug!("no config directory; using defaults");
            ControlConfig::default()
        }
    }
}

/// `$XDG_CONFIG_HOME/reachability/config.json`, falling back to `$HOME/.config`.
pub fn config_file_path(xdg_config_home: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    let root = match xdg_config_home {
        Some(xdg) if !xdg.as_os_str().is_empty() => xdg.to_path_buf(),
        _ => home?.join(".config"),
    };
    Some(root.join(APP_DIR).join(APP_CONFIG_FILE))
}

fn load_control_config_from(path: &Path) -> ControlConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return ControlConfig::default(),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            return ControlConfig::default();
        }
    };
    ControlConfig::from_json_str(&contents).unwrap_or_else(|err| {
        tracing::warn!(%err, ?path, "invalid config.json; using defaults");
        ControlConfig::default()
    })
}
