//! Tracker configuration, loadable from a JSON file.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::TrackingError;
use crate::tracker::correlation::{CorrelationConfig, CorrelationTracker};

/// Which single-object tracking algorithm backs each track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TrackerBackend {
    /// Normalised cross-correlation around the previous position
    #[default]
    Correlation,
    /// Normalised cross-correlation around a Kalman-predicted position
    Predictive,
}

impl TrackerBackend {
    /// Build a fresh, uninitialised adapter for one track.
    pub fn create(&self, config: &CorrelationConfig) -> CorrelationTracker {
        match self {
            TrackerBackend::Correlation => CorrelationTracker::new(config.clone()),
            TrackerBackend::Predictive => CorrelationTracker::predictive(config.clone()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerBackend::Correlation => "correlation",
            TrackerBackend::Predictive => "predictive",
        }
    }
}

/// Tracker names used by OpenCV-based clients. They all select the
/// appearance-only correlation backend.
const OPENCV_TRACKERS: &[&str] = &["csrt", "kcf", "mosse", "boosting", "mil", "medianflow", "tld"];

impl FromStr for TrackerBackend {
    type Err = TrackingError;

    /// Unknown names are `InvalidInput`: the selector usually arrives with a request.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correlation" | "ncc" => Ok(TrackerBackend::Correlation),
            "predictive" | "kalman" => Ok(TrackerBackend::Predictive),
            name if OPENCV_TRACKERS.contains(&name) => {
                debug!("tracker '{name}' served by the correlation backend");
                Ok(TrackerBackend::Correlation)
            }
            other => Err(TrackingError::InvalidInput(format!(
                "unknown tracker backend '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for TrackerBackend {
    type Error = TrackingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TrackerBackend> for String {
    fn from(backend: TrackerBackend) -> Self {
        backend.as_str().to_string()
    }
}

impl fmt::Display for TrackerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How annotations reaching past the edges of frame 0 are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Clip to the frame; reject only boxes with no overlap at all
    #[default]
    Clamp,
    /// Reject any box not fully inside the frame
    Reject,
}

/// Configuration for a tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub backend: TrackerBackend,
    /// Updates below this confidence mark the track lost
    pub min_confidence: f32,
    /// Threads updating tracks within one frame; 1 runs sequentially
    pub workers: usize,
    pub bounds: BoundsPolicy,
    pub correlation: CorrelationConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            backend: TrackerBackend::default(),
            min_confidence: 0.3,
            workers: 1,
            bounds: BoundsPolicy::default(),
            correlation: CorrelationConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrackingError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config: TrackerConfig = serde_json::from_str(&json)?;
        config.validate()?;
        info!("tracker config loaded from {}", path.display());
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TrackingError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), TrackingError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(TrackingError::Config(format!(
                "min_confidence {} outside [0, 1]",
                self.min_confidence
            )));
        }
        if self.workers == 0 {
            return Err(TrackingError::Config("workers must be at least 1".into()));
        }
        self.correlation.validate()
    }
}
