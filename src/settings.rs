//! Settings file (`drive-agent.toml`) for the agent, classifier and pipeline.
//!
//! Every table and key is optional; anything missing falls back to its
//! default. Example:
//!
//! ```toml
//! [agent]
//! lane_width_fraction = 0.45
//! resolution = "most_severe"
//!
//! [color]
//! area_threshold_fraction = 0.05
//!
//! [pipeline]
//! confidence_threshold = 0.45
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::{AgentConfig, ResolutionPolicy, UnknownLightPolicy};
use crate::error::ConfigError;
use crate::integration::{ColorConfig, PipelineConfig};

/// All tunables of a drive-agent run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub agent: AgentConfig,
    pub color: ColorConfig,
    pub pipeline: PipelineConfig,
}

impl Settings {
    /// Read, apply `DRIVE_AGENT_*` overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Settings = toml::from_str(&raw)?;
        settings.apply_env_overrides();
        settings.validate()?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Parse and validate without touching the environment.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.agent.validate()?;
        self.color.validate()?;
        self.pipeline.validate()
    }

    /// Apply environment overrides. Unparseable values are logged and ignored.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `DRIVE_AGENT_CONFIDENCE` | `pipeline.confidence_threshold` |
    /// | `DRIVE_AGENT_RESOLUTION` | `agent.resolution` (`first_match` / `most_severe`) |
    /// | `DRIVE_AGENT_UNKNOWN_LIGHT` | `agent.unknown_light` (`ignore` / `caution`) |
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DRIVE_AGENT_CONFIDENCE") {
            match v.parse::<f32>() {
                Ok(conf) => self.pipeline.confidence_threshold = conf,
                Err(_) => warn!(value = %v, "ignoring DRIVE_AGENT_CONFIDENCE"),
            }
        }
        if let Ok(v) = std::env::var("DRIVE_AGENT_RESOLUTION") {
            match v.as_str() {
                "first_match" => self.agent.resolution = ResolutionPolicy::FirstMatch,
                "most_severe" => self.agent.resolution = ResolutionPolicy::MostSevere,
                _ => warn!(value = %v, "ignoring DRIVE_AGENT_RESOLUTION"),
            }
        }
        if let Ok(v) = std::env::var("DRIVE_AGENT_UNKNOWN_LIGHT") {
            match v.as_str() {
                "ignore" => self.agent.unknown_light = UnknownLightPolicy::Ignore,
                "caution" => self.agent.unknown_light = UnknownLightPolicy::Caution,
                _ => warn!(value = %v, "ignoring DRIVE_AGENT_UNKNOWN_LIGHT"),
            }
        }
    }
}
