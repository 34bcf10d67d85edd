use serde::{Deserialize, Serialize};

use crate::agent::detection::ClassId;
use crate::error::ConfigError;

/// Current layout version of [`AgentConfig`].
pub const AGENT_CONFIG_VERSION: u32 = 1;

/// How competing outcomes within one frame are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// The first hard override in detection order wins.
    #[default]
    FirstMatch,
    /// Every detection is evaluated and the most severe outcome wins.
    MostSevere,
}

/// Handling of traffic lights whose colour could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownLightPolicy {
    /// No effect on the decision.
    #[default]
    Ignore,
    /// Advise SLOW DOWN; obstacles may still escalate to BRAKE.
    Caution,
}

/// Tunable parameters of the driving agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub version: u32,
    /// Danger zone width as a fraction of frame width, centred on the frame.
    pub lane_width_fraction: f64,
    /// Bottom edges below this fraction of frame height are "ahead".
    pub warning_distance_fraction: f64,
    /// Bottom edges below this fraction of frame height are "critical".
    pub critical_distance_fraction: f64,
    pub obstacle_classes: Vec<ClassId>,
    pub traffic_light_class: ClassId,
    pub resolution: ResolutionPolicy,
    pub unknown_light: UnknownLightPolicy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            version: AGENT_CONFIG_VERSION,
            lane_width_fraction: 0.45,
            warning_distance_fraction: 0.55,
            critical_distance_fraction: 0.80,
            obstacle_classes: vec![
                ClassId::PERSON,
                ClassId::BICYCLE,
                ClassId::CAR,
                ClassId::MOTORCYCLE,
                ClassId::BUS,
                ClassId::TRUCK,
            ],
            traffic_light_class: ClassId::TRAFFIC_LIGHT,
            resolution: ResolutionPolicy::default(),
            unknown_light: UnknownLightPolicy::default(),
        }
    }
}

impl AgentConfig {
    pub fn is_obstacle(&self, class_id: ClassId) -> bool {
        self.obstacle_classes.contains(&class_id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != AGENT_CONFIG_VERSION {
            return Err(ConfigError::Invalid {
                field: "agent.version",
                reason: format!("unsupported version {}", self.version),
            });
        }
        check_fraction("agent.lane_width_fraction", self.lane_width_fraction)?;
        check_fraction("agent.warning_distance_fraction", self.warning_distance_fraction)?;
        check_fraction("agent.critical_distance_fraction", self.critical_distance_fraction)?;
        if self.warning_distance_fraction > self.critical_distance_fraction {
            return Err(ConfigError::Invalid {
                field: "agent.warning_distance_fraction",
                reason: "must not exceed critical_distance_fraction".to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn check_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is outside (0, 1]"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AgentConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_obstacle(ClassId::TRUCK));
        assert!(!config.is_obstacle(ClassId::TRAFFIC_LIGHT));
        assert!(!config.is_obstacle(ClassId(4)));
    }

    #[test]
    fn test_rejects_out_of_range_fraction() {
        let config = AgentConfig {
            lane_width_fraction: 1.5,
            ..AgentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "agent.lane_width_fraction", .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let config = AgentConfig {
            warning_distance_fraction: 0.9,
            critical_distance_fraction: 0.5,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let config = AgentConfig {
            version: 7,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
