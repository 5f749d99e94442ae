//! Detection parameter store.
//!
//! Holds the one configuration of a session. Every edit produces a whole new
//! configuration with exactly one field replaced. Ranges are not checked here.

use crate::error::ConfigError;
use crate::model::{ConfigField, ConfigValue, DetectionConfig};

#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    current: DetectionConfig,
}

impl ConfigStore {
    pub fn new(initial: DetectionConfig) -> Self {
        Self { current: initial }
    }

    pub fn get(&self) -> &DetectionConfig {
        &self.current
    }

    /// Replace one field. A value of the wrong kind leaves the store untouched.
    pub fn set(&mut self, field: ConfigField, value: ConfigValue) -> Result<&DetectionConfig, ConfigError> {
        self.current = with_field(&self.current, field, value)?;
        Ok(&self.current)
    }

    /// Same as [`ConfigStore::set`], addressing the field by its wire name.
    pub fn set_by_name(&mut self, name: &str, value: ConfigValue) -> Result<&DetectionConfig, ConfigError> {
        let field =
            ConfigField::from_name(name).ok_or_else(|| ConfigError::UnknownField(name.to_string()))?;
        self.set(field, value)
    }
}

/// Copy of `cfg` with `field` set to `value`.
pub fn with_field(
    cfg: &DetectionConfig,
    field: ConfigField,
    value: ConfigValue,
) -> Result<DetectionConfig, ConfigError> {
    let mut next = cfg.clone();
    match (field, value) {
        (ConfigField::Preset, ConfigValue::Text(s)) => next.preset = s,
        (ConfigField::Preset, ConfigValue::Number(_)) => {
            return Err(ConfigError::KindMismatch {
                field: field.name(),
                expected: "text",
            })
        }
        (_, ConfigValue::Text(_)) => {
            return Err(ConfigError::KindMismatch {
                field: field.name(),
                expected: "numeric",
            })
        }
        (ConfigField::MinConfidence, ConfigValue::Number(n)) => next.min_confidence = n,
        (ConfigField::MinVisibility, ConfigValue::Number(n)) => next.min_visibility = n,
        (ConfigField::SpeedThreshold, ConfigValue::Number(n)) => next.speed_threshold = n,
        (ConfigField::ExtensionThreshold, ConfigValue::Number(n)) => next.extension_threshold = n,
        (ConfigField::ElbowAngleThreshold, ConfigValue::Number(n)) => {
            next.elbow_angle_threshold = n
        }
        (ConfigField::CooldownSec, ConfigValue::Number(n)) => next.cooldown_sec = n,
        (ConfigField::ComboGapSec, ConfigValue::Number(n)) => next.combo_gap_sec = n,
        (ConfigField::TimelineBucketSec, ConfigValue::Number(n)) => next.timeline_bucket_sec = n,
    }
    Ok(next)
}
