//! Spindle configuration schema.
//!
//! All config types use `serde::Deserialize` for TOML loading. Numeric
//! parameters are checked against the bounds in [`crate::consts`] by
//! `validate()`, which must pass before any spindle is built.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::speed::{CurveKind, SpeedMap};
use super::state::ToolNumber;
use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    MAX_TOOL_NUMBER, RESOLUTION_BITS_DEFAULT, RESOLUTION_BITS_MAX, RESOLUTION_BITS_MIN,
    SETTLE_MS_MAX, SETTLE_MS_MIN,
};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete spindle configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpindleMachineConfig {
    /// Common service settings.
    pub shared: SharedConfig,

    /// Tool changers spindles may reference by name.
    #[serde(default)]
    pub atc: Vec<AtcConfig>,

    /// Spindle definitions, in selection order.
    #[serde(default)]
    pub spindles: Vec<SpindleConfig>,
}

impl SpindleMachineConfig {
    /// Validate every spindle plus cross-references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let mut atc_names = HashSet::new();
        for atc in &self.atc {
            if atc.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "atc name cannot be empty".to_string(),
                ));
            }
            if !atc_names.insert(atc.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate atc name '{}'",
                    atc.name
                )));
            }
        }

        let mut spindle_names = HashSet::new();
        for spindle in &self.spindles {
            spindle.validate()?;
            if !spindle_names.insert(spindle.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate spindle name '{}'",
                    spindle.name
                )));
            }
            if let Some(atc) = &spindle.atc {
                if !atc_names.contains(atc.as_str()) {
                    return Err(ConfigError::ValidationError(format!(
                        "spindle '{}': atc '{}' is not defined",
                        spindle.name, atc
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Tool changer declaration.
///
/// The changer itself is an external collaborator; the configuration only
/// names it so spindles can refer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtcConfig {
    /// Name referenced by `SpindleConfig::atc`.
    pub name: String,
}

// ─── Spindle Config ─────────────────────────────────────────────────

/// Per-spindle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpindleConfig {
    /// Unique spindle name.
    pub name: String,

    /// Backend type name (`pwm`, `relay`, `laser`, `null`).
    #[serde(rename = "type")]
    pub kind: String,

    /// Time to reach full speed from rest [ms].
    #[serde(default)]
    pub spinup_ms: u32,

    /// Time to stop from full speed [ms].
    #[serde(default)]
    pub spindown_ms: u32,

    /// Lowest tool number served by this spindle. `None` = never selected by
    /// a tool change.
    #[serde(default)]
    pub tool_num: Option<ToolNumber>,

    /// Speed breakpoints. `None` = backend default curve.
    #[serde(default)]
    pub speed_map: Option<SpeedMap>,

    /// Evaluation of `speed_map`. `None` = backend default.
    #[serde(default)]
    pub curve: Option<CurveKind>,

    /// Force Disable when an alarm is raised.
    #[serde(default)]
    pub off_on_alarm: bool,

    /// Tool changer name.
    #[serde(default)]
    pub atc: Option<String>,

    /// Macro run on M6 when no tool changer is bound.
    #[serde(default)]
    pub m6_macro: Option<String>,

    /// Force the off value whenever the spindle is disabled.
    #[serde(default)]
    pub s0_with_disable: bool,

    /// A direction output is wired.
    #[serde(default)]
    pub reversible: bool,

    /// PWM resolution; device range is `2^bits - 1`.
    #[serde(default = "default_resolution_bits")]
    pub resolution_bits: u8,
}

fn default_resolution_bits() -> u8 {
    RESOLUTION_BITS_DEFAULT
}

impl SpindleConfig {
    /// Minimal configuration for a spindle of the given backend type.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            spinup_ms: 0,
            spindown_ms: 0,
            tool_num: None,
            speed_map: None,
            curve: None,
            off_on_alarm: false,
            atc: None,
            m6_macro: None,
            s0_with_disable: false,
            reversible: false,
            resolution_bits: RESOLUTION_BITS_DEFAULT,
        }
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "spindle name cannot be empty".to_string(),
            ));
        }
        for (key, value) in [("spinup_ms", self.spinup_ms), ("spindown_ms", self.spindown_ms)] {
            if !(SETTLE_MS_MIN..=SETTLE_MS_MAX).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "spindle '{}': {key} {value} out of range [{SETTLE_MS_MIN}, {SETTLE_MS_MAX}]",
                    self.name
                )));
            }
        }
        if let Some(tool) = self.tool_num {
            if tool > MAX_TOOL_NUMBER {
                return Err(ConfigError::ValidationError(format!(
                    "spindle '{}': tool_num {tool} out of range [0, {MAX_TOOL_NUMBER}]",
                    self.name
                )));
            }
        }
        if !(RESOLUTION_BITS_MIN..=RESOLUTION_BITS_MAX).contains(&self.resolution_bits) {
            return Err(ConfigError::ValidationError(format!(
                "spindle '{}': resolution_bits {} out of range [{RESOLUTION_BITS_MIN}, {RESOLUTION_BITS_MAX}]",
                self.name, self.resolution_bits
            )));
        }
        if matches!(&self.atc, Some(atc) if atc.is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "spindle '{}': atc name cannot be empty",
                self.name
            )));
        }
        Ok(())
    }

    /// `m6_macro`, ignoring an empty string.
    pub fn m6_macro(&self) -> Option<&str> {
        self.m6_macro.as_deref().filter(|m| !m.is_empty())
    }
}
