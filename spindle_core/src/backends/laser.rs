//! Laser: PWM power output, rate adjusted, no settle time, one direction.

use std::sync::Arc;

use spindle_common::consts::DEFAULT_MAX_SPEED;
use spindle_common::spindle::collaborator::OutputDriver;
use spindle_common::spindle::config::SpindleConfig;
use spindle_common::spindle::error::CurveError;
use spindle_common::spindle::speed::{CurveKind, Percent, SpeedMap};
use spindle_common::spindle::state::{SpindleCapabilities, SpindleState};
use tracing::warn;

use crate::backend::{SpindleBackend, drive_outputs};
use crate::curve::linear_map;

/// Laser power output.
pub struct LaserBackend {
    output: Arc<dyn OutputDriver>,
    device_max: u32,
}

impl LaserBackend {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "laser";

    pub fn new(output: Arc<dyn OutputDriver>, resolution_bits: u8) -> Self {
        Self {
            output,
            device_max: super::device_max(resolution_bits),
        }
    }

    /// Registry factory.
    pub fn create(config: &SpindleConfig, output: Arc<dyn OutputDriver>) -> Box<dyn SpindleBackend> {
        if config.reversible {
            warn!("Laser '{}' cannot reverse, ignoring reversible = true", config.name);
        }
        if config.spinup_ms != 0 || config.spindown_ms != 0 {
            warn!("Laser '{}' has no settle time, ignoring spinup_ms/spindown_ms", config.name);
        }
        Box::new(Self::new(output, config.resolution_bits))
    }
}

impl SpindleBackend for LaserBackend {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> SpindleCapabilities {
        SpindleCapabilities::RATE_ADJUSTED
    }

    fn device_max(&self) -> u32 {
        self.device_max
    }

    fn default_kind(&self) -> CurveKind {
        CurveKind::Linear
    }

    fn default_map(&self) -> Result<SpeedMap, CurveError> {
        linear_map(DEFAULT_MAX_SPEED, Percent::FULL)
    }

    fn apply(&self, state: SpindleState, device_value: u32) {
        drive_outputs(self.output.as_ref(), false, state, device_value);
    }

    #[inline]
    fn write_from_isr(&self, device_value: u32) {
        self.output.write_speed(device_value);
    }
}
