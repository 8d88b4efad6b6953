//! PWM spindle: variable speed through a duty-cycle output.

use std::sync::Arc;

use spindle_common::consts::DEFAULT_MAX_SPEED;
use spindle_common::spindle::collaborator::OutputDriver;
use spindle_common::spindle::config::SpindleConfig;
use spindle_common::spindle::error::CurveError;
use spindle_common::spindle::speed::{CurveKind, Percent, SpeedMap};
use spindle_common::spindle::state::{SpindleCapabilities, SpindleState};

use crate::backend::{SpindleBackend, drive_outputs};
use crate::curve::linear_map;

/// PWM output with optional direction pin.
pub struct PwmBackend {
    output: Arc<dyn OutputDriver>,
    device_max: u32,
    reversible: bool,
}

impl PwmBackend {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "pwm";

    /// Backend with a `2^resolution_bits - 1` device range.
    pub fn new(output: Arc<dyn OutputDriver>, resolution_bits: u8, reversible: bool) -> Self {
        Self {
            output,
            device_max: super::device_max(resolution_bits),
            reversible,
        }
    }

    /// Registry factory.
    pub fn create(config: &SpindleConfig, output: Arc<dyn OutputDriver>) -> Box<dyn SpindleBackend> {
        Box::new(Self::new(output, config.resolution_bits, config.reversible))
    }
}

impl SpindleBackend for PwmBackend {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> SpindleCapabilities {
        let mut caps = SpindleCapabilities::SETTLE_DELAY;
        caps.set(SpindleCapabilities::REVERSIBLE, self.reversible);
        caps
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
        drive_outputs(self.output.as_ref(), self.reversible, state, device_value);
    }

    #[inline]
    fn write_from_isr(&self, device_value: u32) {
        self.output.write_speed(device_value);
    }
}
