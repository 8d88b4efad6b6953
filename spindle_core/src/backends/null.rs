//! Placeholder spindle with no output.

use std::sync::Arc;

use spindle_common::consts::DEFAULT_MAX_SPEED;
use spindle_common::spindle::collaborator::OutputDriver;
use spindle_common::spindle::config::SpindleConfig;
use spindle_common::spindle::error::CurveError;
use spindle_common::spindle::speed::{CurveKind, Percent, SpeedMap};
use spindle_common::spindle::state::{SpindleCapabilities, SpindleState};

use crate::backend::SpindleBackend;
use crate::curve::linear_map;

/// Accepts every command and drives nothing.
#[derive(Debug, Default)]
pub struct NullBackend;

impl NullBackend {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "null";

    /// Registry factory.
    pub fn create(_config: &SpindleConfig, _output: Arc<dyn OutputDriver>) -> Box<dyn SpindleBackend> {
        Box::new(Self)
    }
}

impl SpindleBackend for NullBackend {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> SpindleCapabilities {
        SpindleCapabilities::empty()
    }

    fn device_max(&self) -> u32 {
        0
    }

    fn default_kind(&self) -> CurveKind {
        CurveKind::Linear
    }

    fn default_map(&self) -> Result<SpeedMap, CurveError> {
        linear_map(DEFAULT_MAX_SPEED, Percent::FULL)
    }

    fn apply(&self, _state: SpindleState, _device_value: u32) {}

    fn write_from_isr(&self, _device_value: u32) {}
}
