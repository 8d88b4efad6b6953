//! Relay spindle: on/off output, optional direction relay.

use std::sync::Arc;

use spindle_common::consts::DEFAULT_MAX_SPEED;
use spindle_common::spindle::collaborator::OutputDriver;
use spindle_common::spindle::config::SpindleConfig;
use spindle_common::spindle::error::CurveError;
use spindle_common::spindle::speed::{CurveKind, Percent, SpeedMap, SpeedMapEntry};
use spindle_common::spindle::state::{SpindleCapabilities, SpindleState};

use crate::backend::{SpindleBackend, drive_outputs};

/// On/off relay. Device range is `0..=1`.
pub struct RelayBackend {
    output: Arc<dyn OutputDriver>,
    reversible: bool,
}

impl RelayBackend {
    /// Registry name.
    pub const TYPE_NAME: &'static str = "relay";

    pub fn new(output: Arc<dyn OutputDriver>, reversible: bool) -> Self {
        Self { output, reversible }
    }

    /// Registry factory.
    pub fn create(config: &SpindleConfig, output: Arc<dyn OutputDriver>) -> Box<dyn SpindleBackend> {
        Box::new(Self::new(output, config.reversible))
    }
}

impl SpindleBackend for RelayBackend {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn capabilities(&self) -> SpindleCapabilities {
        let mut caps = SpindleCapabilities::SETTLE_DELAY;
        caps.set(SpindleCapabilities::REVERSIBLE, self.reversible);
        caps
    }

    fn device_max(&self) -> u32 {
        1
    }

    fn default_kind(&self) -> CurveKind {
        CurveKind::Shelf
    }

    /// Off at 0, on for any non-zero speed. The top breakpoint only sets the
    /// speed range the settle times are scaled against.
    fn default_map(&self) -> Result<SpeedMap, CurveError> {
        SpeedMap::from_entries(&[
            SpeedMapEntry::new(0, Percent::ZERO),
            SpeedMapEntry::new(1, Percent::FULL),
            SpeedMapEntry::new(DEFAULT_MAX_SPEED, Percent::FULL),
        ])
    }

    fn apply(&self, state: SpindleState, device_value: u32) {
        drive_outputs(self.output.as_ref(), self.reversible, state, device_value.min(1));
    }

    #[inline]
    fn write_from_isr(&self, device_value: u32) {
        self.output.write_speed(device_value.min(1));
    }
}
