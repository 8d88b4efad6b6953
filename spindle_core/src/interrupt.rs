//! Real-time speed entry point.
//!
//! [`InterruptSpeedPath::push_speed`] is the only call allowed from the
//! interrupt context. It writes an already computed device value straight to
//! the backend output: no curve lookup, no lock, no allocation, no logging.
//! The main loop computes values with [`SpindleCore::map_speed`].

use std::sync::Arc;

use spindle_common::spindle::state::SpindleStatus;

use crate::spindle::SpindleCore;

/// Handle held by the interrupt context.
#[derive(Debug, Clone)]
pub struct InterruptSpeedPath {
    spindle: Arc<SpindleCore>,
}

impl InterruptSpeedPath {
    pub fn new(spindle: Arc<SpindleCore>) -> Self {
        Self { spindle }
    }

    /// Write `device_value` to the output.
    #[inline]
    pub fn push_speed(&self, device_value: u32) {
        self.spindle.set_speed_from_isr(device_value);
    }

    /// Lock-free `(state, speed)` snapshot.
    #[inline]
    pub fn status(&self) -> SpindleStatus {
        self.spindle.status()
    }

    /// Last device value written by either context.
    #[inline]
    pub fn device_value(&self) -> u32 {
        self.spindle.device_value()
    }

    pub fn spindle(&self) -> &Arc<SpindleCore> {
        &self.spindle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atc::ToolChangeLink;
    use crate::backends::PwmBackend;
    use crate::backends::test_support::{OutputCall, RecordingOutput};
    use crate::spindle::test_support::RecordingDwell;
    use spindle_common::spindle::config::SpindleConfig;
    use spindle_common::spindle::state::SpindleState;

    #[test]
    fn push_speed_writes_output_only() {
        let config = SpindleConfig::new("router", "pwm");
        let output = Arc::new(RecordingOutput::default());
        let spindle = Arc::new(
            SpindleCore::new(
                &config,
                PwmBackend::create(&config, output.clone()),
                ToolChangeLink::none(),
                Arc::new(RecordingDwell::default()),
            )
            .unwrap(),
        );
        spindle.set_state(SpindleState::Cw, 5000).unwrap();
        output.take();

        let path = InterruptSpeedPath::new(spindle.clone());
        let value = spindle.map_speed(SpindleState::Cw, 2500);
        path.push_speed(value);

        assert_eq!(output.take(), vec![OutputCall::Speed(value)]);
        assert_eq!(path.device_value(), value);
        assert_eq!(path.status(), SpindleStatus::new(SpindleState::Cw, 5000));
    }
}
