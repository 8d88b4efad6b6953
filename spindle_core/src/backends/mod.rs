//! Built-in spindle backends.
//!
//! - [`pwm`] - variable-speed PWM output
//! - [`relay`] - on/off relay output
//! - [`laser`] - PWM laser, power follows feed rate
//! - [`null`] - placeholder with no output

pub mod laser;
pub mod null;
pub mod pwm;
pub mod relay;

pub use laser::LaserBackend;
pub use null::NullBackend;
pub use pwm::PwmBackend;
pub use relay::RelayBackend;

/// Largest device value for a `bits`-wide output. Widths past 32 saturate.
pub(crate) fn device_max(bits: u8) -> u32 {
    1u32.checked_shl(u32::from(bits)).map_or(u32::MAX, |range| range - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_max_covers_resolution() {
        assert_eq!(device_max(0), 0);
        assert_eq!(device_max(10), 1023);
        assert_eq!(device_max(31), 0x7FFF_FFFF);
        assert_eq!(device_max(32), u32::MAX);
        assert_eq!(device_max(40), u32::MAX);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Output driver that records every call.

    use std::sync::Mutex;

    use spindle_common::spindle::collaborator::{Direction, OutputDriver};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum OutputCall {
        Speed(u32),
        Direction(Direction),
        Enable(bool),
    }

    #[derive(Debug, Default)]
    pub struct RecordingOutput {
        pub calls: Mutex<Vec<OutputCall>>,
    }

    impl RecordingOutput {
        pub fn take(&self) -> Vec<OutputCall> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    impl OutputDriver for RecordingOutput {
        fn write_speed(&self, device_value: u32) {
            self.calls.lock().unwrap().push(OutputCall::Speed(device_value));
        }

        fn set_direction(&self, direction: Direction) {
            self.calls.lock().unwrap().push(OutputCall::Direction(direction));
        }

        fn set_enable(&self, enabled: bool) {
            self.calls.lock().unwrap().push(OutputCall::Enable(enabled));
        }
    }
}
