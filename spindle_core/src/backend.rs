//! Spindle backend trait.
//!
//! A backend is the capability layer between the core and an external
//! [`OutputDriver`]: it knows the device range, the default curve and how a
//! `(state, device value)` pair translates into enable, direction and speed
//! writes.
//!
//! # Timing Contracts
//!
//! | Operation | Caller context | Constraint |
//! |-----------|----------------|------------|
//! | `apply()` | main loop | non-blocking |
//! | `write_from_isr()` | interrupt | non-blocking, allocation-free, no logging |

use spindle_common::spindle::collaborator::{Direction, OutputDriver};
use spindle_common::spindle::error::CurveError;
use spindle_common::spindle::speed::{CurveKind, SpeedMap};
use spindle_common::spindle::state::{SpindleCapabilities, SpindleState};

/// Spindle output variant (PWM, relay, laser, ...).
pub trait SpindleBackend: Send + Sync {
    /// Registry name of this backend type.
    fn type_name(&self) -> &'static str;

    /// What this output can do.
    fn capabilities(&self) -> SpindleCapabilities;

    /// Highest device value.
    fn device_max(&self) -> u32;

    /// Curve evaluation used when the configuration does not pick one.
    fn default_kind(&self) -> CurveKind;

    /// Speed map used when the configuration has none.
    fn default_map(&self) -> Result<SpeedMap, CurveError>;

    /// Drive the outputs for a main-loop state change.
    fn apply(&self, state: SpindleState, device_value: u32);

    /// Refresh the speed output from the interrupt context.
    fn write_from_isr(&self, device_value: u32);
}

/// Direction output for a running state, `None` when stopped.
pub(crate) fn direction_for(state: SpindleState) -> Option<Direction> {
    match state {
        SpindleState::Cw => Some(Direction::Forward),
        SpindleState::Ccw => Some(Direction::Reverse),
        SpindleState::Unknown | SpindleState::Disable => None,
    }
}

/// Enable/direction/speed sequence shared by the wired backends.
///
/// Turning off writes the speed before dropping enable; turning on sets
/// direction and enable before the speed.
pub(crate) fn drive_outputs(
    output: &dyn OutputDriver,
    reversible: bool,
    state: SpindleState,
    device_value: u32,
) {
    match direction_for(state) {
        None => {
            output.write_speed(device_value);
            output.set_enable(false);
        }
        Some(direction) => {
            if reversible {
                output.set_direction(direction);
            }
            output.set_enable(true);
            output.write_speed(device_value);
        }
    }
}
