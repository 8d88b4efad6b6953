//! Traits of the external collaborators the spindle core drives.
//!
//! The core never touches hardware, runs macros or moves tools itself. It
//! talks to these traits, which the firmware (or a test double) implements.
//!
//! # Timing Contracts
//!
//! | Operation | Caller context | Constraint |
//! |-----------|----------------|------------|
//! | `OutputDriver::write_speed()` | main loop **and** interrupt | non-blocking, allocation-free |
//! | `OutputDriver::set_direction()` / `set_enable()` | main loop | non-blocking |
//! | `ToolChanger::tool_change()` | main loop | may block |
//! | `MacroRunner::run()` | main loop | may block |

use super::error::{MacroError, ToolChangeError};
use super::state::ToolNumber;

/// Rotation direction presented to the output driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Clockwise.
    Forward,
    /// Counter-clockwise.
    Reverse,
}

/// Low-level output driver (PWM channel, relay pin, DAC, ...).
///
/// All methods take `&self`: `write_speed` is called from the interrupt
/// context while the main loop may be inside `set_direction`, so
/// implementations must be register- or atomic-backed.
pub trait OutputDriver: Send + Sync {
    /// Write a device-level value.
    fn write_speed(&self, device_value: u32);

    /// Drive the direction output, if the hardware has one.
    fn set_direction(&self, direction: Direction);

    /// Drive the enable output, if the hardware has one.
    fn set_enable(&self, enabled: bool);
}

/// Automatic tool changer.
///
/// One changer may serve several spindles; spindles hold it through an `Arc`.
pub trait ToolChanger: Send + Sync {
    /// Name used by the `atc` configuration key.
    fn name(&self) -> &str;

    /// Perform, pre-select, or merely record a tool change.
    ///
    /// - `pre_select`: stage `tool` without swapping it in.
    /// - `set_tool`: declare `tool` as loaded without moving anything.
    fn tool_change(
        &self,
        tool: ToolNumber,
        pre_select: bool,
        set_tool: bool,
    ) -> Result<(), ToolChangeError>;
}

/// Macro execution engine used for `m6_macro`.
pub trait MacroRunner: Send + Sync {
    /// Execute `body`, identified by `name` in diagnostics.
    fn run(&self, name: &str, body: &str) -> Result<(), MacroError>;
}
