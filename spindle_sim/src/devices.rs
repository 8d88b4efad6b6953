//! Logging stand-ins for the output hardware and external collaborators.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use spindle_common::prelude::*;
use spindle_core::delay::Dwell;
use tracing::{debug, info};

/// Output driver that latches values and logs enable/direction edges.
///
/// `write_speed` stays silent: it is also reached from the interrupt path.
#[derive(Debug)]
pub struct LogOutput {
    spindle: String,
    speed: AtomicU32,
    enabled: AtomicBool,
    reverse: AtomicBool,
}

impl LogOutput {
    pub fn new(spindle: &str) -> Self {
        Self {
            spindle: spindle.to_string(),
            speed: AtomicU32::new(0),
            enabled: AtomicBool::new(false),
            reverse: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub fn speed(&self) -> u32 {
        self.speed.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl OutputDriver for LogOutput {
    fn write_speed(&self, value: u32) {
        self.speed.store(value, Ordering::Release);
    }

    fn set_direction(&self, direction: Direction) {
        let reverse = direction == Direction::Reverse;
        if self.reverse.swap(reverse, Ordering::AcqRel) != reverse {
            debug!("[{}] direction {:?}", self.spindle, direction);
        }
    }

    fn set_enable(&self, on: bool) {
        if self.enabled.swap(on, Ordering::AcqRel) != on {
            info!("[{}] output {}", self.spindle, if on { "ON" } else { "OFF" });
        }
    }
}

/// Tool changer that only logs what it was asked to do.
#[derive(Debug)]
pub struct LogChanger {
    name: String,
}

impl LogChanger {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl ToolChanger for LogChanger {
    fn name(&self) -> &str {
        &self.name
    }

    fn tool_change(
        &self,
        tool: ToolNumber,
        pre_select: bool,
        set_tool: bool,
    ) -> Result<(), ToolChangeError> {
        let action = match (pre_select, set_tool) {
            (true, _) => "pre-select",
            (false, true) => "set",
            (false, false) => "change to",
        };
        info!("ATC '{}': {} tool {}", self.name, action, tool);
        Ok(())
    }
}

/// Macro engine that logs the macro body.
#[derive(Debug, Default)]
pub struct LogMacros;

impl MacroRunner for LogMacros {
    fn run(&self, name: &str, body: &str) -> Result<(), MacroError> {
        info!("Macro {}: {}", name, body);
        Ok(())
    }
}

/// Settling wait that logs instead of sleeping.
#[derive(Debug, Default)]
pub struct LogDwell;

impl Dwell for LogDwell {
    fn dwell_ms(&self, ms: u32) {
        info!("Settling {} ms (skipped)", ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_output_latches_values() {
        let output = LogOutput::new("router");
        output.set_enable(true);
        output.write_speed(321);
        assert!(output.enabled());
        assert_eq!(output.speed(), 321);
        output.set_enable(false);
        assert!(!output.enabled());
    }

    #[test]
    fn log_collaborators_always_succeed() {
        assert!(LogChanger::new("rack").tool_change(3, false, false).is_ok());
        assert!(LogMacros.run("m6_macro", "G53 G0 Z0").is_ok());
    }
}
