//! Active spindle selection.
//!
//! The registry owns the configured spindle set and the index of the spindle
//! motion code talks to. It is created at configuration load and handed to
//! whoever needs it; nothing here is global. Switching (`&mut self`) happens
//! only from the main loop, at tool changes or reload.

use std::sync::Arc;

use spindle_common::spindle::error::SpindleError;
use spindle_common::spindle::state::{SpindleState, ToolNumber};
use tracing::{debug, info, warn};

use crate::interrupt::InterruptSpeedPath;
use crate::persist::{PersistedSpindleState, PersistedState};
use crate::spindle::SpindleCore;
use crate::switch::{SwitchDecision, decide};

/// Configured spindles plus the active one.
#[derive(Debug)]
pub struct ActiveSpindleRegistry {
    spindles: Vec<Arc<SpindleCore>>,
    active: usize,
}

impl ActiveSpindleRegistry {
    /// Take ownership of the spindle set and activate the first spindle.
    pub fn new(spindles: Vec<Arc<SpindleCore>>) -> Result<Self, SpindleError> {
        let Some(first) = spindles.first() else {
            return Err(SpindleError::NoSpindles);
        };
        first.init();
        Ok(Self {
            spindles,
            active: 0,
        })
    }

    /// Active spindle.
    pub fn active(&self) -> &Arc<SpindleCore> {
        &self.spindles[self.active]
    }

    /// Index of the active spindle.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// All spindles in configuration order.
    pub fn spindles(&self) -> &[Arc<SpindleCore>] {
        &self.spindles
    }

    /// Spindle by name.
    pub fn get(&self, name: &str) -> Option<&Arc<SpindleCore>> {
        self.spindles.iter().find(|s| s.name() == name)
    }

    /// Interrupt handle for the active spindle.
    ///
    /// Must be fetched again after the active spindle changes.
    pub fn interrupt_path(&self) -> InterruptSpeedPath {
        InterruptSpeedPath::new(Arc::clone(self.active()))
    }

    /// Make `index` active without a tool change.
    ///
    /// The previous spindle is stopped first, with its settling delay.
    /// Returns `false` for an out-of-range index.
    pub fn set_active(&mut self, index: usize) -> Result<bool, SpindleError> {
        if index >= self.spindles.len() {
            return Ok(false);
        }
        if index != self.active {
            self.switch_to(SwitchDecision {
                next: index,
                stop_current: true,
                start_next: true,
            })?;
        }
        Ok(true)
    }

    /// Route a tool change to the spindle serving `tool`.
    ///
    /// A pre-select is forwarded to that spindle's link without switching.
    /// Otherwise the active spindle is stopped (settling included) before the
    /// new one is initialised, and the new spindle then performs the change.
    pub fn tool_change(
        &mut self,
        tool: ToolNumber,
        pre_select: bool,
        set_tool: bool,
    ) -> Result<(), SpindleError> {
        let decision =
            decide(tool, &self.spindles, Some(self.active)).ok_or(SpindleError::NoSpindles)?;

        if pre_select {
            return self.spindles[decision.next].tool_change(tool, true, set_tool);
        }

        self.switch_to(decision)?;
        self.active().tool_change(tool, false, set_tool)
    }

    /// Apply the alarm policy of the active spindle.
    pub fn handle_alarm(&self) -> Result<bool, SpindleError> {
        self.active().handle_alarm()
    }

    /// Capture restart state.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            active: self.active().name().to_string(),
            spindles: self
                .spindles
                .iter()
                .map(|s| {
                    let status = s.status();
                    PersistedSpindleState {
                        name: s.name().to_string(),
                        state: status.state,
                        speed: status.speed,
                        current_tool: s.current_tool(),
                    }
                })
                .collect(),
            ..PersistedState::new()
        }
    }

    /// Reproduce a snapshot after a restart.
    ///
    /// Selects the saved active spindle, restores every spindle's tool without
    /// contacting a changer and re-drives the active spindle's state. Names
    /// no longer configured are skipped.
    pub fn restore(&mut self, state: &PersistedState) -> Result<(), SpindleError> {
        match self.spindles.iter().position(|s| s.name() == state.active) {
            Some(index) if index != self.active => {
                self.active = index;
                self.active().init();
            }
            Some(_) => {}
            None => warn!(
                "Saved active spindle '{}' is not configured, keeping '{}'",
                state.active,
                self.active().name()
            ),
        }

        for saved in &state.spindles {
            let Some(spindle) = self.get(&saved.name) else {
                warn!("Saved spindle '{}' is not configured, skipping", saved.name);
                continue;
            };
            spindle.link().restore_tool(saved.current_tool);
        }

        if let Some(saved) = state.spindle(self.active().name()) {
            if saved.state != SpindleState::Unknown {
                self.active().set_state(saved.state, saved.speed)?;
            }
        }

        info!(
            "Restored spindle '{}': {:?} at {}, tool {}",
            self.active().name(),
            self.active().get_state(),
            self.active().get_speed(),
            self.active().current_tool()
        );
        Ok(())
    }

    fn switch_to(&mut self, decision: SwitchDecision) -> Result<(), SpindleError> {
        if decision.stop_current {
            debug!("Stopping spindle '{}' before switch", self.active().name());
            self.active().stop()?;
        }
        if decision.start_next {
            let previous = self.active;
            self.active = decision.next;
            self.active().init();
            info!(
                "Active spindle '{}' -> '{}'",
                self.spindles[previous].name(),
                self.active().name()
            );
        }
        Ok(())
    }
}
