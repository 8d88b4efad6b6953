//! Spindle state machine.
//!
//! `Unknown` → {`Disable`, `Cw`, `Ccw`}, then freely among the three.
//! `Unknown` is never re-entered.
//!
//! Every operation here takes `&self`: the `(state, speed)` pair lives in an
//! [`AtomicSpindleStatus`] and the speed output is shared with the interrupt
//! path, so a spindle is handed around as `Arc<SpindleCore>`. Mutating
//! operations other than [`SpindleCore::set_speed_from_isr`] belong to the
//! main loop only.

use std::sync::Arc;

use spindle_common::spindle::config::SpindleConfig;
use spindle_common::spindle::error::SpindleError;
use spindle_common::spindle::speed::CurveKind;
use spindle_common::spindle::state::{
    SpindleCapabilities, SpindleSpeed, SpindleState, SpindleStatus, ToolNumber,
};
use static_assertions::assert_impl_all;
use tracing::{debug, info};

use crate::atc::{AtcRegistry, ToolChangeLink};
use crate::backend::SpindleBackend;
use crate::curve::SpeedCurve;
use crate::delay::{Dwell, SettleDelay, SettleTiming};
use crate::status::AtomicSpindleStatus;

/// One configured spindle.
pub struct SpindleCore {
    name: String,
    backend: Box<dyn SpindleBackend>,
    curve: SpeedCurve,
    defaulted_speeds: bool,
    timing: SettleTiming,
    status: AtomicSpindleStatus,
    tool_num: Option<ToolNumber>,
    off_on_alarm: bool,
    zero_speed_with_disable: bool,
    link: ToolChangeLink,
    dwell: Arc<dyn Dwell>,
}

assert_impl_all!(SpindleCore: Send, Sync);

impl SpindleCore {
    /// Build a spindle from validated configuration.
    ///
    /// The curve comes from `speed_map` when present, otherwise from the
    /// backend default. Settle times are pre-scaled against the curve's
    /// maximum speed; backends without `SETTLE_DELAY` get no settling.
    pub fn new(
        config: &SpindleConfig,
        backend: Box<dyn SpindleBackend>,
        link: ToolChangeLink,
        dwell: Arc<dyn Dwell>,
    ) -> Result<Self, SpindleError> {
        config.validate()?;

        let kind = config.curve.unwrap_or_else(|| backend.default_kind());
        let (map, defaulted_speeds) = match &config.speed_map {
            Some(map) => (map.clone(), false),
            None => (
                backend
                    .default_map()
                    .map_err(|e| SpindleError::curve(&config.name, e))?,
                true,
            ),
        };
        let curve = SpeedCurve::from_map(&map, kind, backend.device_max())
            .map_err(|e| SpindleError::curve(&config.name, e))?;

        let timing = if backend
            .capabilities()
            .contains(SpindleCapabilities::SETTLE_DELAY)
        {
            SettleTiming::new(config.spinup_ms, config.spindown_ms, curve.max_speed())
        } else {
            SettleTiming::NONE
        };

        Ok(Self {
            name: config.name.clone(),
            backend,
            curve,
            defaulted_speeds,
            timing,
            status: AtomicSpindleStatus::new(),
            tool_num: config.tool_num,
            off_on_alarm: config.off_on_alarm,
            zero_speed_with_disable: config.s0_with_disable,
            link,
            dwell,
        })
    }

    /// Put the output in its off position and announce the spindle.
    ///
    /// Called when the spindle becomes active. Leaves the state untouched.
    pub fn init(&self) {
        let off = self.curve.off_offset();
        self.backend.apply(SpindleState::Disable, off);
        self.status.store_device_value(off);
        info!("{}", self.config_message());
    }

    // ─── State machine ──────────────────────────────────────────────

    /// Command a new state and speed.
    ///
    /// Computes the device value, drives the output, publishes the new pair
    /// and then blocks for the settling delay. Main loop only.
    ///
    /// # Errors
    /// - `SpindleError::NotReversible` for `Ccw` on a one-direction spindle
    /// - `SpindleError::InvalidState` for `Unknown`
    pub fn set_state(&self, state: SpindleState, speed: SpindleSpeed) -> Result<(), SpindleError> {
        match state {
            SpindleState::Unknown => {
                return Err(SpindleError::InvalidState {
                    name: self.name.clone(),
                });
            }
            SpindleState::Ccw if !self.is_reversible() => {
                return Err(SpindleError::NotReversible {
                    name: self.name.clone(),
                });
            }
            _ => {}
        }

        let speed = if state == SpindleState::Disable && self.zero_speed_with_disable {
            0
        } else {
            speed
        };
        let device_value = self.curve.evaluate(state, speed);
        let next = SpindleStatus::new(state, speed);
        let prev = self.status.load();

        self.backend.apply(state, device_value);
        self.status.store_device_value(device_value);
        self.status.store(next);
        debug!(
            "Spindle '{}': {:?}/{} -> {:?}/{} (device {})",
            self.name, prev.state, prev.speed, state, speed, device_value
        );

        self.settle(prev, next);
        Ok(())
    }

    /// `set_state(Disable, 0)`.
    pub fn stop(&self) -> Result<(), SpindleError> {
        self.set_state(SpindleState::Disable, 0)
    }

    /// Same as [`stop`](Self::stop).
    pub fn spin_down(&self) -> Result<(), SpindleError> {
        self.stop()
    }

    /// Disable the spindle if `off_on_alarm` is set. Returns whether it did.
    pub fn handle_alarm(&self) -> Result<bool, SpindleError> {
        if !self.off_on_alarm {
            return Ok(false);
        }
        info!("Spindle '{}' off on alarm", self.name);
        self.stop()?;
        Ok(true)
    }

    /// Write a precomputed device value from the interrupt context.
    ///
    /// Touches only the output and the device-value atomic; never the
    /// `(state, speed)` pair.
    #[inline]
    pub(crate) fn set_speed_from_isr(&self, device_value: u32) {
        self.backend.write_from_isr(device_value);
        self.status.store_device_value(device_value);
    }

    /// Wait computed for a `prev` → `next` transition.
    pub fn settle_delay(&self, prev: SpindleStatus, next: SpindleStatus) -> SettleDelay {
        self.timing.delay(prev, next)
    }

    fn settle(&self, prev: SpindleStatus, next: SpindleStatus) {
        if !self.use_delay_settings() {
            return;
        }
        let delay = self.timing.delay(prev, next);
        if delay.is_zero() {
            return;
        }
        debug!(
            "Spindle '{}' settling: down {} ms, up {} ms",
            self.name, delay.spin_down_ms, delay.spin_up_ms
        );
        if delay.spin_down_ms > 0 {
            self.dwell.dwell_ms(delay.spin_down_ms);
        }
        if delay.spin_up_ms > 0 {
            self.dwell.dwell_ms(delay.spin_up_ms);
        }
    }

    // ─── Queries ────────────────────────────────────────────────────

    /// Spindle name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state.
    #[inline]
    pub fn get_state(&self) -> SpindleState {
        self.status.state()
    }

    /// Current logical speed.
    #[inline]
    pub fn get_speed(&self) -> SpindleSpeed {
        self.status.speed()
    }

    /// Consistent `(state, speed)` snapshot.
    #[inline]
    pub fn status(&self) -> SpindleStatus {
        self.status.load()
    }

    /// Last device value written by either context.
    #[inline]
    pub fn device_value(&self) -> u32 {
        self.status.device_value()
    }

    /// Device value for `state` at `speed`, without side effects.
    #[inline]
    pub fn map_speed(&self, state: SpindleState, speed: SpindleSpeed) -> u32 {
        self.curve.evaluate(state, speed)
    }

    /// Device value used for Disable.
    pub fn off_speed(&self) -> u32 {
        self.curve.off_offset()
    }

    /// Highest logical speed in the curve.
    pub fn max_speed(&self) -> SpindleSpeed {
        self.curve.max_speed()
    }

    /// Speed curve.
    pub fn curve(&self) -> &SpeedCurve {
        &self.curve
    }

    /// True when the curve came from the backend default.
    pub fn defaulted_speeds(&self) -> bool {
        self.defaulted_speeds
    }

    /// Backend capabilities.
    pub fn capabilities(&self) -> SpindleCapabilities {
        self.backend.capabilities()
    }

    /// Can run `Ccw`.
    pub fn is_reversible(&self) -> bool {
        self.capabilities().contains(SpindleCapabilities::REVERSIBLE)
    }

    /// Output follows feed rate.
    pub fn is_rate_adjusted(&self) -> bool {
        self.capabilities()
            .contains(SpindleCapabilities::RATE_ADJUSTED)
    }

    /// Honours `spinup_ms` / `spindown_ms`.
    pub fn use_delay_settings(&self) -> bool {
        self.capabilities().contains(SpindleCapabilities::SETTLE_DELAY)
    }

    /// Settle times and scalers.
    pub fn timing(&self) -> &SettleTiming {
        &self.timing
    }

    /// Lowest tool number served, if any.
    pub fn tool_num(&self) -> Option<ToolNumber> {
        self.tool_num
    }

    /// `off_on_alarm` setting.
    pub fn off_on_alarm(&self) -> bool {
        self.off_on_alarm
    }

    /// Backend type name.
    pub fn type_name(&self) -> &'static str {
        self.backend.type_name()
    }

    // ─── Tool change ────────────────────────────────────────────────

    /// Tool-changer link.
    pub fn link(&self) -> &ToolChangeLink {
        &self.link
    }

    /// Forward a tool change through the link.
    pub fn tool_change(
        &self,
        tool: ToolNumber,
        pre_select: bool,
        set_tool: bool,
    ) -> Result<(), SpindleError> {
        self.link.tool_change(&self.name, tool, pre_select, set_tool)
    }

    /// Bind the configured tool changer. Idempotent.
    pub fn init_link(&self, changers: &AtcRegistry) -> Result<(), SpindleError> {
        self.link.init_link(&self.name, changers)
    }

    /// Last committed tool.
    pub fn current_tool(&self) -> ToolNumber {
        self.link.current_tool()
    }

    /// `"atc:<name>"`, `"m6_macro"` or empty.
    pub fn atc_info(&self) -> String {
        self.link.atc_info()
    }

    /// One-line description for the startup log.
    pub fn config_message(&self) -> String {
        let curve = match self.curve.kind() {
            CurveKind::Linear => "linear",
            CurveKind::Shelf => "shelf",
        };
        let mut msg = format!(
            "Spindle '{}' type:{} device_max:{} curve:{}{} max_speed:{}",
            self.name,
            self.backend.type_name(),
            self.backend.device_max(),
            curve,
            if self.defaulted_speeds { "(default)" } else { "" },
            self.curve.max_speed(),
        );
        if self.use_delay_settings() {
            msg.push_str(&format!(
                " spinup:{}ms spindown:{}ms",
                self.timing.spinup_ms(),
                self.timing.spindown_ms()
            ));
        }
        if let Some(tool) = self.tool_num {
            msg.push_str(&format!(" tool:{tool}"));
        }
        if self.is_reversible() {
            msg.push_str(" reversible");
        }
        if self.is_rate_adjusted() {
            msg.push_str(" rate_adjusted");
        }
        let atc = self.atc_info();
        if !atc.is_empty() {
            msg.push(' ');
            msg.push_str(&atc);
        }
        msg
    }
}

impl std::fmt::Debug for SpindleCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpindleCore")
            .field("name", &self.name)
            .field("type", &self.backend.type_name())
            .field("status", &self.status())
            .field("tool_num", &self.tool_num)
            .field("link", &self.link)
            .finish()
    }
}
