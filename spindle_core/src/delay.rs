//! Settling delay.
//!
//! `spinup_ms` / `spindown_ms` are the times for a full-range speed change.
//! At construction they are turned into 16.16 fixed-point scalers,
//! `(ms << 16) / max_speed`, so the runtime cost is
//! `delta * scaler >> 16`: one multiply, one shift, truncating.
//!
//! The wait is the only intentional suspension point in the core. It runs in
//! the main loop only and is never cancelled once started.

use std::time::Duration;

use spindle_common::consts::FIXED_POINT_SHIFT;
use spindle_common::spindle::state::{SpindleSpeed, SpindleState, SpindleStatus};

/// Blocking wait used for the settling delay.
pub trait Dwell: Send + Sync {
    /// Suspend the calling (main-loop) context for `ms` milliseconds.
    fn dwell_ms(&self, ms: u32);
}

/// Dwell backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDwell;

impl Dwell for ThreadDwell {
    fn dwell_ms(&self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Computed wait for one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettleDelay {
    /// Wait for the spindle to slow down [ms]. Served first.
    pub spin_down_ms: u32,
    /// Wait for the spindle to speed up [ms].
    pub spin_up_ms: u32,
}

impl SettleDelay {
    /// Combined wait [ms].
    #[inline]
    pub fn total_ms(&self) -> u32 {
        self.spin_down_ms.saturating_add(self.spin_up_ms)
    }

    /// Returns true when there is nothing to wait for.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.total_ms() == 0
    }
}

/// Configured settle times and their precomputed scalers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTiming {
    spinup_ms: u32,
    spindown_ms: u32,
    /// ms per speed unit, 16.16.
    spinup_scaler: u32,
    /// ms per speed unit, 16.16.
    spindown_scaler: u32,
    max_speed: SpindleSpeed,
}

impl SettleTiming {
    /// No settling at all.
    pub const NONE: Self = Self {
        spinup_ms: 0,
        spindown_ms: 0,
        spinup_scaler: 0,
        spindown_scaler: 0,
        max_speed: 0,
    };

    /// Pre-scale the settle times against the curve's maximum speed.
    pub fn new(spinup_ms: u32, spindown_ms: u32, max_speed: SpindleSpeed) -> Self {
        Self {
            spinup_ms,
            spindown_ms,
            spinup_scaler: prescale(spinup_ms, max_speed),
            spindown_scaler: prescale(spindown_ms, max_speed),
            max_speed,
        }
    }

    /// Configured `spinup_ms`.
    pub fn spinup_ms(&self) -> u32 {
        self.spinup_ms
    }

    /// Configured `spindown_ms`.
    pub fn spindown_ms(&self) -> u32 {
        self.spindown_ms
    }

    /// Spin-up scaler, ms per speed unit in 16.16.
    pub fn spinup_scaler(&self) -> u32 {
        self.spinup_scaler
    }

    /// Spin-down scaler, ms per speed unit in 16.16.
    pub fn spindown_scaler(&self) -> u32 {
        self.spindown_scaler
    }

    /// Wait needed to go from `prev` to `next`.
    ///
    /// - same running state: up or down by the speed difference
    /// - reversal: down by the old speed, then up by the new one
    /// - from `Unknown`: the old speed is taken to be the maximum
    pub fn delay(&self, prev: SpindleStatus, next: SpindleStatus) -> SettleDelay {
        let (down, up) = speed_deltas(prev, next, self.max_speed);
        SettleDelay {
            spin_down_ms: apply_scaler(down, self.spindown_scaler),
            spin_up_ms: apply_scaler(up, self.spinup_scaler),
        }
    }
}

/// `(ms << 16) / max_speed`. A zero max speed disables the delay.
fn prescale(ms: u32, max_speed: SpindleSpeed) -> u32 {
    if max_speed == 0 {
        return 0;
    }
    let scaler = ((ms as u64) << FIXED_POINT_SHIFT) / max_speed as u64;
    u32::try_from(scaler).unwrap_or(u32::MAX)
}

/// `delta * scaler >> 16`, saturating.
#[inline]
fn apply_scaler(delta: SpindleSpeed, scaler: u32) -> u32 {
    let ms = (delta as u64 * scaler as u64) >> FIXED_POINT_SHIFT;
    u32::try_from(ms).unwrap_or(u32::MAX)
}

/// `(spin_down, spin_up)` speed deltas for a transition.
fn speed_deltas(prev: SpindleStatus, next: SpindleStatus, max_speed: SpindleSpeed) -> (u32, u32) {
    let prev_speed = match prev.state {
        SpindleState::Unknown => max_speed,
        SpindleState::Disable => 0,
        SpindleState::Cw | SpindleState::Ccw => prev.speed,
    };
    let next_speed = if next.state.is_running() { next.speed } else { 0 };

    if prev.state == next.state && next.state.is_running() {
        if next_speed >= prev_speed {
            (0, next_speed - prev_speed)
        } else {
            (prev_speed - next_speed, 0)
        }
    } else {
        (prev_speed, next_speed)
    }
}
