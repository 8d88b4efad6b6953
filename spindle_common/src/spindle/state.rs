//! Spindle state enum, status packing and capability flags.
//!
//! `SpindleState` uses `#[repr(u8)]` so that a `(state, speed)` pair packs
//! into a single `u64` word. The control core stores that word in one atomic,
//! which is what keeps the interrupt context from ever seeing a half-updated
//! pair.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// Logical spindle speed (RPM for motors, power units for lasers).
pub type SpindleSpeed = u32;

/// Tool number as carried by T words.
pub type ToolNumber = u32;

/// Spindle run state.
///
/// `Unknown` is the power-up value and is never re-entered once left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum SpindleState {
    /// State not yet commanded since power-up.
    #[default]
    Unknown = 0,
    /// Output off.
    Disable = 1,
    /// Clockwise (M3).
    Cw = 2,
    /// Counter-clockwise (M4).
    Ccw = 3,
}

impl SpindleState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::Disable),
            2 => Some(Self::Cw),
            3 => Some(Self::Ccw),
            _ => None,
        }
    }

    /// Returns true for the two running states.
    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Cw | Self::Ccw)
    }
}

const_assert!(core::mem::size_of::<SpindleSpeed>() <= 4);
const_assert!(core::mem::size_of::<SpindleState>() == 1);

/// Snapshot of the `(state, speed)` pair shared with the interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SpindleStatus {
    /// Commanded state.
    pub state: SpindleState,
    /// Commanded logical speed.
    pub speed: SpindleSpeed,
}

impl SpindleStatus {
    /// Status reported before the first command.
    pub const POWER_UP: Self = Self::new(SpindleState::Unknown, 0);

    /// Create a status pair.
    #[inline]
    pub const fn new(state: SpindleState, speed: SpindleSpeed) -> Self {
        Self { state, speed }
    }

    /// Pack into one word: state in bits 32..40, speed in bits 0..32.
    #[inline]
    pub const fn pack(self) -> u64 {
        ((self.state as u64) << 32) | self.speed as u64
    }

    /// Inverse of [`pack`](Self::pack). Unrecognised state bits decode as
    /// `Unknown`.
    #[inline]
    pub const fn unpack(raw: u64) -> Self {
        let state = match SpindleState::from_u8((raw >> 32) as u8) {
            Some(state) => state,
            None => SpindleState::Unknown,
        };
        Self {
            state,
            speed: raw as u32,
        }
    }
}

bitflags! {
    /// Capabilities a spindle backend reports to the core.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpindleCapabilities: u8 {
        /// Can run counter-clockwise.
        const REVERSIBLE    = 0x01;
        /// Output follows the feed rate (laser M4 mode).
        const RATE_ADJUSTED = 0x02;
        /// Honours `spinup_ms` / `spindown_ms`.
        const SETTLE_DELAY  = 0x04;
    }
}

impl Default for SpindleCapabilities {
    fn default() -> Self {
        Self::SETTLE_DELAY
    }
}
