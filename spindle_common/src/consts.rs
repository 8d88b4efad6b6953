//! System-wide constants for the spindle workspace.
//!
//! Single source of truth for numeric limits and defaults. Configuration
//! validation and the control core both read from here.

/// Minimum accepted `spinup_ms` / `spindown_ms` [ms].
pub const SETTLE_MS_MIN: u32 = 0;

/// Maximum accepted `spinup_ms` / `spindown_ms` [ms].
pub const SETTLE_MS_MAX: u32 = 60_000;

/// Highest tool number accepted by `tool_num` and tool-change requests.
pub const MAX_TOOL_NUMBER: u32 = 99_999_999;

/// Maximum number of breakpoints in a speed map.
pub const MAX_SPEED_ENTRIES: usize = 16;

/// Fractional bits of the fixed-point scalers used on the control path.
pub const FIXED_POINT_SHIFT: u32 = 16;

/// Logical maximum speed of the curve built when no `speed_map` is configured.
pub const DEFAULT_MAX_SPEED: u32 = 10_000;

/// Default PWM resolution in bits.
pub const RESOLUTION_BITS_DEFAULT: u8 = 10;

/// Minimum PWM resolution in bits.
pub const RESOLUTION_BITS_MIN: u8 = 1;

/// Maximum PWM resolution in bits.
pub const RESOLUTION_BITS_MAX: u8 = 20;

/// Default restart-state file name.
pub const DEFAULT_STATE_FILE: &str = "spindle_state";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(SETTLE_MS_MIN < SETTLE_MS_MAX);
        assert!(MAX_SPEED_ENTRIES >= 2);
        assert!(RESOLUTION_BITS_MIN <= RESOLUTION_BITS_DEFAULT);
        assert!(RESOLUTION_BITS_DEFAULT <= RESOLUTION_BITS_MAX);
    }

    #[test]
    fn settle_scaler_fits_in_u64() {
        // Worst case is a one-unit speed range: the scaler is the raw ms << 16.
        let scaler = (SETTLE_MS_MAX as u64) << FIXED_POINT_SHIFT;
        assert!(scaler <= u32::MAX as u64);
        assert!((u32::MAX as u64).checked_mul(scaler).is_some());
    }
}
