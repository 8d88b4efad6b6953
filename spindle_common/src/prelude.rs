//! Prelude module for common re-exports.
//!
//! ```rust
//! use spindle_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::spindle::config::{AtcConfig, SpindleConfig, SpindleMachineConfig};

// ─── Spindle Model ──────────────────────────────────────────────────
pub use crate::spindle::collaborator::{Direction, MacroRunner, OutputDriver, ToolChanger};
pub use crate::spindle::error::{CurveError, MacroError, SpindleError, ToolChangeError};
pub use crate::spindle::speed::{CurveKind, Percent, SpeedMap, SpeedMapEntry};
pub use crate::spindle::state::{
    SpindleCapabilities, SpindleSpeed, SpindleState, SpindleStatus, ToolNumber,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{MAX_SPEED_ENTRIES, MAX_TOOL_NUMBER};
