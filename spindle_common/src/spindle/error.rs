//! Error types for the spindle control core.
//!
//! Two classes exist: configuration-time failures (bad numbers, malformed
//! speed maps, unresolved tool-changer references) that keep a spindle from
//! being built, and runtime policy violations (e.g. reversing a
//! non-reversible spindle) that reject a single command. The interrupt path
//! has no error type.

use thiserror::Error;

use super::speed::Percent;
use super::state::ToolNumber;
use crate::config::ConfigError;
use crate::consts::MAX_SPEED_ENTRIES;

/// Speed-map construction error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurveError {
    /// No breakpoints.
    #[error("speed map is empty")]
    Empty,
    /// More breakpoints than the fixed table holds.
    #[error("speed map holds more than {MAX_SPEED_ENTRIES} entries")]
    TooManyEntries,
    /// Breakpoint speed does not strictly increase.
    #[error("speed map entry {index}: speed {speed} does not increase")]
    NotIncreasing { index: usize, speed: u32 },
    /// Breakpoint output is lower than the previous one.
    #[error("speed map entry {index}: output {value} decreases")]
    Decreasing { index: usize, value: u32 },
    /// Generator asked for a zero maximum speed.
    #[error("maximum speed must be greater than zero")]
    ZeroMaxSpeed,
    /// Percentage above 100 %.
    #[error("percentage {0} exceeds 100%")]
    PercentOutOfRange(Percent),
    /// Unparseable speed-map text.
    #[error("malformed speed map entry '{0}'")]
    Malformed(String),
}

/// Failure reported by an external tool changer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tool changer '{changer}' failed on tool {tool}: {reason}")]
pub struct ToolChangeError {
    /// Changer name.
    pub changer: String,
    /// Requested tool.
    pub tool: ToolNumber,
    /// Collaborator-provided reason.
    pub reason: String,
}

/// Failure reported by the macro execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("macro '{name}' failed: {reason}")]
pub struct MacroError {
    /// Macro name (`m6_macro`).
    pub name: String,
    /// Engine-provided reason.
    pub reason: String,
}

/// Spindle control error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpindleError {
    /// Counter-clockwise requested on a spindle that cannot reverse.
    #[error("spindle '{name}' is not reversible")]
    NotReversible { name: String },

    /// `Unknown` is a power-up state only.
    #[error("spindle '{name}': Unknown cannot be commanded")]
    InvalidState { name: String },

    /// Speed-map construction failed.
    #[error("spindle '{name}': {source}")]
    Curve {
        name: String,
        #[source]
        source: CurveError,
    },

    /// No backend registered under this type name.
    #[error("unknown spindle type '{0}'")]
    UnknownBackend(String),

    /// `atc` names a tool changer that does not exist.
    #[error("spindle '{spindle}' references unknown ATC '{atc}'")]
    AtcNotFound { spindle: String, atc: String },

    /// Tool number above `MAX_TOOL_NUMBER`.
    #[error("tool number {0} out of range")]
    ToolOutOfRange(ToolNumber),

    /// Tool changer rejected the request.
    #[error(transparent)]
    ToolChange(#[from] ToolChangeError),

    /// m6 macro failed.
    #[error(transparent)]
    Macro(#[from] MacroError),

    /// Restart-state save or load failed.
    #[error("state persistence error: {0}")]
    Persistence(String),

    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The spindle set is empty.
    #[error("no spindles configured")]
    NoSpindles,
}

impl SpindleError {
    /// Attach a spindle name to a curve error.
    pub fn curve(name: &str, source: CurveError) -> Self {
        Self::Curve {
            name: name.to_string(),
            source,
        }
    }
}
