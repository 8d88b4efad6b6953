//! Spindle control core.
//!
//! Turns logical spindle commands into device output values:
//!
//! - [`curve`]: integer speed curves (shelf and linear)
//! - [`spindle`]: the per-spindle state machine and settling delay
//! - [`switch`]: which spindle serves a requested tool
//! - [`atc`]: tool-changer binding and tool bookkeeping
//! - [`interrupt`]: the lock-free entry point for the real-time context
//! - [`registry`]: the configured spindle set and the active spindle
//! - [`persist`]: restart-state snapshots
//!
//! Output hardware, tool changers and the macro engine are reached through
//! the collaborator traits in `spindle_common::spindle::collaborator`.

pub mod atc;
pub mod backend;
pub mod backend_registry;
pub mod backends;
pub mod config;
pub mod curve;
pub mod delay;
pub mod interrupt;
pub mod persist;
pub mod registry;
pub mod spindle;
pub mod status;
pub mod switch;

pub use config::{SpindleSetBuilder, load_config, load_config_from_str};
pub use interrupt::InterruptSpeedPath;
pub use registry::ActiveSpindleRegistry;
pub use spindle::SpindleCore;
