//! Spindle Common Library
//!
//! Shared constants, configuration loading and the spindle data model used by
//! the spindle control core and its host tooling.
//!
//! # Module Structure
//!
//! - [`consts`] - Numeric limits and defaults
//! - [`config`] - Configuration loading traits and types
//! - [`spindle`] - Spindle state, speed maps, configuration schema and
//!   collaborator traits
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use spindle_common::prelude::*;
//!
//! let status = SpindleStatus::new(SpindleState::Cw, 1200);
//! assert_eq!(SpindleStatus::unpack(status.pack()), status);
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod spindle;
