//! Spindle shared types.
//!
//! Organized by domain: state and status packing, speed maps, configuration
//! schema, error types and the traits of the external collaborators
//! (output driver, tool changer, macro engine).

pub mod collaborator;
pub mod config;
pub mod error;
pub mod speed;
pub mod state;
