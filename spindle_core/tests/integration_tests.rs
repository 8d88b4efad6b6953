//! Integration tests for the spindle control core.
//!
//! These exercise configuration, switching, tool changes, persistence and the
//! interrupt path together, through the public API only.

mod integration;
