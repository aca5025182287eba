//! Ember engine crate.
//!
//! Owns the display, surface and rendering-context lifecycle for one native
//! window, and the `winit` runtime that drives it.

pub mod device;
pub mod platform;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
