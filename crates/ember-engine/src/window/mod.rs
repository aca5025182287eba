//! Window + runtime loop.
//!
//! Owns the `winit` event loop and window, and maps its lifecycle callbacks
//! onto a [`RenderingContext`](crate::device::RenderingContext).

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
