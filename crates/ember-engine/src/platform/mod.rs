//! Platform window-system glue.
//!
//! The lifecycle manager only needs opaque handles and a way to match the
//! window's buffer format to the chosen config; [`NativeWindowSource`] is that
//! contract. [`WinitWindowSource`] implements it for a `winit` window.

mod winit;

pub use self::winit::WinitWindowSource;

use crate::device::{NativeDisplay, NativeWindow};

/// Supplies native handles and buffer-format control for one platform window.
pub trait NativeWindowSource {
    fn native_display(&self) -> NativeDisplay;

    fn native_window(&self) -> NativeWindow;

    /// Reconfigures the window buffers for a config's native visual id.
    /// Returns `0` on success and a platform status code otherwise.
    fn set_buffers_geometry(&self, format: i32) -> i32;

    /// Window size in physical pixels.
    fn window_size(&self) -> (u32, u32);
}
