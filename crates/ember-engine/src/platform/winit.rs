use std::cell::Cell;

use anyhow::{Context as _, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::NativeWindowSource;
use crate::device::{NativeDisplay, NativeWindow};

/// Native handles captured from a `winit` window.
///
/// The window must outlive every surface created from this source.
#[derive(Debug)]
pub struct WinitWindowSource {
    window: NativeWindow,
    display: NativeDisplay,
    size: PhysicalSize<u32>,
    buffer_format: Cell<Option<i32>>,
}

impl WinitWindowSource {
    pub fn new(window: &Window) -> Result<Self> {
        let raw_window = window
            .window_handle()
            .context("window handle unavailable")?
            .as_raw();
        let raw_display = window
            .display_handle()
            .context("display handle unavailable")?
            .as_raw();

        let native_window = native_window(raw_window)
            .with_context(|| format!("no EGL native window for {raw_window:?}"))?;
        let native_display = native_display(raw_display)
            .with_context(|| format!("no EGL native display for {raw_display:?}"))?;

        Ok(Self {
            window: native_window,
            display: native_display,
            size: window.inner_size(),
            buffer_format: Cell::new(None),
        })
    }

    /// Tracks the window size after a resize event.
    pub fn set_size(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
    }

    /// Last format passed to [`NativeWindowSource::set_buffers_geometry`].
    pub fn buffer_format(&self) -> Option<i32> {
        self.buffer_format.get()
    }
}

impl NativeWindowSource for WinitWindowSource {
    fn native_display(&self) -> NativeDisplay {
        self.display
    }

    fn native_window(&self) -> NativeWindow {
        self.window
    }

    fn set_buffers_geometry(&self, format: i32) -> i32 {
        // Desktop window systems pick the visual at surface creation; only the
        // format is recorded here.
        log::debug!("buffer format {format}");
        self.buffer_format.set(Some(format));
        0
    }

    fn window_size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }
}

/// EGL native window for a raw window handle. Wayland needs a `wl_egl_window`
/// rather than the bare surface, so it is not mapped.
fn native_window(handle: RawWindowHandle) -> Option<NativeWindow> {
    let raw = match handle {
        RawWindowHandle::Xlib(h) => h.window as usize,
        RawWindowHandle::Xcb(h) => h.window.get() as usize,
        RawWindowHandle::Win32(h) => h.hwnd.get() as usize,
        RawWindowHandle::AndroidNdk(h) => h.a_native_window.as_ptr() as usize,
        _ => return None,
    };
    Some(NativeWindow::from_raw(raw))
}

/// EGL native display for a raw display handle. `NONE` is `EGL_DEFAULT_DISPLAY`.
fn native_display(handle: RawDisplayHandle) -> Option<NativeDisplay> {
    let raw = match handle {
        RawDisplayHandle::Xlib(h) => h.display.map_or(0, |p| p.as_ptr() as usize),
        RawDisplayHandle::Xcb(_) | RawDisplayHandle::Windows(_) | RawDisplayHandle::Android(_) => 0,
        _ => return None,
    };
    Some(NativeDisplay::from_raw(raw))
}
