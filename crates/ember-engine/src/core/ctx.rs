use winit::dpi::PhysicalSize;

use crate::device::{Driver, RenderingContext};
use crate::time::FrameTime;

/// Window metadata for the frame being drawn.
#[derive(Debug, Copy, Clone)]
pub struct WindowCtx {
    pub size: PhysicalSize<u32>,
    pub scale_factor: f64,
}

impl WindowCtx {
    /// Window size in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let logical = self.size.to_logical::<f64>(self.scale_factor);
        (logical.width as f32, logical.height as f32)
    }
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// The rendering context is current on the calling thread for the duration of
/// the callback. The runtime swaps after the callback returns.
pub struct FrameCtx<'a, D: Driver> {
    pub window: WindowCtx,
    pub rendering: &'a mut RenderingContext<D>,
    pub time: FrameTime,
}

impl<D: Driver> FrameCtx<'_, D> {
    pub fn driver_mut(&mut self) -> &mut D {
        self.rendering.driver_mut()
    }
}
