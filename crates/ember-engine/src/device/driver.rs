use super::attrib::{Attrib, AttribList};
use super::error::EglError;
use super::handle::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};

/// The foreign display/surface/context API consumed by the lifecycle manager.
///
/// Every method reports the driver's error for *that* call. Implementations must
/// read the thread-global error state immediately after the native call, so a
/// later unrelated call never observes a stale code.
///
/// Handles passed back in are the ones this driver produced; `NONE` arguments
/// mean "no object" exactly as in EGL (e.g. unbinding with `make_current`).
pub trait Driver {
    /// Resolves the display for a native display handle. `None` when unavailable.
    fn get_display(&mut self, native: NativeDisplay) -> Option<Display>;

    /// Opens the display connection and returns the implementation's `(major, minor)`.
    fn initialize(&mut self, display: Display) -> Result<(i32, i32), EglError>;

    fn terminate(&mut self, display: Display) -> Result<(), EglError>;

    /// Returns at most `max` matching configs, best first in driver order.
    fn choose_config(
        &mut self,
        display: Display,
        attribs: &AttribList,
        max: usize,
    ) -> Result<Vec<Config>, EglError>;

    fn config_attrib(
        &mut self,
        display: Display,
        config: Config,
        attrib: Attrib,
    ) -> Result<i32, EglError>;

    fn create_window_surface(
        &mut self,
        display: Display,
        config: Config,
        window: NativeWindow,
    ) -> Result<Surface, EglError>;

    fn destroy_surface(&mut self, display: Display, surface: Surface) -> Result<(), EglError>;

    fn create_context(
        &mut self,
        display: Display,
        config: Config,
        share: Context,
        attribs: &AttribList,
    ) -> Result<Context, EglError>;

    fn destroy_context(&mut self, display: Display, context: Context) -> Result<(), EglError>;

    fn make_current(
        &mut self,
        display: Display,
        draw: Surface,
        read: Surface,
        context: Context,
    ) -> Result<(), EglError>;

    fn swap_buffers(&mut self, display: Display, surface: Surface) -> Result<(), EglError>;

    fn query_surface(
        &mut self,
        display: Display,
        surface: Surface,
        attrib: Attrib,
    ) -> Result<i32, EglError>;

    fn swap_interval(&mut self, display: Display, interval: i32) -> Result<(), EglError>;
}
