//! System libEGL, loaded at runtime through `khronos-egl`.

use khronos_egl as egl;

use super::attrib::{Attrib, AttribList};
use super::driver::Driver;
use super::error::EglError;
use super::handle::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};

type Instance = egl::DynamicInstance<egl::EGL1_4>;

/// [`Driver`] backed by the platform's EGL library.
pub struct NativeDriver {
    egl: Instance,
}

impl NativeDriver {
    /// Loads `libEGL` and resolves the EGL 1.4 entry points.
    pub fn load() -> anyhow::Result<Self> {
        // SAFETY: loading libEGL runs its initializers; nothing else is shared yet.
        let egl = unsafe { Instance::load_required() }
            .map_err(|e| anyhow::anyhow!("failed to load libEGL: {e}"))?;
        Ok(Self { egl })
    }
}

fn map_err(err: egl::Error) -> EglError {
    #[allow(unreachable_patterns)]
    match err {
        egl::Error::NotInitialized => EglError::NotInitialized,
        egl::Error::BadAccess => EglError::BadAccess,
        egl::Error::BadAlloc => EglError::BadAlloc,
        egl::Error::BadAttribute => EglError::BadAttribute,
        egl::Error::BadConfig => EglError::BadConfig,
        egl::Error::BadContext => EglError::BadContext,
        egl::Error::BadCurrentSurface => EglError::BadCurrentSurface,
        egl::Error::BadDisplay => EglError::BadDisplay,
        egl::Error::BadMatch => EglError::BadMatch,
        egl::Error::BadNativePixmap => EglError::BadNativePixmap,
        egl::Error::BadNativeWindow => EglError::BadNativeWindow,
        egl::Error::BadParameter => EglError::BadParameter,
        egl::Error::BadSurface => EglError::BadSurface,
        egl::Error::ContextLost => EglError::ContextLost,
        _ => EglError::Unknown(0),
    }
}

// Handles are the driver's own pointers; they only come back here after the
// driver produced them.
fn egl_display(d: Display) -> egl::Display {
    unsafe { egl::Display::from_ptr(d.raw() as egl::EGLDisplay) }
}

fn egl_config(c: Config) -> egl::Config {
    unsafe { egl::Config::from_ptr(c.raw() as egl::EGLConfig) }
}

fn egl_surface(s: Surface) -> Option<egl::Surface> {
    s.is_some()
        .then(|| unsafe { egl::Surface::from_ptr(s.raw() as egl::EGLSurface) })
}

fn egl_context(c: Context) -> Option<egl::Context> {
    c.is_some()
        .then(|| unsafe { egl::Context::from_ptr(c.raw() as egl::EGLContext) })
}

impl Driver for NativeDriver {
    fn get_display(&mut self, native: NativeDisplay) -> Option<Display> {
        // SAFETY: the platform layer guarantees the native display outlives this driver.
        let display = unsafe { self.egl.get_display(native.raw() as egl::NativeDisplayType) }?;
        Some(Display::from_raw(display.as_ptr() as usize))
    }

    fn initialize(&mut self, display: Display) -> Result<(i32, i32), EglError> {
        self.egl.initialize(egl_display(display)).map_err(map_err)
    }

    fn terminate(&mut self, display: Display) -> Result<(), EglError> {
        self.egl.terminate(egl_display(display)).map_err(map_err)
    }

    fn choose_config(
        &mut self,
        display: Display,
        attribs: &AttribList,
        max: usize,
    ) -> Result<Vec<Config>, EglError> {
        let mut configs = Vec::with_capacity(max);
        self.egl
            .choose_config(egl_display(display), &attribs.to_native(), &mut configs)
            .map_err(map_err)?;
        Ok(configs
            .into_iter()
            .map(|c| Config::from_raw(c.as_ptr() as usize))
            .collect())
    }

    fn config_attrib(
        &mut self,
        display: Display,
        config: Config,
        attrib: Attrib,
    ) -> Result<i32, EglError> {
        self.egl
            .get_config_attrib(egl_display(display), egl_config(config), attrib)
            .map_err(map_err)
    }

    fn create_window_surface(
        &mut self,
        display: Display,
        config: Config,
        window: NativeWindow,
    ) -> Result<Surface, EglError> {
        // SAFETY: the native window is owned by the platform layer and outlives the surface.
        let surface = unsafe {
            self.egl.create_window_surface(
                egl_display(display),
                egl_config(config),
                window.raw() as egl::NativeWindowType,
                None,
            )
        }
        .map_err(map_err)?;
        Ok(Surface::from_raw(surface.as_ptr() as usize))
    }

    fn destroy_surface(&mut self, display: Display, surface: Surface) -> Result<(), EglError> {
        let surface = egl_surface(surface).ok_or(EglError::BadSurface)?;
        self.egl
            .destroy_surface(egl_display(display), surface)
            .map_err(map_err)
    }

    fn create_context(
        &mut self,
        display: Display,
        config: Config,
        share: Context,
        attribs: &AttribList,
    ) -> Result<Context, EglError> {
        let context = self
            .egl
            .create_context(
                egl_display(display),
                egl_config(config),
                egl_context(share),
                &attribs.to_native(),
            )
            .map_err(map_err)?;
        Ok(Context::from_raw(context.as_ptr() as usize))
    }

    fn destroy_context(&mut self, display: Display, context: Context) -> Result<(), EglError> {
        let context = egl_context(context).ok_or(EglError::BadContext)?;
        self.egl
            .destroy_context(egl_display(display), context)
            .map_err(map_err)
    }

    fn make_current(
        &mut self,
        display: Display,
        draw: Surface,
        read: Surface,
        context: Context,
    ) -> Result<(), EglError> {
        self.egl
            .make_current(
                egl_display(display),
                egl_surface(draw),
                egl_surface(read),
                egl_context(context),
            )
            .map_err(map_err)
    }

    fn swap_buffers(&mut self, display: Display, surface: Surface) -> Result<(), EglError> {
        let surface = egl_surface(surface).ok_or(EglError::BadSurface)?;
        self.egl
            .swap_buffers(egl_display(display), surface)
            .map_err(map_err)
    }

    fn query_surface(
        &mut self,
        display: Display,
        surface: Surface,
        attrib: Attrib,
    ) -> Result<i32, EglError> {
        let surface = egl_surface(surface).ok_or(EglError::BadSurface)?;
        self.egl
            .query_surface(egl_display(display), surface, attrib)
            .map_err(map_err)
    }

    fn swap_interval(&mut self, display: Display, interval: i32) -> Result<(), EglError> {
        self.egl
            .swap_interval(egl_display(display), interval)
            .map_err(map_err)
    }
}
