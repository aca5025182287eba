use super::attrib::{self, AttribList};
use super::driver::Driver;
use super::error::{EglError, LifecycleError};
use super::frame::{LifecycleState, ResumeOutcome, SwapOutcome};
use super::handle::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};
use super::init::{ContextAttributes, SelectionPolicy};
use super::select;
use crate::platform::NativeWindowSource;

/// Context attribute list for an OpenGL ES version.
///
/// ES 3 sends the major and minor version; anything older asks for client
/// version 2 and no minor version.
pub fn context_attribs(es_major: i32, es_minor: i32) -> AttribList {
    if es_major >= 3 {
        AttribList::new()
            .with(attrib::CONTEXT_CLIENT_VERSION, es_major)
            .with(attrib::CONTEXT_MINOR_VERSION, es_minor)
    } else {
        AttribList::new().with(attrib::CONTEXT_CLIENT_VERSION, 2)
    }
}

/// Owns the display connection, chosen config, window surface and rendering
/// context for one native window, and keeps them valid across suspend/resume
/// and driver errors.
///
/// All methods must run on the thread that owns the current binding. Nothing
/// here locks; callers serialize lifecycle callbacks with the render loop.
pub struct RenderingContext<D: Driver> {
    driver: D,

    native_window: NativeWindow,
    native_display: NativeDisplay,

    display: Display,
    config: Config,
    surface: Surface,
    context: Context,

    /// `(surface, context)` last made current by this manager.
    bound: (Surface, Context),

    attributes: ContextAttributes,
    api_version: Option<(i32, i32)>,

    state: LifecycleState,
    suspended: bool,
    terminated: bool,
}

impl<D: Driver> RenderingContext<D> {
    /// Resolves the display immediately. Surface and context stay absent until
    /// [`init_surface`](Self::init_surface) and [`init_context`](Self::init_context).
    pub fn new(
        mut driver: D,
        native_window: NativeWindow,
        native_display: NativeDisplay,
        attributes: ContextAttributes,
    ) -> Self {
        let display = driver.get_display(native_display).unwrap_or(Display::NONE);
        if display.is_none() {
            log::error!("no display for {native_display:?}");
        }

        Self {
            driver,
            native_window,
            native_display,
            display,
            config: Config::NONE,
            surface: Surface::NONE,
            context: Context::NONE,
            bound: (Surface::NONE, Context::NONE),
            attributes: attributes.normalized(),
            api_version: None,
            state: LifecycleState::Uninitialized,
            suspended: false,
            terminated: false,
        }
    }

    /// Builds a ready context for a platform window.
    ///
    /// Selects a config, creates the surface, hands the config's native visual
    /// id to the platform so the window buffers match, then creates and binds
    /// the context. Any failure after the display is opened terminates.
    pub fn create_for_window<W>(
        source: &W,
        attributes: ContextAttributes,
        driver: D,
    ) -> Result<Self, LifecycleError>
    where
        W: NativeWindowSource + ?Sized,
    {
        let mut ctx = Self::new(
            driver,
            source.native_window(),
            source.native_display(),
            attributes,
        );

        log::info!("initializing window surface");
        ctx.init_surface()?;

        let format = match ctx.get_format() {
            Ok(format) => format,
            Err(err) => {
                log::error!("{err}");
                ctx.terminate();
                return Err(err);
            }
        };

        let status = source.set_buffers_geometry(format);
        if status != 0 {
            let err = LifecycleError::BuffersGeometry(status);
            log::error!("{err} (format {format})");
            ctx.terminate();
            return Err(err);
        }

        log::info!("initializing rendering context");
        if let Err(err) = ctx.init_context() {
            ctx.terminate();
            return Err(err);
        }

        Ok(ctx)
    }

    pub fn display(&self) -> Display {
        self.display
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn native_window(&self) -> NativeWindow {
        self.native_window
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Normalized attributes this manager was built with.
    pub fn attributes(&self) -> &ContextAttributes {
        &self.attributes
    }

    /// EGL version reported by the last successful display initialization.
    pub fn api_version(&self) -> Option<(i32, i32)> {
        self.api_version
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// True while a window surface exists. Says nothing about the context.
    pub fn is_ready(&self) -> bool {
        self.surface.is_some()
    }

    /// Opens the display, selects a config and creates the window surface.
    pub fn init_surface(&mut self) -> Result<(), LifecycleError> {
        let result = self.try_init_surface();
        if let Err(err) = &result {
            log::error!("{err}");
        }
        self.refresh_state();
        result
    }

    fn try_init_surface(&mut self) -> Result<(), LifecycleError> {
        self.open_display()?;

        let ContextAttributes { depth_size, es_major, antialiasing, selection, .. } =
            self.attributes.clone();

        let previous = (self.config, self.surface.is_some());
        let rebind = previous.1 && self.context.is_some() && self.bound == (self.surface, self.context);

        let result = match selection {
            SelectionPolicy::Fixed => {
                select::select_fixed(&mut self.driver, self.display, depth_size, es_major, antialiasing)
                    .and_then(|config| self.replace_surface(config))
            }
            SelectionPolicy::Scored(resolution) => select::select_scored(
                &mut self.driver,
                self.display,
                depth_size,
                es_major,
                antialiasing,
                resolution,
            )
            .and_then(|config| self.replace_surface(config)),
            SelectionPolicy::FirstCreatable => {
                // Probing needs the window free of any surface.
                self.release_surface();
                let (display, window) = (self.display, self.native_window);
                select::select_first_creatable(
                    &mut self.driver,
                    display,
                    depth_size,
                    es_major,
                    |driver, config| driver.create_window_surface(display, config, window),
                )
                .map(|(config, surface)| {
                    self.config = config;
                    self.surface = surface;
                })
            }
        };

        if let Err(err) = result {
            if previous.1 && self.surface.is_none() {
                self.restore_surface(previous.0, rebind);
            }
            return Err(err);
        }

        self.suspended = false;
        log::debug!("surface {:?} on {:?}", self.surface, self.config);
        Ok(())
    }

    /// Swaps in a surface for `config`. The old surface goes only once a
    /// config is known to exist.
    fn replace_surface(&mut self, config: Config) -> Result<(), LifecycleError> {
        self.config = config;
        self.create_surface()
    }

    /// Puts back a surface for the config that was live before a failed
    /// `init_surface`, rebinding the context if it was current.
    fn restore_surface(&mut self, config: Config, rebind: bool) {
        self.config = config;
        if let Err(err) = self.create_surface() {
            log::warn!("could not restore previous surface: {err}");
            return;
        }
        if rebind {
            if let Err(err) = self.bind(self.surface, self.context) {
                log::warn!("could not rebind previous context: {err}");
            }
        }
    }

    /// Creates a context for the selected config and binds it to the surface.
    ///
    /// A context already held is destroyed only after the new one is bound.
    /// On failure the new context is destroyed again and the old one stays.
    pub fn init_context(&mut self) -> Result<(), LifecycleError> {
        let result = self.try_init_context();
        if let Err(err) = &result {
            log::error!("{err}");
        }
        self.refresh_state();
        result
    }

    fn try_init_context(&mut self) -> Result<(), LifecycleError> {
        if self.config.is_none() {
            return Err(LifecycleError::MissingConfig);
        }
        if self.display.is_none() {
            self.open_display()?;
        }

        let attribs = context_attribs(self.attributes.es_major, self.attributes.es_minor);
        let context = self
            .driver
            .create_context(self.display, self.config, Context::NONE, &attribs)
            .map_err(LifecycleError::CreateContext)?;

        // A failed make-current leaves the previous binding in place.
        if let Err(err) = self.bind(self.surface, context) {
            if let Err(destroy_err) = self.driver.destroy_context(self.display, context) {
                log::warn!("destroy unbound context failed: {destroy_err}");
            }
            return Err(LifecycleError::MakeCurrent(err));
        }

        let old = std::mem::replace(&mut self.context, context);
        if old.is_some() {
            if let Err(err) = self.driver.destroy_context(self.display, old) {
                log::debug!("destroy context {old:?}: {err}");
            }
        }

        if let Some(interval) = self.attributes.swap_interval {
            if let Err(err) = self.driver.swap_interval(self.display, interval) {
                log::warn!("swap interval {interval} rejected: {err}");
            }
        }

        log::debug!("context {:?} current on {:?}", self.context, self.surface);
        Ok(())
    }

    /// Unbinds, destroys the current context and creates a new one.
    pub fn reinit_context(&mut self) -> Result<(), LifecycleError> {
        if self.display.is_some() {
            self.unbind();
            if self.context.is_some() {
                if let Err(err) = self.driver.destroy_context(self.display, self.context) {
                    log::warn!("destroy context failed: {err}");
                }
                self.context = Context::NONE;
            }
        }
        self.init_context()
    }

    /// Presents the surface and recovers from surface or context loss.
    pub fn swap(&mut self) -> SwapOutcome {
        if self.surface.is_none() {
            log::debug!("swap without a surface");
            return SwapOutcome::Failed(EglError::BadSurface);
        }

        let err = match self.driver.swap_buffers(self.display, self.surface) {
            Ok(()) => return SwapOutcome::Presented,
            Err(err) => err,
        };

        let outcome = match err {
            EglError::BadSurface => {
                log::warn!("surface lost ({err}), recreating");
                match self.recreate_surface() {
                    Ok(()) => SwapOutcome::SurfaceRecreated,
                    Err(e) => {
                        log::error!("{e}");
                        SwapOutcome::SurfaceUnavailable(e)
                    }
                }
            }
            e if e.is_context_loss() => {
                log::warn!("context lost ({e}), rebuilding");
                self.terminate();
                match self.init_context() {
                    Ok(()) => SwapOutcome::ContextRebuilt,
                    Err(e) => SwapOutcome::ContextLost(e),
                }
            }
            other => {
                log::error!("swap buffers failed: {other}");
                SwapOutcome::Failed(other)
            }
        };

        self.refresh_state();
        outcome
    }

    /// Releases the window surface, keeping the context and display.
    /// Does nothing when no surface exists.
    pub fn suspend(&mut self) {
        if self.surface.is_none() {
            return;
        }
        log::info!("suspending, releasing surface {:?}", self.surface);
        self.release_surface();
        self.suspended = true;
        self.refresh_state();
    }

    /// Recreates the surface and rebinds the existing context.
    ///
    /// Best-effort: if binding fails with `CONTEXT_LOST` only the context is
    /// rebuilt; any other failure terminates and initializes from scratch. The
    /// call always completes; use [`is_ready`](Self::is_ready) before rendering.
    pub fn resume(&mut self) -> ResumeOutcome {
        log::info!("resuming");

        let failure = match self.create_surface() {
            Ok(()) => match self.bind(self.surface, self.context) {
                Ok(()) => {
                    self.suspended = false;
                    self.refresh_state();
                    return ResumeOutcome::Rebound;
                }
                Err(err) => Some(err),
            },
            Err(err) => err.driver_error(),
        };

        match failure {
            Some(err) => log::warn!("unable to bind resumed surface: {err}"),
            None => log::warn!("unable to bind resumed surface"),
        }

        let outcome = if failure == Some(EglError::ContextLost) {
            log::info!("re-creating context");
            self.release_context();
            ResumeOutcome::ContextRecreated(self.init_context())
        } else {
            self.terminate();
            // Both steps always run; the first failure is reported.
            let surface = self.init_surface();
            let context = self.init_context();
            ResumeOutcome::Rebuilt(surface.and(context))
        };

        self.suspended = false;
        self.refresh_state();
        outcome
    }

    /// Unbinds, destroys context and surface, and closes the display.
    /// Idempotent: once reset, further calls make no driver calls.
    pub fn terminate(&mut self) {
        if self.display.is_some() {
            self.unbind();
            if self.context.is_some() {
                if let Err(err) = self.driver.destroy_context(self.display, self.context) {
                    log::warn!("destroy context failed: {err}");
                }
            }
            if self.surface.is_some() {
                if let Err(err) = self.driver.destroy_surface(self.display, self.surface) {
                    log::warn!("destroy surface failed: {err}");
                }
            }
            if let Err(err) = self.driver.terminate(self.display) {
                log::warn!("terminate display failed: {err}");
            }
            log::info!("display {:?} terminated", self.display);
        }

        self.display = Display::NONE;
        self.context = Context::NONE;
        self.surface = Surface::NONE;
        self.bound = (Surface::NONE, Context::NONE);
        self.suspended = false;
        self.terminated = true;
        self.refresh_state();
    }

    /// Native visual id of the selected config, for `set_buffers_geometry`.
    pub fn get_format(&mut self) -> Result<i32, LifecycleError> {
        if self.config.is_none() {
            return Err(LifecycleError::MissingConfig);
        }
        self.driver
            .config_attrib(self.display, self.config, attrib::NATIVE_VISUAL_ID)
            .map_err(LifecycleError::Query)
    }

    /// Current surface size in pixels as reported by the driver.
    pub fn surface_size(&mut self) -> Result<(i32, i32), LifecycleError> {
        if self.surface.is_none() {
            return Err(LifecycleError::Query(EglError::BadSurface));
        }
        let width = self
            .driver
            .query_surface(self.display, self.surface, attrib::WIDTH)
            .map_err(LifecycleError::Query)?;
        let height = self
            .driver
            .query_surface(self.display, self.surface, attrib::HEIGHT)
            .map_err(LifecycleError::Query)?;
        Ok((width, height))
    }

    fn open_display(&mut self) -> Result<(), LifecycleError> {
        if self.display.is_none() {
            self.display = self
                .driver
                .get_display(self.native_display)
                .filter(|d| d.is_some())
                .ok_or(LifecycleError::DisplayUnavailable)?;
        }

        let version = self
            .driver
            .initialize(self.display)
            .map_err(LifecycleError::Initialize)?;

        self.api_version = Some(version);
        self.terminated = false;
        log::debug!("display {:?} initialized, EGL {}.{}", self.display, version.0, version.1);
        Ok(())
    }

    fn create_surface(&mut self) -> Result<(), LifecycleError> {
        if self.config.is_none() {
            return Err(LifecycleError::MissingConfig);
        }
        self.release_surface();
        self.surface = self
            .driver
            .create_window_surface(self.display, self.config, self.native_window)
            .map_err(LifecycleError::CreateSurface)?;
        Ok(())
    }

    /// Replaces a lost surface using the known config and rebinds the context.
    fn recreate_surface(&mut self) -> Result<(), LifecycleError> {
        self.create_surface()?;
        if self.context.is_some() {
            self.bind(self.surface, self.context)
                .map_err(LifecycleError::MakeCurrent)?;
        }
        Ok(())
    }

    fn bind(&mut self, surface: Surface, context: Context) -> Result<(), EglError> {
        self.driver
            .make_current(self.display, surface, surface, context)?;
        self.bound = (surface, context);
        Ok(())
    }

    fn unbind(&mut self) {
        if let Err(err) = self
            .driver
            .make_current(self.display, Surface::NONE, Surface::NONE, Context::NONE)
        {
            log::warn!("release current failed: {err}");
        }
        self.bound = (Surface::NONE, Context::NONE);
    }

    fn release_surface(&mut self) {
        if self.surface.is_none() {
            return;
        }
        if self.bound.0 == self.surface {
            self.unbind();
        }
        if let Err(err) = self.driver.destroy_surface(self.display, self.surface) {
            log::debug!("destroy surface {:?}: {err}", self.surface);
        }
        self.surface = Surface::NONE;
    }

    fn release_context(&mut self) {
        if self.context.is_none() {
            return;
        }
        if self.bound.1 == self.context {
            self.unbind();
        }
        if let Err(err) = self.driver.destroy_context(self.display, self.context) {
            log::debug!("destroy context {:?}: {err}", self.context);
        }
        self.context = Context::NONE;
    }

    fn refresh_state(&mut self) {
        let has_surface = self.surface.is_some();
        let has_context = self.context.is_some();

        self.state = if has_surface && has_context && self.bound == (self.surface, self.context) {
            LifecycleState::Ready
        } else if has_surface {
            LifecycleState::SurfaceReady
        } else if has_context || (self.suspended && self.display.is_some()) {
            LifecycleState::Suspended
        } else if self.terminated {
            LifecycleState::Terminated
        } else {
            LifecycleState::Uninitialized
        };
    }
}

impl<D: Driver> Drop for RenderingContext<D> {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::device::init::CandidateResolution;
    use crate::device::sim::{Call, SimConfig, SimDriver};

    const WINDOW: NativeWindow = NativeWindow::from_raw(0xa11);

    fn manager(driver: SimDriver, attrs: ContextAttributes) -> RenderingContext<SimDriver> {
        RenderingContext::new(driver, WINDOW, NativeDisplay::NONE, attrs)
    }

    fn ready() -> RenderingContext<SimDriver> {
        let mut ctx = manager(SimDriver::new(), ContextAttributes::default());
        ctx.init_surface().unwrap();
        ctx.init_context().unwrap();
        ctx.driver_mut().clear_calls();
        ctx
    }

    #[test]
    fn init_surface_then_context_is_ready() {
        let mut ctx = manager(SimDriver::new(), ContextAttributes::default());
        assert_eq!(ctx.state(), LifecycleState::Uninitialized);
        assert!(!ctx.is_ready());

        ctx.init_surface().unwrap();
        assert_eq!(ctx.state(), LifecycleState::SurfaceReady);
        assert!(ctx.is_ready());

        ctx.init_context().unwrap();
        assert_eq!(ctx.state(), LifecycleState::Ready);
        assert_eq!(ctx.driver().current(), (ctx.surface(), ctx.context()));
        assert_eq!(ctx.api_version(), Some((1, 5)));
    }

    #[test]
    fn terminate_releases_everything() {
        let mut ctx = ready();
        ctx.terminate();
        assert!(!ctx.is_ready());
        assert_eq!(ctx.state(), LifecycleState::Terminated);
        assert_eq!(ctx.display(), Display::NONE);
        assert_eq!(ctx.context(), Context::NONE);
        assert_eq!(
            ctx.driver().calls(),
            &[Call::MakeCurrent, Call::DestroyContext, Call::DestroySurface, Call::Terminate]
        );
        assert_eq!(ctx.driver().destroyed_while_current(), 0);
    }

    #[test]
    fn second_terminate_makes_no_driver_calls() {
        let mut ctx = ready();
        ctx.terminate();
        ctx.driver_mut().clear_calls();

        ctx.terminate();
        assert!(ctx.driver().calls().is_empty());
        assert_eq!(ctx.display(), Display::NONE);
        assert_eq!(ctx.surface(), Surface::NONE);
        assert_eq!(ctx.context(), Context::NONE);
    }

    #[test]
    fn suspend_without_surface_is_a_no_op() {
        let mut ctx = manager(SimDriver::new(), ContextAttributes::default());
        ctx.driver_mut().clear_calls();
        ctx.suspend();
        assert!(ctx.driver().calls().is_empty());
        assert_eq!(ctx.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn suspend_keeps_context_and_display() {
        let mut ctx = ready();
        let context = ctx.context();
        ctx.suspend();

        assert_eq!(ctx.state(), LifecycleState::Suspended);
        assert!(!ctx.is_ready());
        assert_eq!(ctx.context(), context);
        assert!(ctx.display().is_some());
        assert_eq!(ctx.driver().live_surfaces(), 0);
        assert_eq!(ctx.driver().destroyed_while_current(), 0);
    }

    #[test]
    fn resume_rebinds_existing_context() {
        let mut ctx = ready();
        let (old_surface, context) = (ctx.surface(), ctx.context());
        ctx.suspend();

        assert_eq!(ctx.resume(), ResumeOutcome::Rebound);
        assert_eq!(ctx.state(), LifecycleState::Ready);
        assert_ne!(ctx.surface(), old_surface);
        assert_eq!(ctx.context(), context);
        assert_eq!(ctx.driver().count(Call::CreateContext), 0);
    }

    #[test]
    fn resume_after_context_loss_recreates_only_the_context() {
        let mut ctx = ready();
        let context = ctx.context();
        ctx.suspend();
        ctx.driver_mut().inject(Call::MakeCurrent, EglError::ContextLost);

        assert_eq!(ctx.resume(), ResumeOutcome::ContextRecreated(Ok(())));
        let surface = ctx.surface();
        assert!(surface.is_some());
        assert_ne!(ctx.context(), context);
        assert_eq!(ctx.state(), LifecycleState::Ready);
        assert_eq!(ctx.driver().count(Call::CreateWindowSurface), 1);
        assert_eq!(ctx.driver().count(Call::Terminate), 0);
        assert_eq!(ctx.driver().live_contexts(), 1);
        assert_eq!(ctx.driver().current(), (surface, ctx.context()));
    }

    #[test]
    fn resume_with_other_bind_failure_rebuilds_from_scratch() {
        let mut ctx = ready();
        ctx.suspend();
        ctx.driver_mut().inject(Call::MakeCurrent, EglError::BadAlloc);

        let outcome = ctx.resume();
        assert_eq!(outcome, ResumeOutcome::Rebuilt(Ok(())));
        assert!(ctx.is_ready());
        assert_eq!(ctx.state(), LifecycleState::Ready);
        assert_eq!(ctx.driver().count(Call::Terminate), 1);
        assert_eq!(ctx.driver().count(Call::Initialize), 1);
        assert_eq!(ctx.driver().live_surfaces(), 1);
    }

    #[test]
    fn resume_reports_completion_even_when_rebuild_fails() {
        let mut ctx = ready();
        ctx.suspend();
        ctx.driver_mut().inject(Call::MakeCurrent, EglError::BadAlloc);
        ctx.driver_mut().fail_always(Call::ChooseConfig, EglError::BadAlloc);

        let outcome = ctx.resume();
        assert!(matches!(
            outcome,
            ResumeOutcome::Rebuilt(Err(LifecycleError::NoMatchingConfig(Some(EglError::BadAlloc))))
        ));
        assert!(outcome.recovery_error().is_some());
        assert!(!ctx.is_ready());
        // The context step still ran after the surface step failed.
        assert_eq!(ctx.driver().count(Call::CreateContext), 1);
        assert!(ctx.context().is_some());
    }

    #[test]
    fn resume_before_any_init_takes_rebuild_path() {
        let mut ctx = manager(SimDriver::new(), ContextAttributes::default());
        assert_eq!(ctx.resume(), ResumeOutcome::Rebuilt(Ok(())));
        assert_eq!(ctx.state(), LifecycleState::Ready);
    }

    #[test]
    fn swap_presents_without_state_change() {
        let mut ctx = ready();
        assert_eq!(ctx.swap(), SwapOutcome::Presented);
        assert_eq!(ctx.driver().calls(), &[Call::SwapBuffers]);
        assert_eq!(ctx.state(), LifecycleState::Ready);
    }

    #[test]
    fn swap_bad_surface_recreates_surface_only() {
        let mut ctx = ready();
        let (old_surface, context) = (ctx.surface(), ctx.context());
        ctx.driver_mut().inject(Call::SwapBuffers, EglError::BadSurface);

        let outcome = ctx.swap();
        assert_eq!(outcome, SwapOutcome::SurfaceRecreated);
        assert!(outcome.context_usable());
        assert_ne!(ctx.surface(), old_surface);
        assert_eq!(ctx.context(), context);
        assert_eq!(ctx.driver().live_surfaces(), 1);
        assert_eq!(ctx.driver().count(Call::DestroySurface), 1);
        assert_eq!(ctx.driver().count(Call::ChooseConfig), 0);
        assert_eq!(ctx.driver().current(), (ctx.surface(), context));
        assert_eq!(ctx.driver().destroyed_while_current(), 0);
        assert_eq!(ctx.state(), LifecycleState::Ready);
    }

    #[test]
    fn swap_bad_surface_with_failed_recreation_stays_usable() {
        let mut ctx = ready();
        ctx.driver_mut().inject(Call::SwapBuffers, EglError::BadSurface);
        ctx.driver_mut().inject(Call::CreateWindowSurface, EglError::BadNativeWindow);

        let outcome = ctx.swap();
        assert_eq!(
            outcome,
            SwapOutcome::SurfaceUnavailable(LifecycleError::CreateSurface(EglError::BadNativeWindow))
        );
        assert!(outcome.context_usable());
        assert!(!ctx.is_ready());
        assert!(ctx.context().is_some());
    }

    #[test]
    fn swap_context_lost_tears_down_and_creates_new_context() {
        let mut ctx = ready();
        let context = ctx.context();
        ctx.driver_mut().inject(Call::SwapBuffers, EglError::ContextLost);

        let outcome = ctx.swap();
        assert_eq!(outcome, SwapOutcome::ContextRebuilt);
        assert!(!outcome.context_usable());
        assert_eq!(ctx.driver().count(Call::Terminate), 1);
        assert_eq!(ctx.driver().count(Call::CreateContext), 1);
        assert!(ctx.context().is_some());
        assert_ne!(ctx.context(), context);
        assert_eq!(ctx.surface(), Surface::NONE);
        assert!(!ctx.is_ready());
        assert_eq!(ctx.state(), LifecycleState::Suspended);
    }

    #[test]
    fn swap_bad_context_without_surfaceless_support_reports_loss() {
        let mut ctx = manager(SimDriver::new().surfaceless(false), ContextAttributes::default());
        ctx.init_surface().unwrap();
        ctx.init_context().unwrap();
        ctx.driver_mut().inject(Call::SwapBuffers, EglError::BadContext);

        let outcome = ctx.swap();
        assert_eq!(outcome, SwapOutcome::ContextLost(LifecycleError::MakeCurrent(EglError::BadMatch)));
        assert_eq!(ctx.context(), Context::NONE);
        assert_eq!(ctx.driver().live_contexts(), 0);
        assert!(!ctx.is_ready());
    }

    #[test]
    fn swap_other_error_is_not_recovered() {
        let mut ctx = ready();
        let surface = ctx.surface();
        ctx.driver_mut().inject(Call::SwapBuffers, EglError::BadAlloc);

        assert_eq!(ctx.swap(), SwapOutcome::Failed(EglError::BadAlloc));
        assert_eq!(ctx.surface(), surface);
        assert_eq!(ctx.driver().calls(), &[Call::SwapBuffers]);
    }

    #[test]
    fn swap_while_suspended_does_not_touch_driver() {
        let mut ctx = ready();
        ctx.suspend();
        ctx.driver_mut().clear_calls();
        assert_eq!(ctx.swap(), SwapOutcome::Failed(EglError::BadSurface));
        assert!(ctx.driver().calls().is_empty());
    }

    #[test]
    fn init_surface_failure_keeps_prior_state() {
        let mut ctx = manager(SimDriver::new(), ContextAttributes::default());
        ctx.driver_mut().inject(Call::Initialize, EglError::NotInitialized);
        assert_eq!(
            ctx.init_surface(),
            Err(LifecycleError::Initialize(EglError::NotInitialized))
        );
        assert_eq!(ctx.state(), LifecycleState::Uninitialized);

        let mut ctx = manager(SimDriver::with_configs(Vec::new()), ContextAttributes::default());
        assert_eq!(ctx.init_surface(), Err(LifecycleError::NoMatchingConfig(None)));
        assert_eq!(ctx.state(), LifecycleState::Uninitialized);
        assert_eq!(ctx.surface(), Surface::NONE);
    }

    #[test]
    fn failed_selection_on_ready_manager_keeps_surface() {
        let mut ctx = ready();
        let (surface, config, context) = (ctx.surface(), ctx.config(), ctx.context());
        ctx.driver_mut().inject(Call::ChooseConfig, EglError::BadAlloc);
        ctx.driver_mut().inject(Call::ChooseConfig, EglError::BadAlloc);

        assert_eq!(
            ctx.init_surface(),
            Err(LifecycleError::NoMatchingConfig(Some(EglError::BadAlloc)))
        );
        assert_eq!(ctx.state(), LifecycleState::Ready);
        assert_eq!((ctx.surface(), ctx.config(), ctx.context()), (surface, config, context));
        assert_eq!(ctx.driver().current(), (surface, context));
        assert_eq!(ctx.driver().count(Call::DestroySurface), 0);
    }

    #[test]
    fn failed_surface_creation_on_ready_manager_restores_surface() {
        let mut ctx = ready();
        let (config, context) = (ctx.config(), ctx.context());
        ctx.driver_mut().inject(Call::CreateWindowSurface, EglError::BadNativeWindow);

        assert_eq!(
            ctx.init_surface(),
            Err(LifecycleError::CreateSurface(EglError::BadNativeWindow))
        );
        assert_eq!(ctx.state(), LifecycleState::Ready);
        assert_eq!(ctx.config(), config);
        assert_eq!(ctx.driver().current(), (ctx.surface(), context));
        assert_eq!(ctx.driver().live_surfaces(), 1);
        assert_eq!(ctx.driver().destroyed_while_current(), 0);
    }

    #[test]
    fn first_creatable_failure_restores_previous_surface() {
        let attrs = ContextAttributes::default().with_selection(SelectionPolicy::FirstCreatable);
        let mut ctx = manager(SimDriver::new(), attrs);
        ctx.init_surface().unwrap();
        ctx.init_context().unwrap();
        let (config, context) = (ctx.config(), ctx.context());

        ctx.driver_mut().fail_always(Call::ChooseConfig, EglError::BadAlloc);
        assert!(ctx.init_surface().is_err());
        assert_eq!(ctx.state(), LifecycleState::Ready);
        assert_eq!(ctx.config(), config);
        assert_eq!(ctx.driver().current(), (ctx.surface(), context));
    }

    #[test]
    fn failed_context_creation_keeps_live_context() {
        let mut ctx = ready();
        let context = ctx.context();
        ctx.driver_mut().inject(Call::CreateContext, EglError::BadAlloc);

        assert_eq!(ctx.init_context(), Err(LifecycleError::CreateContext(EglError::BadAlloc)));
        assert_eq!(ctx.context(), context);
        assert_eq!(ctx.state(), LifecycleState::Ready);
        assert_eq!(ctx.driver().current(), (ctx.surface(), context));
    }

    #[test]
    fn failed_bind_on_ready_manager_keeps_live_context() {
        let mut ctx = ready();
        let context = ctx.context();
        ctx.driver_mut().inject(Call::MakeCurrent, EglError::BadMatch);

        assert_eq!(ctx.init_context(), Err(LifecycleError::MakeCurrent(EglError::BadMatch)));
        assert_eq!(ctx.context(), context);
        assert_eq!(ctx.driver().live_contexts(), 1);
        assert_eq!(ctx.state(), LifecycleState::Ready);
    }

    #[test]
    fn init_context_replaces_context_after_binding_new_one() {
        let mut ctx = ready();
        let old = ctx.context();
        ctx.init_context().unwrap();

        assert_ne!(ctx.context(), old);
        assert_eq!(ctx.driver().live_contexts(), 1);
        assert_eq!(ctx.driver().destroyed_while_current(), 0);
        assert_eq!(ctx.state(), LifecycleState::Ready);
    }

    #[test]
    fn init_surface_keeps_config_when_surface_creation_fails() {
        let mut ctx = manager(SimDriver::new(), ContextAttributes::default());
        ctx.driver_mut().inject(Call::CreateWindowSurface, EglError::BadNativeWindow);
        assert_eq!(
            ctx.init_surface(),
            Err(LifecycleError::CreateSurface(EglError::BadNativeWindow))
        );
        assert!(ctx.config().is_some());
        assert!(!ctx.is_ready());
        ctx.init_surface().unwrap();
        assert!(ctx.is_ready());
    }

    #[test]
    fn missing_display_fails_init() {
        let mut ctx = manager(SimDriver::new().without_display(), ContextAttributes::default());
        assert_eq!(ctx.display(), Display::NONE);
        assert_eq!(ctx.init_surface(), Err(LifecycleError::DisplayUnavailable));
    }

    #[test]
    fn init_context_requires_config() {
        let mut ctx = manager(SimDriver::new(), ContextAttributes::default());
        assert_eq!(ctx.init_context(), Err(LifecycleError::MissingConfig));
    }

    #[test]
    fn failed_bind_destroys_new_context() {
        let mut ctx = manager(SimDriver::new(), ContextAttributes::default());
        ctx.init_surface().unwrap();
        ctx.driver_mut().inject(Call::MakeCurrent, EglError::BadMatch);

        assert_eq!(ctx.init_context(), Err(LifecycleError::MakeCurrent(EglError::BadMatch)));
        assert_eq!(ctx.context(), Context::NONE);
        assert_eq!(ctx.driver().live_contexts(), 0);
        assert_eq!(ctx.state(), LifecycleState::SurfaceReady);
    }

    #[test]
    fn context_attribs_follow_es_version() {
        assert_eq!(
            context_attribs(2, 0).to_native(),
            vec![attrib::CONTEXT_CLIENT_VERSION, 2, attrib::NONE]
        );
        assert_eq!(
            context_attribs(3, 1).to_native(),
            vec![attrib::CONTEXT_CLIENT_VERSION, 3, attrib::CONTEXT_MINOR_VERSION, 1, attrib::NONE]
        );

        let mut ctx = manager(SimDriver::new(), ContextAttributes::new(24, 3, 2));
        ctx.init_surface().unwrap();
        ctx.init_context().unwrap();
        assert_eq!(ctx.driver().context_attribs()[0], context_attribs(3, 2));
    }

    #[test]
    fn reinit_context_replaces_context() {
        let mut ctx = ready();
        let old = ctx.context();
        ctx.reinit_context().unwrap();

        assert_ne!(ctx.context(), old);
        assert_eq!(ctx.driver().calls()[0], Call::MakeCurrent);
        assert_eq!(ctx.driver().live_contexts(), 1);
        assert_eq!(ctx.state(), LifecycleState::Ready);
    }

    #[test]
    fn swap_interval_applied_after_bind() {
        let attrs = ContextAttributes::default().with_swap_interval(0);
        let mut ctx = manager(SimDriver::new(), attrs);
        ctx.init_surface().unwrap();
        ctx.init_context().unwrap();
        assert_eq!(ctx.driver().swap_interval_value(), Some(0));
    }

    #[test]
    fn surface_size_reads_driver() {
        let mut ctx = ready();
        ctx.driver_mut().set_window_size(640, 480);
        assert_eq!(ctx.surface_size(), Ok((640, 480)));
        ctx.suspend();
        assert!(ctx.surface_size().is_err());
    }

    #[test]
    fn fixed_and_first_creatable_policies() {
        let attrs = ContextAttributes::new(24, 2, 0)
            .with_antialiasing(false)
            .with_selection(SelectionPolicy::Fixed);
        let mut ctx = manager(SimDriver::with_configs(vec![SimConfig::rgb565()]), attrs);
        ctx.init_surface().unwrap();
        assert_eq!(ctx.config(), SimDriver::config_handle(0));

        // Antialiasing asks for sample buffers on both attempts.
        let attrs = ContextAttributes::new(24, 2, 0).with_selection(SelectionPolicy::Fixed);
        let mut ctx = manager(SimDriver::with_configs(vec![SimConfig::rgb565()]), attrs);
        assert_eq!(ctx.init_surface(), Err(LifecycleError::NoMatchingConfig(None)));
        assert_eq!(ctx.state(), LifecycleState::Uninitialized);

        let attrs = ContextAttributes::default().with_selection(SelectionPolicy::FirstCreatable);
        let mut ctx = manager(SimDriver::new(), attrs);
        ctx.driver_mut().inject(Call::CreateWindowSurface, EglError::BadMatch);
        ctx.init_surface().unwrap();
        // 16-bit candidate first; the first 5/6/5-or-better config was refused.
        assert_eq!(ctx.config(), SimDriver::config_handle(1));
        assert!(ctx.is_ready());
    }

    #[test]
    fn preferred_first_resolution_through_manager() {
        let attrs = ContextAttributes::new(32, 2, 0)
            .with_selection(SelectionPolicy::Scored(CandidateResolution::PreferredFirst));
        let mut ctx = manager(SimDriver::new(), attrs);
        ctx.init_surface().unwrap();
        assert_eq!(ctx.config(), SimDriver::config_handle(1));
    }

    struct FakeWindow {
        status: i32,
        format: Cell<Option<i32>>,
    }

    impl NativeWindowSource for FakeWindow {
        fn native_display(&self) -> NativeDisplay {
            NativeDisplay::NONE
        }

        fn native_window(&self) -> NativeWindow {
            WINDOW
        }

        fn set_buffers_geometry(&self, format: i32) -> i32 {
            self.format.set(Some(format));
            self.status
        }

        fn window_size(&self) -> (u32, u32) {
            (800, 600)
        }
    }

    #[test]
    fn create_for_window_sets_buffer_format() {
        let window = FakeWindow { status: 0, format: Cell::new(None) };
        let ctx = RenderingContext::create_for_window(
            &window,
            ContextAttributes::default(),
            SimDriver::new(),
        )
        .unwrap();

        // Default request is 16 bits with antialiasing: the 32-bit candidate
        // runs last and its multisampled 8/8/8 config (visual id 2) wins.
        assert_eq!(window.format.get(), Some(2));
        assert_eq!(ctx.state(), LifecycleState::Ready);
    }

    #[test]
    fn create_for_window_fails_on_geometry_status() {
        let window = FakeWindow { status: -1, format: Cell::new(None) };
        let result = RenderingContext::create_for_window(
            &window,
            ContextAttributes::default(),
            SimDriver::new(),
        );
        assert!(matches!(result, Err(LifecycleError::BuffersGeometry(-1))));
    }

    #[test]
    fn lifecycle_sequence_never_destroys_bound_handles() {
        let mut ctx = ready();
        ctx.suspend();
        ctx.resume();
        ctx.driver_mut().inject(Call::SwapBuffers, EglError::BadSurface);
        ctx.swap();
        ctx.reinit_context().unwrap();
        ctx.init_surface().unwrap();
        ctx.terminate();
        assert_eq!(ctx.driver().destroyed_while_current(), 0);
    }
}
