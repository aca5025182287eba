use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, LifecycleEvent, WindowCtx};
use crate::device::{ContextAttributes, Driver, RenderingContext, SwapOutcome};
use crate::platform::WinitWindowSource;
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub attributes: ContextAttributes,
    /// Request a redraw after every event batch instead of waiting for damage.
    pub continuous_redraw: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "ember".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            attributes: ContextAttributes::default(),
            continuous_redraw: true,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, builds a rendering context for it on the first
    /// `resumed` and drives frames until the window closes or the app exits.
    pub fn run<D, A>(config: RuntimeConfig, driver: D, app: A) -> Result<()>
    where
        D: Driver + 'static,
        A: CoreApp<D> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, driver, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Runs one frame: app callback, then swap. Skipped while the context is not ready.
///
/// `before_swap` runs between the callback and the swap.
pub(crate) fn drive_frame<D, A>(
    app: &mut A,
    rendering: &mut RenderingContext<D>,
    clock: &mut FrameClock,
    window: WindowCtx,
    before_swap: impl FnOnce(),
) -> AppControl
where
    D: Driver,
    A: CoreApp<D> + ?Sized,
{
    if !rendering.is_ready() {
        log::trace!("skipping frame in state {:?}", rendering.state());
        return AppControl::Continue;
    }

    let time = clock.tick();
    let mut ctx = FrameCtx {
        window,
        rendering: &mut *rendering,
        time,
    };
    if app.on_frame(&mut ctx) == AppControl::Exit {
        return AppControl::Exit;
    }

    before_swap();
    let outcome = rendering.swap();
    clock.record(outcome == SwapOutcome::Presented);

    match outcome {
        SwapOutcome::Presented => AppControl::Continue,
        outcome => {
            match &outcome {
                SwapOutcome::ContextLost(err) => log::error!("frame {}: {err}", time.frame_index),
                other => log::info!("frame {}: {other:?}", time.frame_index),
            }
            // A rebuilt context comes back without a window surface.
            if outcome == SwapOutcome::ContextRebuilt && !rendering.is_ready() {
                let resumed = rendering.resume();
                log::info!("reattached window surface: {resumed:?}");
            }
            app.on_lifecycle(&LifecycleEvent::Recovered(outcome), rendering)
        }
    }
}

// Field order is drop order: the context is terminated before the window goes.
struct WindowEntry<D: Driver> {
    rendering: RenderingContext<D>,
    source: WinitWindowSource,
    clock: FrameClock,
    window: Window,
}

struct AppState<D, A>
where
    D: Driver + 'static,
    A: CoreApp<D> + 'static,
{
    config: RuntimeConfig,
    driver: Option<D>,
    app: A,

    entry: Option<WindowEntry<D>>,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl<D, A> AppState<D, A>
where
    D: Driver + 'static,
    A: CoreApp<D> + 'static,
{
    fn new(config: RuntimeConfig, driver: D, app: A) -> Self {
        Self {
            config,
            driver: Some(driver),
            app,
            entry: None,
            exit_requested: false,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        self.exit(event_loop);
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let driver = self
            .driver
            .take()
            .context("rendering context already failed to initialize")?;

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let source = WinitWindowSource::new(&window)?;
        let rendering =
            RenderingContext::create_for_window(&source, self.config.attributes.clone(), driver)
                .context("failed to create rendering context")?;

        log::info!(
            "window {:?} ready, config {:?} (buffer format {:?}), EGL {:?}",
            window.id(),
            rendering.config(),
            source.buffer_format(),
            rendering.api_version()
        );

        window.request_redraw();
        self.entry = Some(WindowEntry {
            rendering,
            source,
            clock: FrameClock::default(),
            window,
        });
        Ok(())
    }

    fn dispatch(&mut self, event_loop: &ActiveEventLoop, event: LifecycleEvent) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        if self.app.on_lifecycle(&event, &mut entry.rendering) == AppControl::Exit {
            self.exit(event_loop);
        }
    }

    fn terminate(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_none() {
            return;
        }
        if let Some(entry) = self.entry.as_mut() {
            entry.rendering.terminate();
        }
        self.dispatch(event_loop, LifecycleEvent::Terminated);
        self.entry = None;
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let window_ctx = WindowCtx {
            size: entry.window.inner_size(),
            scale_factor: entry.window.scale_factor(),
        };
        let window = &entry.window;
        let control = drive_frame(
            &mut self.app,
            &mut entry.rendering,
            &mut entry.clock,
            window_ctx,
            || window.pre_present_notify(),
        );

        if control == AppControl::Exit {
            self.terminate(event_loop);
            self.exit(event_loop);
        }
    }
}

impl<D, A> ApplicationHandler for AppState<D, A>
where
    D: Driver + 'static,
    A: CoreApp<D> + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            match self.create_window_entry(event_loop) {
                Ok(()) => self.dispatch(event_loop, LifecycleEvent::Created),
                Err(err) => self.fail(event_loop, err),
            }
            return;
        };

        let outcome = entry.rendering.resume();
        if let Some(err) = outcome.recovery_error() {
            log::error!("resume left the context unusable: {err}");
        }
        entry.clock.reset();
        entry.window.request_redraw();
        self.dispatch(event_loop, LifecycleEvent::Resumed(outcome));
    }

    fn suspended(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        entry.rendering.suspend();
        self.dispatch(event_loop, LifecycleEvent::Suspended);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        if self.config.continuous_redraw {
            if let Some(entry) = self.entry.as_ref() {
                entry.window.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.entry.as_ref().is_none_or(|e| e.window.id() != window_id) {
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.terminate(event_loop);
            self.exit(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.terminate(event_loop);
                self.exit(event_loop);
            }

            WindowEvent::Resized(size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.source.set_size(size);
                    entry.window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.terminate(event_loop);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use winit::dpi::PhysicalSize;

    use super::*;
    use crate::device::sim::Call;
    use crate::device::{EglError, NativeDisplay, NativeWindow, SimDriver};

    #[derive(Default)]
    struct Recorder {
        frames: u32,
        events: Vec<LifecycleEvent>,
        exit_after: Option<u32>,
    }

    impl CoreApp<SimDriver> for Recorder {
        fn on_lifecycle(
            &mut self,
            event: &LifecycleEvent,
            _rendering: &mut RenderingContext<SimDriver>,
        ) -> AppControl {
            self.events.push(event.clone());
            AppControl::Continue
        }

        fn on_frame(&mut self, _ctx: &mut FrameCtx<'_, SimDriver>) -> AppControl {
            self.frames += 1;
            if self.exit_after == Some(self.frames) {
                AppControl::Exit
            } else {
                AppControl::Continue
            }
        }
    }

    fn window() -> WindowCtx {
        WindowCtx {
            size: PhysicalSize::new(640, 480),
            scale_factor: 1.0,
        }
    }

    fn ready() -> RenderingContext<SimDriver> {
        let mut rendering = RenderingContext::new(
            SimDriver::new(),
            NativeWindow::from_raw(0x51),
            NativeDisplay::NONE,
            ContextAttributes::default(),
        );
        rendering.init_surface().unwrap();
        rendering.init_context().unwrap();
        rendering
    }

    #[test]
    fn presented_frame_runs_callback_then_swaps() {
        let mut app = Recorder::default();
        let mut rendering = ready();
        let mut clock = FrameClock::default();
        let notified = Cell::new(false);

        let control = drive_frame(&mut app, &mut rendering, &mut clock, window(), || {
            notified.set(true)
        });

        assert_eq!(control, AppControl::Continue);
        assert_eq!(app.frames, 1);
        assert!(notified.get());
        assert_eq!(rendering.driver().count(Call::SwapBuffers), 1);
        assert_eq!(clock.presented(), 1);
        assert!(app.events.is_empty());
    }

    #[test]
    fn frames_are_skipped_while_suspended() {
        let mut app = Recorder::default();
        let mut rendering = ready();
        let mut clock = FrameClock::default();
        rendering.suspend();

        drive_frame(&mut app, &mut rendering, &mut clock, window(), || {});

        assert_eq!(app.frames, 0);
        assert_eq!(rendering.driver().count(Call::SwapBuffers), 0);
    }

    #[test]
    fn surface_loss_is_reported_as_recovery() {
        let mut app = Recorder::default();
        let mut rendering = ready();
        let mut clock = FrameClock::default();
        rendering
            .driver_mut()
            .inject(Call::SwapBuffers, EglError::BadSurface);

        drive_frame(&mut app, &mut rendering, &mut clock, window(), || {});

        assert_eq!(
            app.events,
            vec![LifecycleEvent::Recovered(SwapOutcome::SurfaceRecreated)]
        );
        assert_eq!(clock.dropped(), 1);
        assert!(rendering.is_ready());
    }

    #[test]
    fn rebuilt_context_gets_a_surface_again() {
        let mut app = Recorder::default();
        let mut rendering = ready();
        let mut clock = FrameClock::default();
        rendering
            .driver_mut()
            .inject(Call::SwapBuffers, EglError::ContextLost);

        drive_frame(&mut app, &mut rendering, &mut clock, window(), || {});

        assert_eq!(
            app.events,
            vec![LifecycleEvent::Recovered(SwapOutcome::ContextRebuilt)]
        );
        assert!(rendering.is_ready());
        assert_eq!(rendering.driver().live_surfaces(), 1);
        assert_eq!(rendering.driver().live_contexts(), 1);

        drive_frame(&mut app, &mut rendering, &mut clock, window(), || {});
        assert_eq!(app.frames, 2);
        assert_eq!(clock.presented(), 1);
    }

    #[test]
    fn exit_from_frame_skips_swap() {
        let mut app = Recorder {
            exit_after: Some(1),
            ..Recorder::default()
        };
        let mut rendering = ready();
        let mut clock = FrameClock::default();

        let control = drive_frame(&mut app, &mut rendering, &mut clock, window(), || {});

        assert_eq!(control, AppControl::Exit);
        assert_eq!(rendering.driver().count(Call::SwapBuffers), 0);
    }

    #[test]
    fn default_config_uses_default_attributes() {
        let config = RuntimeConfig::default();
        assert_eq!(config.attributes, ContextAttributes::default());
        assert!(config.continuous_redraw);
    }
}
