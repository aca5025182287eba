use ember_engine::core::{App, AppControl, FrameCtx, LifecycleEvent};
use ember_engine::device::sim::Call;
use ember_engine::device::{Driver, EglError, RenderingContext, SimDriver};

/// Frames between surface-size reports.
const REPORT_EVERY: u64 = 240;

/// Counts frames and reports lifecycle transitions.
#[derive(Debug, Default)]
pub struct StudioApp {
    frames: u64,
    recoveries: u64,
}

impl StudioApp {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn recoveries(&self) -> u64 {
        self.recoveries
    }
}

impl<D: Driver> App<D> for StudioApp {
    fn on_lifecycle(
        &mut self,
        event: &LifecycleEvent,
        rendering: &mut RenderingContext<D>,
    ) -> AppControl {
        match event {
            LifecycleEvent::Created => {
                log::info!("created, format {:?}", rendering.get_format());
            }
            LifecycleEvent::Recovered(outcome) => {
                self.recoveries += 1;
                log::info!("recovered ({outcome:?}), state {:?}", rendering.state());
            }
            other => log::info!("{other:?}, state {:?}", rendering.state()),
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, D>) -> AppControl {
        self.frames += 1;
        if ctx.time.frame_index % REPORT_EVERY == 0 {
            match ctx.rendering.surface_size() {
                Ok((w, h)) => log::info!(
                    "frame {}: surface {w}x{h}, window {:?}",
                    ctx.time.frame_index,
                    ctx.window.logical_size()
                ),
                Err(err) => log::warn!("surface size unavailable: {err}"),
            }
        }
        AppControl::Continue
    }
}

/// Faults cycled through by [`ChaosApp`].
const FAULTS: [EglError; 3] = [
    EglError::BadSurface,
    EglError::ContextLost,
    EglError::BadContext,
];

/// Wraps an app running on the simulated driver. With an interval set, the
/// next swap fails every `interval` frames.
///
/// The driver's call log and recorded attribute lists are dropped every frame.
pub struct ChaosApp<A> {
    inner: A,
    interval: Option<u64>,
    injected: usize,
}

impl<A> ChaosApp<A> {
    pub fn new(inner: A, interval: Option<u64>) -> Self {
        Self {
            inner,
            interval: interval.map(|n| n.max(1)),
            injected: 0,
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: App<SimDriver>> App<SimDriver> for ChaosApp<A> {
    fn on_lifecycle(
        &mut self,
        event: &LifecycleEvent,
        rendering: &mut RenderingContext<SimDriver>,
    ) -> AppControl {
        self.inner.on_lifecycle(event, rendering)
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, SimDriver>) -> AppControl {
        let control = self.inner.on_frame(ctx);
        ctx.driver_mut().clear_calls();

        let frame = ctx.time.frame_index + 1;
        if self.interval.is_some_and(|n| frame % n == 0) {
            let fault = FAULTS[self.injected % FAULTS.len()];
            self.injected += 1;
            log::warn!("injecting {fault} into frame {}", ctx.time.frame_index);
            ctx.driver_mut().inject(Call::SwapBuffers, fault);
        }
        control
    }
}
