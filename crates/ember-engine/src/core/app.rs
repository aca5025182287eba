use winit::event::WindowEvent;

use crate::device::{Driver, RenderingContext, ResumeOutcome, SwapOutcome};

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Lifecycle transitions the runtime reports to the app.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LifecycleEvent {
    /// Surface and context were created for the window.
    Created,
    /// The surface was released; the context is kept.
    Suspended,
    Resumed(ResumeOutcome),
    /// A swap that did not simply present.
    Recovered(SwapOutcome),
    /// Everything was released ahead of exit.
    Terminated,
}

/// Application contract implemented by higher layers.
pub trait App<D: Driver> {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called after each lifecycle transition, with the context in its new state.
    fn on_lifecycle(
        &mut self,
        event: &LifecycleEvent,
        rendering: &mut RenderingContext<D>,
    ) -> AppControl {
        let _ = (event, rendering);
        AppControl::Continue
    }

    /// Called once per redraw while the context is ready, before the swap.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, D>) -> AppControl;
}
