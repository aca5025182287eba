use super::error::{EglError, LifecycleError};

/// Lifecycle position of a [`RenderingContext`](super::RenderingContext).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LifecycleState {
    /// Display resolved, nothing created yet.
    Uninitialized,
    /// Config chosen and window surface created; no context bound.
    SurfaceReady,
    /// Surface and context both valid and current.
    Ready,
    /// Context and display retained, no surface.
    Suspended,
    /// Everything released. Inert until `init_surface` runs again.
    Terminated,
}

/// Result of presenting a frame.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SwapOutcome {
    Presented,
    /// The surface was lost and recreated in place; the frame was dropped.
    SurfaceRecreated,
    /// The surface was lost and could not be recreated. The context is still usable.
    SurfaceUnavailable(LifecycleError),
    /// The context was lost; everything was torn down and a new context created.
    ContextRebuilt,
    /// The context was lost and rebuilding it failed.
    ContextLost(LifecycleError),
    /// Any other driver error. Nothing was attempted.
    Failed(EglError),
}

impl SwapOutcome {
    /// Whether the caller may keep rendering with the current context.
    ///
    /// Surface loss is non-fatal; context loss reports failure for this frame
    /// even when the rebuild succeeded.
    pub fn context_usable(&self) -> bool {
        matches!(
            self,
            Self::Presented | Self::SurfaceRecreated | Self::SurfaceUnavailable(_)
        )
    }
}

/// Which branch `resume` took.
///
/// Resume is best-effort: every branch counts as completed, including the ones
/// whose rebuild failed. Check `is_ready()` before rendering.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResumeOutcome {
    /// New surface bound to the existing context.
    Rebound,
    /// The context was lost; a new one was created for the new surface.
    ContextRecreated(Result<(), LifecycleError>),
    /// Binding failed otherwise; terminated and initialized from scratch.
    Rebuilt(Result<(), LifecycleError>),
}

impl ResumeOutcome {
    /// The failure of the recovery step, if recovery was needed and failed.
    pub fn recovery_error(&self) -> Option<&LifecycleError> {
        match self {
            Self::Rebound => None,
            Self::ContextRecreated(r) | Self::Rebuilt(r) => r.as_ref().err(),
        }
    }
}
