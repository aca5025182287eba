//! Contracts between the runtime loop and the application.

mod app;
mod ctx;

pub use app::{App, AppControl, LifecycleEvent};
pub use ctx::{FrameCtx, WindowCtx};
