//! Display, surface and context lifecycle.
//!
//! This module is responsible for:
//! - the driver seam ([`Driver`]) and its simulated and native implementations
//! - choosing a framebuffer config ([`select`])
//! - creating, binding, recovering and releasing surface and context
//!   ([`RenderingContext`])

pub mod attrib;
mod context;
mod driver;
mod error;
mod frame;
mod handle;
mod init;
#[cfg(feature = "native")]
mod native;
pub mod select;
pub mod sim;

pub use context::{context_attribs, RenderingContext};
pub use driver::Driver;
pub use error::{EglError, LifecycleError};
pub use frame::{LifecycleState, ResumeOutcome, SwapOutcome};
pub use handle::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};
pub use init::{CandidateResolution, ContextAttributes, SelectionPolicy};
#[cfg(feature = "native")]
pub use native::NativeDriver;
pub use sim::SimDriver;
