use std::fmt;

/// Error code reported by the native driver after a failed call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EglError {
    NotInitialized,
    BadAccess,
    BadAlloc,
    BadAttribute,
    BadConfig,
    BadContext,
    BadCurrentSurface,
    BadDisplay,
    BadMatch,
    BadNativePixmap,
    BadNativeWindow,
    BadParameter,
    BadSurface,
    ContextLost,
    /// A code this crate does not interpret.
    Unknown(i32),
}

impl EglError {
    /// Maps a raw `eglGetError` value. `EGL_SUCCESS` yields `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        let err = match code {
            0x3000 => return None,
            0x3001 => Self::NotInitialized,
            0x3002 => Self::BadAccess,
            0x3003 => Self::BadAlloc,
            0x3004 => Self::BadAttribute,
            0x3005 => Self::BadConfig,
            0x3006 => Self::BadContext,
            0x3007 => Self::BadCurrentSurface,
            0x3008 => Self::BadDisplay,
            0x3009 => Self::BadMatch,
            0x300A => Self::BadNativePixmap,
            0x300B => Self::BadNativeWindow,
            0x300C => Self::BadParameter,
            0x300D => Self::BadSurface,
            0x300E => Self::ContextLost,
            other => Self::Unknown(other),
        };
        Some(err)
    }

    pub fn code(self) -> i32 {
        match self {
            Self::NotInitialized => 0x3001,
            Self::BadAccess => 0x3002,
            Self::BadAlloc => 0x3003,
            Self::BadAttribute => 0x3004,
            Self::BadConfig => 0x3005,
            Self::BadContext => 0x3006,
            Self::BadCurrentSurface => 0x3007,
            Self::BadDisplay => 0x3008,
            Self::BadMatch => 0x3009,
            Self::BadNativePixmap => 0x300A,
            Self::BadNativeWindow => 0x300B,
            Self::BadParameter => 0x300C,
            Self::BadSurface => 0x300D,
            Self::ContextLost => 0x300E,
            Self::Unknown(code) => code,
        }
    }

    /// Whether the error means the rendering context is gone.
    pub fn is_context_loss(self) -> bool {
        matches!(self, Self::ContextLost | Self::BadContext)
    }
}

impl fmt::Display for EglError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotInitialized => "EGL_NOT_INITIALIZED",
            Self::BadAccess => "EGL_BAD_ACCESS",
            Self::BadAlloc => "EGL_BAD_ALLOC",
            Self::BadAttribute => "EGL_BAD_ATTRIBUTE",
            Self::BadConfig => "EGL_BAD_CONFIG",
            Self::BadContext => "EGL_BAD_CONTEXT",
            Self::BadCurrentSurface => "EGL_BAD_CURRENT_SURFACE",
            Self::BadDisplay => "EGL_BAD_DISPLAY",
            Self::BadMatch => "EGL_BAD_MATCH",
            Self::BadNativePixmap => "EGL_BAD_NATIVE_PIXMAP",
            Self::BadNativeWindow => "EGL_BAD_NATIVE_WINDOW",
            Self::BadParameter => "EGL_BAD_PARAMETER",
            Self::BadSurface => "EGL_BAD_SURFACE",
            Self::ContextLost => "EGL_CONTEXT_LOST",
            Self::Unknown(code) => return write!(f, "EGL error {code:#06x}"),
        };
        write!(f, "{name} ({:#06x})", self.code())
    }
}

impl std::error::Error for EglError {}

/// Failure of a lifecycle step. The manager keeps its prior state when one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The driver could not resolve a display for the native display handle.
    DisplayUnavailable,
    /// `eglInitialize` failed.
    Initialize(EglError),
    /// No candidate produced a configuration. Carries the last driver error, if any.
    NoMatchingConfig(Option<EglError>),
    /// The operation needs a selected configuration and none is present.
    MissingConfig,
    CreateSurface(EglError),
    CreateContext(EglError),
    MakeCurrent(EglError),
    Query(EglError),
    /// The platform rejected the buffer format; carries its status code.
    BuffersGeometry(i32),
}

impl LifecycleError {
    /// Short name of the step that failed, for log lines.
    pub fn step(&self) -> &'static str {
        match self {
            Self::DisplayUnavailable => "get display",
            Self::Initialize(_) => "initialize display",
            Self::NoMatchingConfig(_) => "choose config",
            Self::MissingConfig => "config lookup",
            Self::CreateSurface(_) => "create window surface",
            Self::CreateContext(_) => "create context",
            Self::MakeCurrent(_) => "make current",
            Self::Query(_) => "query",
            Self::BuffersGeometry(_) => "set buffers geometry",
        }
    }

    /// The driver error behind this failure, if one was reported.
    pub fn driver_error(&self) -> Option<EglError> {
        match self {
            Self::Initialize(e)
            | Self::CreateSurface(e)
            | Self::CreateContext(e)
            | Self::MakeCurrent(e)
            | Self::Query(e) => Some(*e),
            Self::NoMatchingConfig(e) => *e,
            Self::DisplayUnavailable | Self::MissingConfig | Self::BuffersGeometry(_) => None,
        }
    }
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuffersGeometry(status) => {
                write!(f, "{} failed with status {status}", self.step())
            }
            Self::NoMatchingConfig(None) => write!(f, "{}: driver returned no configs", self.step()),
            Self::DisplayUnavailable | Self::MissingConfig => write!(f, "{} failed", self.step()),
            other => match other.driver_error() {
                Some(err) => write!(f, "{} failed: {err}", other.step()),
                None => write!(f, "{} failed", other.step()),
            },
        }
    }
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Initialize(e)
            | Self::CreateSurface(e)
            | Self::CreateContext(e)
            | Self::MakeCurrent(e)
            | Self::Query(e)
            | Self::NoMatchingConfig(Some(e)) => Some(e),
            _ => None,
        }
    }
}
