use std::fmt;

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        pub struct $name(usize);

        impl $name {
            /// The "no object" sentinel.
            pub const NONE: Self = Self(0);

            /// Wraps a raw driver value. `0` maps to [`Self::NONE`].
            #[inline]
            pub const fn from_raw(raw: usize) -> Self {
                Self(raw)
            }

            /// Returns the raw driver value.
            #[inline]
            pub const fn raw(self) -> usize {
                self.0
            }

            #[inline]
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }

            #[inline]
            pub const fn is_some(self) -> bool {
                self.0 != 0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::NONE
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_none() {
                    write!(f, "{}(NONE)", stringify!($name))
                } else {
                    write!(f, "{}({:#x})", stringify!($name), self.0)
                }
            }
        }
    };
}

native_handle!(
    /// Connection to the native display, as returned by the driver.
    Display
);

native_handle!(
    /// Driver-described framebuffer configuration.
    Config
);

native_handle!(
    /// Window surface created by this manager.
    Surface
);

native_handle!(
    /// Rendering context created by this manager.
    Context
);

native_handle!(
    /// Platform window handle. Borrowed from the window system, never destroyed here.
    NativeWindow
);

native_handle!(
    /// Platform display handle. `NONE` selects the driver's default display.
    NativeDisplay
);
