//! EGL attribute names and values used by the lifecycle manager.
//!
//! Values match the Khronos `egl.h` / `EGL_KHR_create_context` headers so the
//! lists built here can be handed to a native driver unchanged.

pub type Attrib = i32;

pub const NONE: Attrib = 0x3038;

// Config attributes.
pub const BUFFER_SIZE: Attrib = 0x3020;
pub const ALPHA_SIZE: Attrib = 0x3021;
pub const BLUE_SIZE: Attrib = 0x3022;
pub const GREEN_SIZE: Attrib = 0x3023;
pub const RED_SIZE: Attrib = 0x3024;
pub const DEPTH_SIZE: Attrib = 0x3025;
pub const NATIVE_VISUAL_ID: Attrib = 0x302E;
pub const SAMPLES: Attrib = 0x3031;
pub const SAMPLE_BUFFERS: Attrib = 0x3032;
pub const SURFACE_TYPE: Attrib = 0x3033;
pub const RENDERABLE_TYPE: Attrib = 0x3040;

// Surface attributes.
pub const HEIGHT: Attrib = 0x3056;
pub const WIDTH: Attrib = 0x3057;

// Bits.
pub const WINDOW_BIT: Attrib = 0x0004;
pub const OPENGL_ES2_BIT: Attrib = 0x0004;
pub const OPENGL_ES3_BIT: Attrib = 0x0040;

// Context attributes. `CONTEXT_CLIENT_VERSION` shares its value with
// `EGL_CONTEXT_MAJOR_VERSION_KHR`.
pub const CONTEXT_CLIENT_VERSION: Attrib = 0x3098;
pub const CONTEXT_MINOR_VERSION: Attrib = 0x30FB;

/// Renderable-type bit for an OpenGL ES major version.
pub fn renderable_bit(es_major: i32) -> Attrib {
    if es_major >= 3 { OPENGL_ES3_BIT } else { OPENGL_ES2_BIT }
}

/// `NONE`-terminated list of `(name, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttribList {
    raw: Vec<Attrib>,
}

impl AttribList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair. Later pairs with the same name do not replace earlier ones.
    pub fn with(mut self, name: Attrib, value: Attrib) -> Self {
        self.raw.push(name);
        self.raw.push(value);
        self
    }

    /// Returns the first value recorded for `name`.
    pub fn get(&self, name: Attrib) -> Option<Attrib> {
        self.pairs().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Replaces the value of every pair named `name`.
    pub fn set(&mut self, name: Attrib, value: Attrib) {
        for pair in self.raw.chunks_exact_mut(2) {
            if pair[0] == name {
                pair[1] = value;
            }
        }
    }

    pub fn pairs(&self) -> impl Iterator<Item = (Attrib, Attrib)> + '_ {
        self.raw.chunks_exact(2).map(|p| (p[0], p[1]))
    }

    /// Terminated form suitable for a native call.
    pub fn to_native(&self) -> Vec<Attrib> {
        let mut out = Vec::with_capacity(self.raw.len() + 1);
        out.extend_from_slice(&self.raw);
        out.push(NONE);
        out
    }
}
