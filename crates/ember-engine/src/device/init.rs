/// How the framebuffer configuration is chosen by `init_surface`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SelectionPolicy {
    /// One fixed attribute list, retried once at 16 bits.
    Fixed,
    /// Candidate depths scanned for exact channel matches.
    Scored(CandidateResolution),
    /// First candidate config for which a window surface can actually be created.
    FirstCreatable,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::Scored(CandidateResolution::LatestWins)
    }
}

/// Which candidate's pick survives when several depth candidates produce one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum CandidateResolution {
    /// Every candidate is visited and the last one to produce a config wins,
    /// even over an exact match found for a more preferred candidate.
    #[default]
    LatestWins,
    /// Stop at the first (most preferred) candidate that produced a config.
    PreferredFirst,
}

/// Requested surface and context attributes.
///
/// Values are normalized by [`ContextAttributes::normalized`] before use:
/// only 24 and 32 bit depths and OpenGL ES 3 are kept as given.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ContextAttributes {
    /// Requested frame-buffer depth in bits (16, 24 or 32).
    pub depth_size: i32,

    /// OpenGL ES major version (2 or 3).
    pub es_major: i32,

    /// OpenGL ES minor version. Only sent to the driver for ES 3.
    pub es_minor: i32,

    /// Prefer configs with at least one multisample buffer.
    pub antialiasing: bool,

    pub selection: SelectionPolicy,

    /// Swap interval applied once a context is bound. `None` keeps the driver default.
    pub swap_interval: Option<i32>,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self {
            depth_size: 16,
            es_major: 2,
            es_minor: 0,
            antialiasing: true,
            selection: SelectionPolicy::default(),
            swap_interval: None,
        }
    }
}

impl ContextAttributes {
    /// ES version and depth shorthand; everything else defaulted.
    pub fn new(depth_size: i32, es_major: i32, es_minor: i32) -> Self {
        Self { depth_size, es_major, es_minor, ..Self::default() }
    }

    pub fn with_antialiasing(mut self, antialiasing: bool) -> Self {
        self.antialiasing = antialiasing;
        self
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_swap_interval(mut self, interval: i32) -> Self {
        self.swap_interval = Some(interval);
        self
    }

    /// Clamps the request to what the lifecycle manager supports.
    pub fn normalized(mut self) -> Self {
        if !matches!(self.depth_size, 24 | 32) {
            self.depth_size = 16;
        }
        if self.es_major != 3 {
            self.es_major = 2;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_keeps_supported_values() {
        let a = ContextAttributes::new(24, 3, 1).normalized();
        assert_eq!((a.depth_size, a.es_major, a.es_minor), (24, 3, 1));
    }

    #[test]
    fn normalization_falls_back_to_es2_16bit() {
        let a = ContextAttributes::new(8, 4, 0).normalized();
        assert_eq!((a.depth_size, a.es_major), (16, 2));
        assert!(a.antialiasing);
    }
}
