//! In-process simulated driver.
//!
//! Behaves like a small EGL implementation: a fixed config table, one display,
//! surfaces and contexts tracked by handle, a current binding, and per-call
//! fault injection. It records every call so lifecycle sequences can be
//! asserted exactly.

use std::collections::{HashMap, HashSet, VecDeque};

use super::attrib::{self, Attrib, AttribList};
use super::driver::Driver;
use super::error::EglError;
use super::handle::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};

const SIM_DISPLAY: Display = Display::from_raw(0xd15);

/// One row of the simulated config table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub red: i32,
    pub green: i32,
    pub blue: i32,
    pub alpha: i32,
    pub depth: i32,
    pub sample_buffers: i32,
    pub samples: i32,
    pub surface_type: i32,
    pub renderable: i32,
    pub native_visual_id: i32,
}

impl SimConfig {
    pub const fn rgb565() -> Self {
        Self {
            red: 5,
            green: 6,
            blue: 5,
            alpha: 0,
            depth: 16,
            sample_buffers: 0,
            samples: 0,
            surface_type: attrib::WINDOW_BIT,
            renderable: attrib::OPENGL_ES2_BIT | attrib::OPENGL_ES3_BIT,
            native_visual_id: 4,
        }
    }

    pub const fn rgb888() -> Self {
        Self {
            red: 8,
            green: 8,
            blue: 8,
            alpha: 0,
            depth: 24,
            sample_buffers: 0,
            samples: 0,
            surface_type: attrib::WINDOW_BIT,
            renderable: attrib::OPENGL_ES2_BIT | attrib::OPENGL_ES3_BIT,
            native_visual_id: 3,
        }
    }

    pub const fn rgba8888() -> Self {
        Self { alpha: 8, native_visual_id: 1, ..Self::rgb888() }
    }

    pub const fn multisampled(self, samples: i32) -> Self {
        Self { sample_buffers: 1, samples, ..self }
    }

    pub const fn es2_only(self) -> Self {
        Self { renderable: attrib::OPENGL_ES2_BIT, ..self }
    }

    pub const fn with_visual_id(self, native_visual_id: i32) -> Self {
        Self { native_visual_id, ..self }
    }

    fn buffer_size(&self) -> i32 {
        self.red + self.green + self.blue + self.alpha
    }

    fn attrib(&self, name: Attrib) -> Option<i32> {
        let value = match name {
            attrib::RED_SIZE => self.red,
            attrib::GREEN_SIZE => self.green,
            attrib::BLUE_SIZE => self.blue,
            attrib::ALPHA_SIZE => self.alpha,
            attrib::BUFFER_SIZE => self.buffer_size(),
            attrib::DEPTH_SIZE => self.depth,
            attrib::SAMPLE_BUFFERS => self.sample_buffers,
            attrib::SAMPLES => self.samples,
            attrib::SURFACE_TYPE => self.surface_type,
            attrib::RENDERABLE_TYPE => self.renderable,
            attrib::NATIVE_VISUAL_ID => self.native_visual_id,
            _ => return None,
        };
        Some(value)
    }

    /// EGL matching rules: sizes are minimums, type masks must contain the bits.
    fn matches(&self, attribs: &AttribList) -> bool {
        attribs.pairs().all(|(name, wanted)| match name {
            attrib::SURFACE_TYPE | attrib::RENDERABLE_TYPE => {
                self.attrib(name).is_some_and(|mask| mask & wanted == wanted)
            }
            attrib::NATIVE_VISUAL_ID => true,
            _ => self.attrib(name).is_none_or(|have| have >= wanted),
        })
    }
}

/// Driver entry points, as recorded in the call log.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    GetDisplay,
    Initialize,
    Terminate,
    ChooseConfig,
    ConfigAttrib,
    CreateWindowSurface,
    DestroySurface,
    CreateContext,
    DestroyContext,
    MakeCurrent,
    SwapBuffers,
    QuerySurface,
    SwapInterval,
}

/// Simulated EGL driver.
#[derive(Debug)]
pub struct SimDriver {
    configs: Vec<SimConfig>,
    display_available: bool,
    initialized: bool,
    surfaceless: bool,
    window_size: (i32, i32),

    next_id: usize,
    surfaces: HashMap<Surface, NativeWindow>,
    contexts: HashSet<Context>,
    current: (Surface, Context),

    one_shot: HashMap<Call, VecDeque<EglError>>,
    persistent: HashMap<Call, EglError>,

    calls: Vec<Call>,
    config_queries: Vec<AttribList>,
    context_attribs: Vec<AttribList>,
    swap_interval: Option<i32>,
    destroyed_while_current: usize,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// A driver exposing 8/8/8 (plain and 4x MSAA) and 5/6/5 window configs.
    pub fn new() -> Self {
        Self::with_configs(vec![
            SimConfig::rgb888(),
            SimConfig::rgb888().multisampled(4).with_visual_id(2),
            SimConfig::rgb565(),
        ])
    }

    pub fn with_configs(configs: Vec<SimConfig>) -> Self {
        Self {
            configs,
            display_available: true,
            initialized: false,
            surfaceless: true,
            window_size: (1280, 720),
            next_id: 0x100,
            surfaces: HashMap::new(),
            contexts: HashSet::new(),
            current: (Surface::NONE, Context::NONE),
            one_shot: HashMap::new(),
            persistent: HashMap::new(),
            calls: Vec::new(),
            config_queries: Vec::new(),
            context_attribs: Vec::new(),
            swap_interval: None,
            destroyed_while_current: 0,
        }
    }

    /// Makes `get_display` fail, as on a headless machine.
    pub fn without_display(mut self) -> Self {
        self.display_available = false;
        self
    }

    /// Whether a context may be bound with no surface (`EGL_KHR_surfaceless_context`).
    pub fn surfaceless(mut self, supported: bool) -> Self {
        self.surfaceless = supported;
        self
    }

    pub fn set_window_size(&mut self, width: i32, height: i32) {
        self.window_size = (width, height);
    }

    /// Fails the next call of kind `call` with `err`. Queued faults fire in order.
    pub fn inject(&mut self, call: Call, err: EglError) {
        self.one_shot.entry(call).or_default().push_back(err);
    }

    /// Fails every call of kind `call` with `err` until [`clear_faults`](Self::clear_faults).
    pub fn fail_always(&mut self, call: Call, err: EglError) {
        self.persistent.insert(call, err);
    }

    pub fn clear_faults(&mut self) {
        self.one_shot.clear();
        self.persistent.clear();
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    /// Drops the call log along with the recorded config and context attributes.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
        self.config_queries.clear();
        self.context_attribs.clear();
    }

    /// Attribute lists passed to `choose_config`, oldest first.
    pub fn config_queries(&self) -> &[AttribList] {
        &self.config_queries
    }

    /// Attribute lists passed to `create_context`, oldest first.
    pub fn context_attribs(&self) -> &[AttribList] {
        &self.context_attribs
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    pub fn live_contexts(&self) -> usize {
        self.contexts.len()
    }

    pub fn current(&self) -> (Surface, Context) {
        self.current
    }

    pub fn swap_interval_value(&self) -> Option<i32> {
        self.swap_interval
    }

    /// Number of times a surface or context was destroyed while still bound.
    pub fn destroyed_while_current(&self) -> usize {
        self.destroyed_while_current
    }

    /// Handle of the config at `index` in the table.
    pub fn config_handle(index: usize) -> Config {
        Config::from_raw(index + 1)
    }

    fn enter(&mut self, call: Call) -> Result<(), EglError> {
        self.calls.push(call);
        if let Some(err) = self.one_shot.get_mut(&call).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        match self.persistent.get(&call) {
            Some(err) => Err(*err),
            None => Ok(()),
        }
    }

    fn check_display(&self, display: Display) -> Result<(), EglError> {
        if display != SIM_DISPLAY {
            return Err(EglError::BadDisplay);
        }
        if !self.initialized {
            return Err(EglError::NotInitialized);
        }
        Ok(())
    }

    fn lookup(&self, config: Config) -> Result<&SimConfig, EglError> {
        config
            .raw()
            .checked_sub(1)
            .and_then(|i| self.configs.get(i))
            .ok_or(EglError::BadConfig)
    }

    fn next_raw(&mut self) -> usize {
        let raw = self.next_id;
        self.next_id += 1;
        raw
    }
}

impl Driver for SimDriver {
    fn get_display(&mut self, _native: NativeDisplay) -> Option<Display> {
        self.calls.push(Call::GetDisplay);
        self.display_available.then_some(SIM_DISPLAY)
    }

    fn initialize(&mut self, display: Display) -> Result<(i32, i32), EglError> {
        self.enter(Call::Initialize)?;
        if display != SIM_DISPLAY {
            return Err(EglError::BadDisplay);
        }
        self.initialized = true;
        Ok((1, 5))
    }

    fn terminate(&mut self, display: Display) -> Result<(), EglError> {
        self.enter(Call::Terminate)?;
        if display != SIM_DISPLAY {
            return Err(EglError::BadDisplay);
        }
        self.initialized = false;
        self.surfaces.clear();
        self.contexts.clear();
        self.current = (Surface::NONE, Context::NONE);
        Ok(())
    }

    fn choose_config(
        &mut self,
        display: Display,
        attribs: &AttribList,
        max: usize,
    ) -> Result<Vec<Config>, EglError> {
        self.enter(Call::ChooseConfig)?;
        self.check_display(display)?;
        self.config_queries.push(attribs.clone());
        Ok(self
            .configs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.matches(attribs))
            .take(max)
            .map(|(i, _)| Self::config_handle(i))
            .collect())
    }

    fn config_attrib(
        &mut self,
        display: Display,
        config: Config,
        attrib: Attrib,
    ) -> Result<i32, EglError> {
        self.enter(Call::ConfigAttrib)?;
        self.check_display(display)?;
        self.lookup(config)?.attrib(attrib).ok_or(EglError::BadAttribute)
    }

    fn create_window_surface(
        &mut self,
        display: Display,
        config: Config,
        window: NativeWindow,
    ) -> Result<Surface, EglError> {
        self.enter(Call::CreateWindowSurface)?;
        self.check_display(display)?;
        let cfg = self.lookup(config)?;
        if cfg.surface_type & attrib::WINDOW_BIT == 0 {
            return Err(EglError::BadMatch);
        }
        if window.is_none() {
            return Err(EglError::BadNativeWindow);
        }
        // A native window may back only one EGL surface at a time.
        if self.surfaces.values().any(|w| *w == window) {
            return Err(EglError::BadAlloc);
        }
        let surface = Surface::from_raw(self.next_raw());
        self.surfaces.insert(surface, window);
        Ok(surface)
    }

    fn destroy_surface(&mut self, display: Display, surface: Surface) -> Result<(), EglError> {
        self.enter(Call::DestroySurface)?;
        self.check_display(display)?;
        if self.surfaces.remove(&surface).is_none() {
            return Err(EglError::BadSurface);
        }
        if self.current.0 == surface {
            self.destroyed_while_current += 1;
        }
        Ok(())
    }

    fn create_context(
        &mut self,
        display: Display,
        config: Config,
        share: Context,
        attribs: &AttribList,
    ) -> Result<Context, EglError> {
        self.enter(Call::CreateContext)?;
        self.check_display(display)?;
        self.lookup(config)?;
        if share.is_some() && !self.contexts.contains(&share) {
            return Err(EglError::BadContext);
        }
        self.context_attribs.push(attribs.clone());
        let context = Context::from_raw(self.next_raw());
        self.contexts.insert(context);
        Ok(context)
    }

    fn destroy_context(&mut self, display: Display, context: Context) -> Result<(), EglError> {
        self.enter(Call::DestroyContext)?;
        self.check_display(display)?;
        if !self.contexts.remove(&context) {
            return Err(EglError::BadContext);
        }
        if self.current.1 == context {
            self.destroyed_while_current += 1;
        }
        Ok(())
    }

    fn make_current(
        &mut self,
        display: Display,
        draw: Surface,
        read: Surface,
        context: Context,
    ) -> Result<(), EglError> {
        self.enter(Call::MakeCurrent)?;
        self.check_display(display)?;

        if context.is_none() {
            if draw.is_some() || read.is_some() {
                return Err(EglError::BadMatch);
            }
            self.current = (Surface::NONE, Context::NONE);
            return Ok(());
        }

        if !self.contexts.contains(&context) {
            return Err(EglError::BadContext);
        }
        for s in [draw, read] {
            if s.is_some() && !self.surfaces.contains_key(&s) {
                return Err(EglError::BadSurface);
            }
        }
        if (draw.is_none() || read.is_none()) && !self.surfaceless {
            return Err(EglError::BadMatch);
        }

        self.current = (draw, context);
        Ok(())
    }

    fn swap_buffers(&mut self, display: Display, surface: Surface) -> Result<(), EglError> {
        self.enter(Call::SwapBuffers)?;
        self.check_display(display)?;
        if !self.surfaces.contains_key(&surface) || self.current.0 != surface {
            return Err(EglError::BadSurface);
        }
        Ok(())
    }

    fn query_surface(
        &mut self,
        display: Display,
        surface: Surface,
        attrib: Attrib,
    ) -> Result<i32, EglError> {
        self.enter(Call::QuerySurface)?;
        self.check_display(display)?;
        if !self.surfaces.contains_key(&surface) {
            return Err(EglError::BadSurface);
        }
        match attrib {
            attrib::WIDTH => Ok(self.window_size.0),
            attrib::HEIGHT => Ok(self.window_size.1),
            _ => Err(EglError::BadAttribute),
        }
    }

    fn swap_interval(&mut self, display: Display, interval: i32) -> Result<(), EglError> {
        self.enter(Call::SwapInterval)?;
        self.check_display(display)?;
        self.swap_interval = Some(interval);
        Ok(())
    }
}
