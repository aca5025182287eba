use anyhow::{bail, Context, Result};
use winit::dpi::LogicalSize;

use ember_engine::device::{CandidateResolution, ContextAttributes, SelectionPolicy};
use ember_engine::window::RuntimeConfig;

/// Studio settings, read from `EMBER_*` environment variables.
///
/// - `EMBER_DEPTH`: requested color depth (16, 24 or 32)
/// - `EMBER_ES`: OpenGL ES version, `2` or `3.1`
/// - `EMBER_AA`: `0` disables antialiasing
/// - `EMBER_POLICY`: `fixed`, `scored`, `preferred` or `first`
/// - `EMBER_SWAP_INTERVAL`: swap interval applied after binding
/// - `EMBER_CHAOS`: inject a driver fault every N frames (simulated driver only)
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    pub title: String,
    pub size: (f64, f64),
    pub attributes: ContextAttributes,
    pub chaos_interval: Option<u64>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            title: "Ember Studio".to_string(),
            size: (960.0, 540.0),
            attributes: ContextAttributes::default(),
            chaos_interval: None,
        }
    }
}

impl StudioConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let mut attrs = config.attributes.clone();

        if let Some(depth) = lookup("EMBER_DEPTH") {
            attrs.depth_size = depth.trim().parse().context("EMBER_DEPTH")?;
        }
        if let Some(es) = lookup("EMBER_ES") {
            let (major, minor) = parse_version(&es)?;
            attrs.es_major = major;
            attrs.es_minor = minor;
        }
        if let Some(aa) = lookup("EMBER_AA") {
            attrs = attrs.with_antialiasing(aa.trim() != "0");
        }
        if let Some(policy) = lookup("EMBER_POLICY") {
            attrs.selection = parse_policy(&policy)?;
        }
        if let Some(interval) = lookup("EMBER_SWAP_INTERVAL") {
            attrs.swap_interval = Some(interval.trim().parse().context("EMBER_SWAP_INTERVAL")?);
        }
        if let Some(chaos) = lookup("EMBER_CHAOS") {
            let n: u64 = chaos.trim().parse().context("EMBER_CHAOS")?;
            config.chaos_interval = (n > 0).then_some(n);
        }

        config.attributes = attrs.normalized();
        Ok(config)
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(self.size.0, self.size.1),
            attributes: self.attributes.clone(),
            ..RuntimeConfig::default()
        }
    }
}

fn parse_version(s: &str) -> Result<(i32, i32)> {
    let s = s.trim();
    let (major, minor) = s.split_once('.').unwrap_or((s, "0"));
    let major = major.parse().with_context(|| format!("bad ES version {s:?}"))?;
    let minor = minor.parse().with_context(|| format!("bad ES version {s:?}"))?;
    Ok((major, minor))
}

fn parse_policy(s: &str) -> Result<SelectionPolicy> {
    Ok(match s.trim() {
        "fixed" => SelectionPolicy::Fixed,
        "scored" => SelectionPolicy::Scored(CandidateResolution::LatestWins),
        "preferred" => SelectionPolicy::Scored(CandidateResolution::PreferredFirst),
        "first" => SelectionPolicy::FirstCreatable,
        other => bail!("unknown selection policy {other:?}"),
    })
}
