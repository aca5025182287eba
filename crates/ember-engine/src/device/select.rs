//! Framebuffer configuration selection.
//!
//! Stateless: every function takes the driver and display it queries and
//! returns the chosen [`Config`].

use super::attrib::{self, AttribList};
use super::driver::Driver;
use super::error::{EglError, LifecycleError};
use super::handle::{Config, Display, Surface};
use super::init::CandidateResolution;

/// Upper bound on configs requested per candidate by the scored policies.
pub const MAX_CANDIDATE_CONFIGS: usize = 16;

/// Candidate frame-buffer depths in preference order.
pub fn candidate_depths(requested_depth: i32) -> [i32; 2] {
    if requested_depth > 16 { [32, 16] } else { [16, 32] }
}

/// Red/green/blue channel sizes implied by a frame-buffer depth.
pub fn channel_target(depth: i32) -> (i32, i32, i32) {
    if depth > 16 { (8, 8, 8) } else { (5, 6, 5) }
}

/// Attribute list used by the scored policies for one candidate depth.
pub fn candidate_attribs(depth: i32, es_major: i32) -> AttribList {
    let (r, g, b) = channel_target(depth);
    AttribList::new()
        .with(attrib::RENDERABLE_TYPE, attrib::renderable_bit(es_major))
        .with(attrib::BLUE_SIZE, b)
        .with(attrib::GREEN_SIZE, g)
        .with(attrib::RED_SIZE, r)
}

/// Single attribute list used by the fixed policy.
pub fn fixed_attribs(depth: i32, es_major: i32, antialiasing: bool) -> AttribList {
    let (r, g, b) = channel_target(depth);
    let list = AttribList::new()
        .with(attrib::RENDERABLE_TYPE, attrib::renderable_bit(es_major))
        .with(attrib::SURFACE_TYPE, attrib::WINDOW_BIT)
        .with(attrib::BLUE_SIZE, b)
        .with(attrib::GREEN_SIZE, g)
        .with(attrib::RED_SIZE, r)
        .with(attrib::BUFFER_SIZE, depth);

    let list = if antialiasing {
        list.with(attrib::SAMPLE_BUFFERS, 1).with(attrib::SAMPLES, 2)
    } else {
        list
    };

    list.with(attrib::DEPTH_SIZE, 16)
}

/// Fixed policy: one query for a single config, retried once at 16 bits.
pub fn select_fixed<D: Driver + ?Sized>(
    driver: &mut D,
    display: Display,
    requested_depth: i32,
    es_major: i32,
    antialiasing: bool,
) -> Result<Config, LifecycleError> {
    let mut last_err = None;

    let mut depths = vec![requested_depth];
    if requested_depth > 16 {
        depths.push(16);
    }

    for depth in depths {
        let attribs = fixed_attribs(depth, es_major, antialiasing);
        match driver.choose_config(display, &attribs, 1) {
            Ok(configs) => {
                if let Some(config) = configs.first() {
                    log::debug!("fixed config {config:?} at {depth} bits");
                    return Ok(*config);
                }
                log::debug!("no {depth}-bit config");
            }
            Err(err) => {
                log::warn!("choose config ({depth} bits) failed: {err}");
                last_err = Some(err);
            }
        }
    }

    Err(LifecycleError::NoMatchingConfig(last_err))
}

/// Scored policy over [`candidate_depths`].
///
/// With [`CandidateResolution::LatestWins`] every candidate is visited and the
/// last one that returned configs decides the result. A less preferred
/// candidate's fallback can therefore replace an exact (even multisampled)
/// match found for the preferred one. Whether an early exit was intended is an
/// open question; `LatestWins` keeps the established observable behaviour.
pub fn select_scored<D: Driver + ?Sized>(
    driver: &mut D,
    display: Display,
    requested_depth: i32,
    es_major: i32,
    antialiasing: bool,
    resolution: CandidateResolution,
) -> Result<Config, LifecycleError> {
    let mut chosen = None;
    let mut last_err = None;

    for depth in candidate_depths(requested_depth) {
        let configs = match query_candidate(driver, display, depth, es_major) {
            Ok(configs) if configs.is_empty() => continue,
            Ok(configs) => configs,
            Err(err) => {
                last_err = Some(err);
                continue;
            }
        };

        let config = scan_candidate(driver, display, &configs, depth, antialiasing);
        log::debug!("candidate {depth} bits -> {config:?}");
        chosen = Some(config);

        if resolution == CandidateResolution::PreferredFirst {
            break;
        }
    }

    chosen.ok_or(LifecycleError::NoMatchingConfig(last_err))
}

/// Walks the candidates and commits to the first config whose window surface
/// the driver actually creates. `create` is called once per tried config.
pub fn select_first_creatable<D, F>(
    driver: &mut D,
    display: Display,
    requested_depth: i32,
    es_major: i32,
    mut create: F,
) -> Result<(Config, Surface), LifecycleError>
where
    D: Driver + ?Sized,
    F: FnMut(&mut D, Config) -> Result<Surface, EglError>,
{
    let mut last_err = None;

    for depth in candidate_depths(requested_depth) {
        let configs = match query_candidate(driver, display, depth, es_major) {
            Ok(configs) => configs,
            Err(err) => {
                last_err = Some(err);
                continue;
            }
        };

        for config in configs {
            match create(&mut *driver, config) {
                Ok(surface) if surface.is_some() => return Ok((config, surface)),
                Ok(_) => {}
                Err(err) => {
                    log::debug!("surface for {config:?} refused: {err}");
                    last_err = Some(err);
                }
            }
        }
    }

    Err(LifecycleError::NoMatchingConfig(last_err))
}

fn query_candidate<D: Driver + ?Sized>(
    driver: &mut D,
    display: Display,
    depth: i32,
    es_major: i32,
) -> Result<Vec<Config>, EglError> {
    let attribs = candidate_attribs(depth, es_major);
    driver
        .choose_config(display, &attribs, MAX_CANDIDATE_CONFIGS)
        .inspect_err(|err| log::warn!("choose config ({depth} bits) failed: {err}"))
}

/// Picks within one candidate's results. `configs` must be non-empty.
fn scan_candidate<D: Driver + ?Sized>(
    driver: &mut D,
    display: Display,
    configs: &[Config],
    depth: i32,
    antialiasing: bool,
) -> Config {
    let target = channel_target(depth);
    let mut exact = None;

    for &config in configs {
        let Some((rgb, sample_buffers)) = read_channels(driver, display, config) else {
            continue;
        };
        if rgb != target {
            continue;
        }
        exact = Some(config);
        if !antialiasing || sample_buffers > 0 {
            break;
        }
    }

    exact.unwrap_or(configs[0])
}

fn read_channels<D: Driver + ?Sized>(
    driver: &mut D,
    display: Display,
    config: Config,
) -> Option<((i32, i32, i32), i32)> {
    let mut get = |name: attrib::Attrib| {
        driver
            .config_attrib(display, config, name)
            .inspect_err(|err| log::debug!("config attrib {name:#x} of {config:?}: {err}"))
            .ok()
    };
    let r = get(attrib::RED_SIZE)?;
    let g = get(attrib::GREEN_SIZE)?;
    let b = get(attrib::BLUE_SIZE)?;
    let s = get(attrib::SAMPLE_BUFFERS)?;
    Some(((r, g, b), s))
}
