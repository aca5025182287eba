#[cfg_attr(feature = "native", allow(dead_code))]
mod app;
mod config;

use anyhow::Result;

use ember_engine::logging::{init_logging, LoggingConfig};
use ember_engine::window::Runtime;

use crate::app::StudioApp;
use crate::config::StudioConfig;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = StudioConfig::from_env()?;
    log::info!("starting with {:?}", config.attributes);

    run(config)
}

#[cfg(feature = "native")]
fn run(config: StudioConfig) -> Result<()> {
    use ember_engine::device::NativeDriver;

    if config.chaos_interval.is_some() {
        log::warn!("EMBER_CHAOS only applies to the simulated driver; ignoring");
    }
    let driver = NativeDriver::load()?;
    Runtime::run(config.runtime(), driver, StudioApp::default())
}

#[cfg(not(feature = "native"))]
fn run(config: StudioConfig) -> Result<()> {
    use ember_engine::device::SimDriver;

    use crate::app::ChaosApp;

    let app = ChaosApp::new(StudioApp::default(), config.chaos_interval);
    Runtime::run(config.runtime(), SimDriver::new(), app)
}
