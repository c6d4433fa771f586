use crate::domain::cspf::engine::CspfEngine;
use crate::domain::cspf::engine_config::EngineConfig;
use crate::error::Result;
use crate::loader::parser::load_engine_config;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Builds an engine from a configuration file, or with the built-in defaults when no file is given.
pub fn build_engine(config_path: Option<&str>) -> Result<CspfEngine> {
    let config = match config_path {
        Some(path) => load_engine_config(path)?,
        None => {
            log::info!("No configuration file given, using defaults.");
            EngineConfig::default()
        }
    };
    log::info!(
        "CSPF engine ready: tunnel ports start at {:#x}, {} reservable per link.",
        config.tunnel_port_start,
        config.default_reservable_bandwidth()
    );

    Ok(CspfEngine::new(config))
}
