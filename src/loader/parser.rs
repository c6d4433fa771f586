use serde::de::DeserializeOwned;
use std::fs;

use crate::api::config_dto::EngineConfigDto;
use crate::api::scenario_dto::ScenarioDto;
use crate::domain::cspf::engine_config::EngineConfig;
use crate::domain::scenario::Scenario;
use crate::error::Result;

/// Parses a JSON file into a given type `T`.
///
/// Errors are converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let data = fs::read_to_string(file_path)?;

    let parsed_data: T = serde_json::from_str(&data)?;

    Ok(parsed_data)
}

/// Reads and validates an engine configuration file.
pub fn load_engine_config(file_path: &str) -> Result<EngineConfig> {
    let dto: EngineConfigDto = parse_json_file(file_path)?;
    let config = EngineConfig::try_from(dto)?;
    log::info!("Engine configuration loaded from '{}'.", file_path);
    Ok(config)
}

/// Reads a replay scenario file.
pub fn load_scenario(file_path: &str) -> Result<Scenario> {
    let dto: ScenarioDto = parse_json_file(file_path)?;
    let scenario = Scenario::from(dto);
    log::info!("Scenario with {} steps loaded from '{}'.", scenario.steps.len(), file_path);
    Ok(scenario)
}
