pub mod config_dto;
pub mod scenario_dto;
