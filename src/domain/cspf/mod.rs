pub mod engine;
pub mod engine_config;
pub mod path_finder;
pub mod registry;
pub mod traffic_engineering;
