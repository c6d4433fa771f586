pub mod engine_message;
pub mod engine_proxy;
pub mod engine_registry;
