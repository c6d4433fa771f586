pub mod cspf;
pub mod network;
pub mod reservation;
pub mod scenario;
pub mod utils;
