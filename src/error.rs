use thiserror::Error;

use crate::domain::network::link::RouteId;
use crate::domain::utils::id::{SwitchId, TunnelId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON input: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("No route {src} => {dst} satisfies bandwidth {bandwidth} at priority {priority}")]
    NoFeasibleRoute { src: SwitchId, dst: SwitchId, bandwidth: u32, priority: u8 },

    #[error("Tunnel {0} already holds a reservation; resize or release it first")]
    TunnelExists(TunnelId),

    #[error("Reservation of tunnel {tunnel} is missing on route {route}; resize rolled back")]
    ReservationInconsistent { tunnel: TunnelId, route: RouteId },

    #[error("Explicit route rejected at hop {hop}: {reason}")]
    ExplicitRouteRejected { hop: usize, reason: String },

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfiguration(String),

    #[error("CSPF engine is unavailable: {0}")]
    EngineUnavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
