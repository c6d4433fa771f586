/// `tracing` target of the structured admission events.
///
/// Each event carries `TunnelId`, `Source`, `Destination`, `Bandwidth`, `Priority` and
/// `Outcome`; admitted requests add `Hops` and `Ejected`.
pub const ANALYTICS_TARGET: &str = "cspf_analytics";
