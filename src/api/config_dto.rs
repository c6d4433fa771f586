use serde::Deserialize;

/// Engine settings as read from JSON. Every field is optional; missing ones take the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfigDto {
    pub tunnel_port_start: Option<u16>,
    pub link_capacity: Option<u32>,
    pub reservable_fraction: Option<f64>,
    #[serde(default)]
    pub link_bandwidth: Vec<LinkBandwidthDto>,
}

/// Reservable bandwidth for one directed link, overriding the capacity-derived value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkBandwidthDto {
    pub src: u64,
    pub dst: u64,
    pub src_port: u16,
    pub dst_port: u16,
    pub bandwidth: u32,
    /// Apply the same value to the reverse direction (ports swapped).
    #[serde(default)]
    pub bidirectional: bool,
}
