use std::collections::HashMap;

use crate::api::config_dto::EngineConfigDto;
use crate::domain::network::link::{DEFAULT_TUNNEL_PORT_START, Link};
use crate::domain::utils::id::SwitchId;
use crate::error::{Error, Result};

pub const DEFAULT_LINK_CAPACITY: u32 = 1000;
pub const DEFAULT_RESERVABLE_FRACTION: f64 = 0.9;

/// Settings of a [`CspfEngine`](crate::domain::cspf::engine::CspfEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Ports numbered at or above this value are tunnel ports, never physical links.
    pub tunnel_port_start: u16,

    /// Nominal capacity of a physical link.
    pub link_capacity: u32,

    /// Share of `link_capacity` that tunnels may reserve.
    pub reservable_fraction: f64,

    /// Reservable bandwidth of individual directed links, taking precedence over the
    /// capacity-derived default.
    pub link_bandwidth: HashMap<(SwitchId, Link), u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tunnel_port_start: DEFAULT_TUNNEL_PORT_START,
            link_capacity: DEFAULT_LINK_CAPACITY,
            reservable_fraction: DEFAULT_RESERVABLE_FRACTION,
            link_bandwidth: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Reservable bandwidth of a link without a per-link override: `floor(capacity * fraction)`.
    pub fn default_reservable_bandwidth(&self) -> u32 {
        (f64::from(self.link_capacity) * self.reservable_fraction).floor() as u32
    }

    /// Reservable bandwidth of the link `src -> link.dst`.
    pub fn reservable_bandwidth(&self, src: SwitchId, link: &Link) -> u32 {
        self.link_bandwidth.get(&(src, *link)).copied().unwrap_or_else(|| self.default_reservable_bandwidth())
    }
}

impl TryFrom<EngineConfigDto> for EngineConfig {
    type Error = Error;

    fn try_from(dto: EngineConfigDto) -> Result<Self> {
        let defaults = EngineConfig::default();

        let tunnel_port_start = dto.tunnel_port_start.unwrap_or(defaults.tunnel_port_start);
        if tunnel_port_start == 0 {
            return Err(Error::InvalidConfiguration("tunnelPortStart must be greater than 0".to_string()));
        }

        let reservable_fraction = dto.reservable_fraction.unwrap_or(defaults.reservable_fraction);
        if !(reservable_fraction > 0.0 && reservable_fraction <= 1.0) {
            return Err(Error::InvalidConfiguration(format!("reservableFraction must be in (0, 1], got {}", reservable_fraction)));
        }

        let mut link_bandwidth = HashMap::new();
        for entry in dto.link_bandwidth {
            let (src, dst) = (SwitchId::new(entry.src), SwitchId::new(entry.dst));
            if entry.src_port >= tunnel_port_start || entry.dst_port >= tunnel_port_start {
                return Err(Error::InvalidConfiguration(format!(
                    "linkBandwidth entry {} -[{}/{}]-> {} uses a tunnel port",
                    src, entry.src_port, entry.dst_port, dst
                )));
            }
            link_bandwidth.insert((src, Link::new(dst, entry.src_port, entry.dst_port)), entry.bandwidth);
            if entry.bidirectional {
                link_bandwidth.insert((dst, Link::new(src, entry.dst_port, entry.src_port)), entry.bandwidth);
            }
        }

        Ok(Self {
            tunnel_port_start,
            link_capacity: dto.link_capacity.unwrap_or(defaults.link_capacity),
            reservable_fraction,
            link_bandwidth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config_dto::LinkBandwidthDto;

    #[test]
    fn test_defaults_reserve_ninety_percent() {
        let config = EngineConfig::default();
        assert_eq!(config.tunnel_port_start, 0x7e00);
        assert_eq!(config.default_reservable_bandwidth(), 900);
    }

    #[test]
    fn test_rejects_fraction_out_of_range() {
        let dto = EngineConfigDto { reservable_fraction: Some(1.5), ..Default::default() };
        assert!(matches!(EngineConfig::try_from(dto), Err(Error::InvalidConfiguration(_))));

        let dto = EngineConfigDto { reservable_fraction: Some(0.0), ..Default::default() };
        assert!(matches!(EngineConfig::try_from(dto), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_bidirectional_override_covers_both_directions() {
        let dto = EngineConfigDto {
            link_capacity: Some(100),
            reservable_fraction: Some(1.0),
            link_bandwidth: vec![LinkBandwidthDto { src: 1, dst: 2, src_port: 3, dst_port: 4, bandwidth: 40, bidirectional: true }],
            ..Default::default()
        };
        let config = EngineConfig::try_from(dto).unwrap();

        assert_eq!(config.reservable_bandwidth(SwitchId::new(1), &Link::new(SwitchId::new(2), 3, 4)), 40);
        assert_eq!(config.reservable_bandwidth(SwitchId::new(2), &Link::new(SwitchId::new(1), 4, 3)), 40);
        assert_eq!(config.reservable_bandwidth(SwitchId::new(1), &Link::new(SwitchId::new(2), 5, 6)), 100);
    }
}
