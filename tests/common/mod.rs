#![allow(dead_code)]

use cspf_te_engine::domain::cspf::engine::CspfEngine;
use cspf_te_engine::domain::cspf::engine_config::EngineConfig;
use cspf_te_engine::domain::cspf::traffic_engineering::TrafficEngineering;
use cspf_te_engine::domain::network::link::{Link, LinkEvent, Route};
use cspf_te_engine::domain::utils::id::{SwitchId, TunnelId};

pub const A: SwitchId = SwitchId::new(0xa);
pub const B: SwitchId = SwitchId::new(0xb);
pub const C: SwitchId = SwitchId::new(0xc);
pub const D: SwitchId = SwitchId::new(0xd);

pub fn tid(raw: u16) -> TunnelId {
    TunnelId::new(raw)
}

/// An engine whose links reserve exactly `capacity`.
pub fn engine_with_capacity(capacity: u32) -> CspfEngine {
    CspfEngine::new(EngineConfig { link_capacity: capacity, reservable_fraction: 1.0, ..Default::default() })
}

/// Brings up both directions of a cable between `a` (port `port_a`) and `b` (port `port_b`).
pub fn cable(engine: &mut impl TrafficEngineering, a: SwitchId, port_a: u16, b: SwitchId, port_b: u16) {
    engine.handle_link_event(LinkEvent::add(a, b, port_a, port_b)).unwrap();
    engine.handle_link_event(LinkEvent::add(b, a, port_b, port_a)).unwrap();
}

/// A - B - C - D, each switch uses port 1 towards its left and port 2 towards its right neighbour.
pub fn line(engine: &mut impl TrafficEngineering) {
    cable(engine, A, 2, B, 1);
    cable(engine, B, 2, C, 1);
    cable(engine, C, 2, D, 1);
}

/// Two disjoint two-hop paths from A to D: A - B - D and A - C - D.
pub fn square(engine: &mut impl TrafficEngineering) {
    cable(engine, A, 1, B, 1);
    cable(engine, A, 2, C, 1);
    cable(engine, B, 2, D, 1);
    cable(engine, C, 2, D, 2);
}

/// Available bandwidth on each link of `route`, in path order.
pub fn available_along(engine: &CspfEngine, route: &Route) -> Vec<i64> {
    route.hops().map(|(src, link)| engine.ledger().entry(src, link).map(|entry| entry.available()).unwrap_or_default()).collect()
}

pub fn available_on(engine: &CspfEngine, src: SwitchId, link: Link) -> i64 {
    engine.ledger().entry(src, &link).map(|entry| entry.available()).unwrap_or_default()
}

/// `available == total - reserved` on every link.
pub fn ledger_balanced(engine: &CspfEngine) -> bool {
    engine.ledger().entries().all(|(_, _, entry)| entry.available() == i64::from(entry.total()) - entry.reserved())
}
