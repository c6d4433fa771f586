mod common;

use common::*;
use cspf_te_engine::domain::cspf::traffic_engineering::TrafficEngineering;
use cspf_te_engine::domain::network::link::{DEFAULT_TUNNEL_PORT_START, Link, LinkEvent, RouteId};
use cspf_te_engine::error::Error;

#[test]
fn test_preemption_on_line_topology() {
    let mut engine = engine_with_capacity(100);
    line(&mut engine);

    let first = engine.get_route(RouteId::new(A, D), tid(1), 50, 5).unwrap();
    assert_eq!(first.route.len(), 3);
    assert_eq!(first.route.hops().map(|(src, link)| (src, link.dst)).collect::<Vec<_>>(), vec![(A, B), (B, C), (C, D)]);
    assert!(first.ejected.is_empty());
    assert_eq!(available_along(&engine, &first.route), vec![50, 50, 50]);

    // Priority 3 is more important than 5, so tunnel 1 has to make room.
    let second = engine.get_route(RouteId::new(A, D), tid(2), 60, 3).unwrap();
    assert_eq!(second.ejected, vec![tid(1)]);
    assert_eq!(second.route, first.route);
    assert_eq!(available_along(&engine, &second.route), vec![40, 40, 40]);

    for (src, link) in second.route.hops() {
        let entry = engine.ledger().entry(src, link).unwrap();
        assert_eq!(entry.tunnels().len(), 1);
        assert_eq!(entry.tunnels()[0].tid, tid(2));
    }

    // The reverse direction is a separate ledger entry and stays untouched.
    assert_eq!(available_on(&engine, B, Link::new(A, 1, 2)), 100);
    assert!(ledger_balanced(&engine));
}

#[test]
fn test_saturated_link_never_evicts_equal_or_more_important_tunnels() {
    let mut engine = engine_with_capacity(100);
    line(&mut engine);

    let route = engine.get_route(RouteId::new(A, B), tid(1), 100, 3).unwrap().route;

    let same_priority = engine.get_route(RouteId::new(A, B), tid(2), 10, 3);
    assert!(matches!(same_priority, Err(Error::NoFeasibleRoute { bandwidth: 10, priority: 3, .. })));

    let less_important = engine.get_route(RouteId::new(A, B), tid(3), 10, 5);
    assert!(matches!(less_important, Err(Error::NoFeasibleRoute { .. })));

    assert_eq!(available_along(&engine, &route), vec![0]);
    assert_eq!(engine.ledger().tunnels_on(A, &route.path[0]), vec![tid(1)]);
}

#[test]
fn test_eviction_takes_least_important_tunnels_only() {
    let mut engine = engine_with_capacity(100);
    cable(&mut engine, A, 1, B, 1);

    engine.get_route(RouteId::new(A, B), tid(1), 30, 7).unwrap();
    engine.get_route(RouteId::new(A, B), tid(2), 30, 6).unwrap();
    engine.get_route(RouteId::new(A, B), tid(3), 30, 5).unwrap();
    let link = Link::new(B, 1, 1);
    assert_eq!(available_on(&engine, A, link), 10);

    // 50 needs 40 more: dropping priority 7 frees 30, priority 6 the remaining 10.
    let admitted = engine.get_route(RouteId::new(A, B), tid(4), 50, 2).unwrap();
    assert_eq!(admitted.ejected, vec![tid(1), tid(2)]);
    assert_eq!(engine.ledger().tunnels_on(A, &link), vec![tid(3), tid(4)]);
    assert_eq!(available_on(&engine, A, link), 20);
    assert!(ledger_balanced(&engine));
}

#[test]
fn test_release_restores_pre_reservation_bandwidth() {
    let mut engine = engine_with_capacity(100);
    line(&mut engine);
    engine.get_route(RouteId::new(B, D), tid(9), 25, 4).unwrap();

    let mut before: Vec<i64> = engine.ledger().entries().map(|(_, _, entry)| entry.available()).collect();
    before.sort();

    let admitted = engine.get_route(RouteId::new(A, D), tid(1), 40, 4).unwrap();
    assert_eq!(available_along(&engine, &admitted.route), vec![60, 35, 35]);

    engine.release_tunnels(&[tid(1)]).unwrap();
    assert_eq!(available_along(&engine, &admitted.route), vec![100, 75, 75]);

    let mut after: Vec<i64> = engine.ledger().entries().map(|(_, _, entry)| entry.available()).collect();
    after.sort();
    assert_eq!(after, before);
}

#[test]
fn test_tunnel_ports_are_never_used() {
    let mut engine = engine_with_capacity(100);
    engine.handle_link_event(LinkEvent::add(A, B, DEFAULT_TUNNEL_PORT_START + 1, 3)).unwrap();

    // A link leaving through a tunnel port gets no ledger entry and carries no new tunnel.
    assert!(engine.ledger().entry(A, &Link::new(B, DEFAULT_TUNNEL_PORT_START + 1, 3)).is_none());
    assert!(matches!(engine.get_route(RouteId::new(A, B), tid(1), 0, 0), Err(Error::NoFeasibleRoute { .. })));

    // The shortest-path cache still knows the hop.
    assert_eq!(engine.cached_route(RouteId::new(A, B)).unwrap().map(|route| route.len()), Some(1));

    engine.handle_link_event(LinkEvent::add(A, B, 4, 4)).unwrap();
    let admitted = engine.get_route(RouteId::new(A, B), tid(1), 10, 0).unwrap();
    assert_eq!(admitted.route.path, vec![Link::new(B, 4, 4)]);
}

#[test]
fn test_second_tunnel_takes_the_disjoint_path() {
    let mut engine = engine_with_capacity(100);
    square(&mut engine);

    let first = engine.get_route(RouteId::new(A, D), tid(1), 80, 1).unwrap();
    let second = engine.get_route(RouteId::new(A, D), tid(2), 50, 1).unwrap();

    assert_eq!(first.route.len(), 2);
    assert_eq!(second.route.len(), 2);
    assert_ne!(first.route.path[0].dst, second.route.path[0].dst);
    assert!(second.ejected.is_empty());

    let third = engine.get_route(RouteId::new(A, D), tid(3), 60, 1);
    assert!(matches!(third, Err(Error::NoFeasibleRoute { .. })));
}

#[test]
fn test_parallel_links_are_tried_in_port_order() {
    let mut engine = engine_with_capacity(100);
    cable(&mut engine, A, 1, B, 1);
    cable(&mut engine, A, 2, B, 2);

    let first = engine.get_route(RouteId::new(A, B), tid(1), 80, 1).unwrap();
    let second = engine.get_route(RouteId::new(A, B), tid(2), 80, 1).unwrap();

    assert_eq!(first.route.path, vec![Link::new(B, 1, 1)]);
    assert_eq!(second.route.path, vec![Link::new(B, 2, 2)]);
}

#[test]
fn test_route_to_self_is_empty() {
    let mut engine = engine_with_capacity(100);
    line(&mut engine);

    let admitted = engine.get_route(RouteId::new(B, B), tid(1), 500, 0).unwrap();
    assert!(admitted.route.is_empty());
    assert!(ledger_balanced(&engine));
}

#[test]
fn test_reservable_fraction_of_capacity() {
    let mut engine = cspf_te_engine::domain::cspf::engine::CspfEngine::default();
    cable(&mut engine, A, 1, B, 1);

    let entry = engine.ledger().entry(A, &Link::new(B, 1, 1)).unwrap();
    assert_eq!(entry.total(), 900);
    assert_eq!(entry.available(), 900);

    assert!(engine.get_route(RouteId::new(A, B), tid(1), 901, 0).is_err());
    assert!(engine.get_route(RouteId::new(A, B), tid(1), 900, 0).is_ok());
}

#[test]
fn test_tunnel_id_in_use_is_refused() {
    let mut engine = engine_with_capacity(100);
    cable(&mut engine, A, 1, B, 1);
    let link = Link::new(B, 1, 1);

    engine.get_route(RouteId::new(A, B), tid(1), 30, 5).unwrap();

    let again = engine.get_route(RouteId::new(A, B), tid(1), 30, 5);
    assert!(matches!(again, Err(Error::TunnelExists(t)) if t == tid(1)));

    // A more important request under the same id must not preempt the tunnel itself.
    let stronger = engine.get_route(RouteId::new(A, B), tid(1), 60, 3);
    assert!(matches!(stronger, Err(Error::TunnelExists(_))));
    assert_eq!(engine.ledger().tunnels_on(A, &link), vec![tid(1)]);
    assert_eq!(available_on(&engine, A, link), 70);

    engine.release_tunnels(&[tid(1)]).unwrap();
    let reused = engine.get_route(RouteId::new(A, B), tid(1), 60, 3).unwrap();
    assert!(reused.ejected.is_empty());
    assert_eq!(available_on(&engine, A, link), 40);
}
