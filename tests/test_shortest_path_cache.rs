use std::collections::{HashMap, HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cspf_te_engine::domain::network::link::{Link, LinkEvent, RouteId};
use cspf_te_engine::domain::network::shortest_path_cache::ShortestPathCache;
use cspf_te_engine::domain::utils::id::SwitchId;

fn sw(raw: u64) -> SwitchId {
    SwitchId::new(raw)
}

/// Hop distances from `src` over the given links.
fn bfs(links: &HashSet<(SwitchId, Link)>, src: SwitchId) -> HashMap<SwitchId, usize> {
    let mut adjacency: HashMap<SwitchId, Vec<SwitchId>> = HashMap::new();
    for (from, link) in links {
        adjacency.entry(*from).or_default().push(link.dst);
    }

    let mut distance = HashMap::from([(src, 0)]);
    let mut queue = VecDeque::from([src]);
    while let Some(node) = queue.pop_front() {
        let next = distance[&node] + 1;
        for neighbour in adjacency.get(&node).into_iter().flatten() {
            if !distance.contains_key(neighbour) {
                distance.insert(*neighbour, next);
                queue.push_back(*neighbour);
            }
        }
    }
    distance
}

/// Compares every pair against a from-scratch BFS and checks that cached routes only use live links.
fn assert_matches_bfs(cache: &ShortestPathCache, links: &HashSet<(SwitchId, Link)>, switches: &[SwitchId], context: &str) {
    assert!(cache.is_consistent(), "cache invariants broken after {}", context);

    for &src in switches {
        let distance = bfs(links, src);
        for &dst in switches {
            if src == dst {
                continue;
            }
            let id = RouteId::new(src, dst);
            let cached = cache.shortest(&id);
            assert_eq!(cached.map(|route| route.len()), distance.get(&dst).copied(), "wrong length for {} after {}", id, context);

            if let Some(route) = cached {
                assert_eq!(route.id, id);
                assert!(route.validate().is_ok(), "invalid route {} after {}", route, context);
                for (from, link) in route.hops() {
                    assert!(links.contains(&(from, *link)), "route {} uses a dead link after {}", route, context);
                }
            }
        }
    }
}

/// Adds and removes random links from `pool`, checking the cache against BFS after every event.
/// Adds are skipped while `max_links` links are up.
fn flap_links(pool: &[(SwitchId, Link)], switches: &[SwitchId], seed: u64, steps: usize, remove_chance: f64, max_links: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cache = ShortestPathCache::new();
    let mut links: HashSet<(SwitchId, Link)> = HashSet::new();

    for step in 0..steps {
        let (src, link) = pool[rng.random_range(0..pool.len())];
        let event = if links.contains(&(src, link)) {
            if !rng.random_bool(remove_chance) {
                continue;
            }
            links.remove(&(src, link));
            LinkEvent::remove(src, link.dst, link.outport, link.inport)
        } else {
            if links.len() >= max_links {
                continue;
            }
            links.insert((src, link));
            LinkEvent::add(src, link.dst, link.outport, link.inport)
        };

        assert!(cache.apply(&event));
        assert_matches_bfs(&cache, &links, switches, &format!("seed {} step {} ({:?})", seed, step, event.action));
    }
}

/// One link per ordered pair, leaving through port `dst` and arriving at port `src`.
fn hop(src: u64, dst: u64) -> (SwitchId, Link) {
    (sw(src), Link::new(sw(dst), dst as u16, src as u16))
}

#[test]
fn test_random_link_flaps_match_bfs() {
    let switches: Vec<SwitchId> = (1..=6).map(sw).collect();

    // Two parallel cables per ordered pair.
    let mut pool: Vec<(SwitchId, Link)> = Vec::new();
    for &src in &switches {
        for &dst in &switches {
            if src != dst {
                for lane in 1..=2u16 {
                    let outport = dst.raw as u16 * 10 + lane;
                    let inport = src.raw as u16 * 10 + lane;
                    pool.push((src, Link::new(dst, outport, inport)));
                }
            }
        }
    }

    // Keep the graph reasonably dense: removals are less likely than adds.
    for seed in [1u64, 7, 42, 2024] {
        flap_links(&pool, &switches, seed, 400, 0.6, pool.len());
    }
}

#[test]
fn test_sparse_link_flaps_match_bfs() {
    // Few links over many switches leave long routes with several equally short alternatives.
    for n in [8u64, 10, 12] {
        let switches: Vec<SwitchId> = (1..=n).map(sw).collect();
        let pool: Vec<(SwitchId, Link)> = (1..=n).flat_map(|src| (1..=n).filter(move |dst| *dst != src).map(move |dst| hop(src, dst))).collect();

        for seed in 0..40u64 {
            flap_links(&pool, &switches, seed, 250, 1.0, 2 * n as usize);
        }
    }
}

#[test]
fn test_removal_keeps_pairs_with_equal_length_detours() {
    let switches: Vec<SwitchId> = (1..=8).map(sw).collect();
    let mut cache = ShortestPathCache::new();
    let mut links: HashSet<(SwitchId, Link)> = HashSet::new();

    let adds = [(7, 1), (2, 3), (7, 4), (1, 6), (5, 1), (3, 5), (5, 6), (8, 6), (2, 7), (1, 8), (3, 4), (4, 8), (7, 5)];
    for (src, dst) in adds {
        let (from, link) = hop(src, dst);
        cache.add_link(from, link);
        links.insert((from, link));
    }
    assert_matches_bfs(&cache, &links, &switches, "adds");

    for (src, dst) in [(5, 6), (7, 1)] {
        let (from, link) = hop(src, dst);
        assert!(cache.remove_link(from, link));
        links.remove(&(from, link));
        assert_matches_bfs(&cache, &links, &switches, &format!("removing {} -> {}", src, dst));
    }

    // Every remaining way from 2 to 6 takes four hops; the cache keeps the least one.
    let route = cache.shortest(&RouteId::new(sw(2), sw(6))).unwrap();
    assert_eq!(route.path, vec![Link::new(sw(3), 3, 2), Link::new(sw(4), 4, 3), Link::new(sw(8), 8, 4), Link::new(sw(6), 6, 8)]);
}

#[test]
fn test_removing_the_only_bridge_forgets_the_pair() {
    let (a, b, c, d) = (sw(1), sw(2), sw(3), sw(4));
    let mut cache = ShortestPathCache::new();
    cache.add_link(a, Link::new(b, 1, 1));
    cache.add_link(b, Link::new(c, 2, 1));
    cache.add_link(c, Link::new(d, 2, 1));

    assert_eq!(cache.shortest(&RouteId::new(a, d)).map(|route| route.len()), Some(3));
    assert_eq!(cache.len(), 6);

    assert!(cache.remove_link(b, Link::new(c, 2, 1)));
    assert!(cache.shortest(&RouteId::new(a, d)).is_none());
    assert!(cache.shortest(&RouteId::new(b, d)).is_none());
    assert!(cache.shortest(&RouteId::new(a, c)).is_none());
    assert_eq!(cache.shortest(&RouteId::new(a, b)).map(|route| route.len()), Some(1));
    assert_eq!(cache.shortest(&RouteId::new(c, d)).map(|route| route.len()), Some(1));
    assert_eq!(cache.len(), 2);
    assert!(cache.is_consistent());
}

#[test]
fn test_detour_takes_over_after_failure() {
    let (a, b, c, d, e) = (sw(1), sw(2), sw(3), sw(4), sw(5));
    let mut cache = ShortestPathCache::new();
    cache.add_link(a, Link::new(b, 1, 1));
    cache.add_link(b, Link::new(d, 2, 1));
    cache.add_link(a, Link::new(c, 2, 1));
    cache.add_link(c, Link::new(e, 2, 1));
    cache.add_link(e, Link::new(d, 2, 2));

    let short = cache.shortest(&RouteId::new(a, d)).cloned().unwrap();
    assert_eq!(short.path, vec![Link::new(b, 1, 1), Link::new(d, 2, 1)]);

    cache.remove_link(b, Link::new(d, 2, 1));
    let detour = cache.shortest(&RouteId::new(a, d)).cloned().unwrap();
    assert_eq!(detour.path, vec![Link::new(c, 2, 1), Link::new(e, 2, 1), Link::new(d, 2, 2)]);

    // Once the short link is back the two-hop route wins again.
    cache.add_link(b, Link::new(d, 2, 1));
    assert_eq!(cache.shortest(&RouteId::new(a, d)), Some(&short));
    assert!(cache.is_consistent());
}

#[test]
fn test_duplicate_and_unknown_events_are_ignored() {
    let (a, b) = (sw(1), sw(2));
    let mut cache = ShortestPathCache::new();

    assert!(cache.add_link(a, Link::new(b, 1, 1)));
    assert!(!cache.add_link(a, Link::new(b, 1, 1)));
    assert!(!cache.remove_link(a, Link::new(b, 3, 3)));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.local_routes(&RouteId::new(a, b)).len(), 1);
}
