use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::domain::network::link::{Link, Route, RouteId};
use crate::domain::network::topology::TopologyView;
use crate::domain::reservation::ledger::{EvictionMap, Ledger};
use crate::domain::utils::id::{SwitchId, TunnelId};

/// Constraints of a route lookup for one tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRequest {
    pub id: RouteId,
    pub tid: TunnelId,
    pub bandwidth: u32,
    pub priority: u8,
}

impl RouteRequest {
    pub fn new(id: RouteId, tid: TunnelId, bandwidth: u32, priority: u8) -> Self {
        Self { id, tid, bandwidth, priority }
    }
}

/// Hop-count Dijkstra from `request.id.src` restricted to links that admit the request.
///
/// A link is only considered if it improves the neighbour's distance, leaves no tunnel port
/// and passes [`Ledger::fits`]. Relaxation needs a strict improvement, so among equally short
/// feasible routes the first one discovered wins; which one that is depends on the order
/// switches leave the queue and is not otherwise defined.
///
/// Reservations the admitted links would have to preempt are written to `evictions`. Only the
/// entries along the returned route matter; see [`EvictionMap::ejected_along`].
///
/// # Returns
/// The route, or `None` if the destination cannot be reached under the constraints. A request
/// from a switch to itself yields the empty route.
pub fn find_route(
    topology: &dyn TopologyView,
    ledger: &Ledger,
    request: &RouteRequest,
    tunnel_port_start: u16,
    evictions: &mut EvictionMap,
) -> Option<Route> {
    let RouteId { src, dst } = request.id;

    let mut distance: HashMap<SwitchId, u32> = topology.switches().into_iter().map(|switch| (switch, u32::MAX)).collect();
    let mut previous: HashMap<SwitchId, (SwitchId, Link)> = HashMap::new();
    let mut visited: HashSet<SwitchId> = HashSet::new();
    let mut queue: BinaryHeap<Reverse<(u32, SwitchId)>> = BinaryHeap::new();

    distance.insert(src, 0);
    queue.push(Reverse((0, src)));

    while let Some(Reverse((_, node))) = queue.pop() {
        if !visited.insert(node) {
            continue;
        }
        let reached = distance.get(&node).copied().unwrap_or(u32::MAX);

        for link in topology.outlinks(node) {
            if visited.contains(&link.dst) {
                continue;
            }
            // Never ride on top of an existing tunnel.
            if link.uses_tunnel_port(tunnel_port_start) {
                continue;
            }

            let candidate = reached.saturating_add(1);
            let known = distance.get(&link.dst).copied().unwrap_or(u32::MAX);
            if candidate < known && ledger.fits(node, &link, request.bandwidth, request.priority, evictions) {
                distance.insert(link.dst, candidate);
                previous.insert(link.dst, (node, link));
                queue.push(Reverse((candidate, link.dst)));
            }
        }
    }

    if distance.get(&dst).copied().unwrap_or(u32::MAX) == u32::MAX {
        log::debug!("NoPathFound: {} for tunnel {} (bw {}, priority {})", request.id, request.tid, request.bandwidth, request.priority);
        return None;
    }

    let mut path: Vec<Link> = Vec::new();
    let mut current = dst;
    while current != src {
        let (from, link) = previous.get(&current)?;
        path.push(*link);
        current = *from;
    }
    path.reverse();

    let route = Route::new(request.id, path);
    log::debug!("Path found for tunnel {}: {}", request.tid, route);
    Some(route)
}
