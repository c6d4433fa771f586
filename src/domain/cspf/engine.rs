use std::collections::HashSet;

use crate::domain::cspf::engine_config::EngineConfig;
use crate::domain::cspf::path_finder::{RouteRequest, find_route};
use crate::domain::cspf::traffic_engineering::{AdmittedRoute, ExplicitHop, LinkReport, ResizeCheck, TrafficEngineering};
use crate::domain::network::link::{Link, LinkAction, LinkEvent, Route, RouteId};
use crate::domain::network::shortest_path_cache::ShortestPathCache;
use crate::domain::network::topology::NetworkTopology;
use crate::domain::reservation::ledger::{EvictionMap, Ledger};
use crate::domain::utils::id::{SwitchId, TunnelId};
use crate::domain::utils::statistics::ANALYTICS_TARGET;
use crate::error::{Error, Result};

/// Constrained shortest path engine.
///
/// Owns the switch graph, the per-link bandwidth ledger and the incremental shortest-path
/// cache. All three are only changed through link events and the tunnel operations of
/// [`TrafficEngineering`]; a rejected request leaves them untouched.
///
/// The engine is not synchronised. Run it behind
/// [`EngineRegistry`](crate::domain::cspf::registry::engine_registry::EngineRegistry) when several
/// threads need it.
#[derive(Debug, Clone, Default)]
pub struct CspfEngine {
    config: EngineConfig,
    topology: NetworkTopology,
    ledger: Ledger,
    cache: ShortestPathCache,
}

impl CspfEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, topology: NetworkTopology::new(), ledger: Ledger::new(), cache: ShortestPathCache::new() }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn shortest_path_cache(&self) -> &ShortestPathCache {
        &self.cache
    }

    /// Overrides the reservable bandwidth of one directed link.
    ///
    /// Existing reservations stay in place; `available` is re-derived from the new total and
    /// may go negative. The value survives the link going down and coming back.
    pub fn set_link_bandwidth(&mut self, src: SwitchId, link: Link, total: u32) {
        self.config.link_bandwidth.insert((src, link), total);
        self.ledger.init_link(src, link, total);
        log::info!("LinkBandwidthSet: {} -[{}/{}]-> {} now reserves up to {}", src, link.outport, link.inport, link.dst, total);
    }

    fn tunnel_port_start(&self) -> u16 {
        self.config.tunnel_port_start
    }

    fn record_admission(&self, outcome: &'static str, tid: TunnelId, id: RouteId, bandwidth: u32, priority: u8, admitted: Option<&AdmittedRoute>) {
        match admitted {
            Some(admitted) => tracing::info!(
                target: ANALYTICS_TARGET,
                TunnelId = %tid,
                Source = %id.src,
                Destination = %id.dst,
                Bandwidth = bandwidth,
                Priority = priority,
                Hops = admitted.route.len(),
                Ejected = ?admitted.ejected,
                Outcome = outcome,
            ),
            None => tracing::info!(
                target: ANALYTICS_TARGET,
                TunnelId = %tid,
                Source = %id.src,
                Destination = %id.dst,
                Bandwidth = bandwidth,
                Priority = priority,
                Outcome = outcome,
            ),
        }
    }

    /// Picks the link that carries an explicit hop from `current`.
    fn explicit_link(&self, index: usize, current: SwitchId, hop: &ExplicitHop, bandwidth: u32, priority: u8, evictions: &mut EvictionMap) -> Result<Link> {
        let candidates = match hop.ports {
            Some((outport, inport)) => {
                let link = Link::new(hop.dst, outport, inport);
                if !self.topology.contains_link(current, &link) {
                    return Err(Error::ExplicitRouteRejected {
                        hop: index,
                        reason: format!("no link {} -[{}/{}]-> {}", current, outport, inport, hop.dst),
                    });
                }
                vec![link]
            }
            None => self.topology.links_between(current, hop.dst),
        };

        if candidates.is_empty() {
            return Err(Error::ExplicitRouteRejected { hop: index, reason: format!("no link from {} to {}", current, hop.dst) });
        }

        let physical: Vec<Link> = candidates.into_iter().filter(|link| !link.uses_tunnel_port(self.tunnel_port_start())).collect();
        if physical.is_empty() {
            return Err(Error::ExplicitRouteRejected { hop: index, reason: format!("every link from {} to {} is a tunnel", current, hop.dst) });
        }

        physical.into_iter().find(|link| self.ledger.fits(current, link, bandwidth, priority, evictions)).ok_or_else(|| Error::ExplicitRouteRejected {
            hop: index,
            reason: format!("{} to {} cannot carry {} at priority {}", current, hop.dst, bandwidth, priority),
        })
    }
}

impl TrafficEngineering for CspfEngine {
    fn handle_link_event(&mut self, event: LinkEvent) -> Result<Vec<TunnelId>> {
        let link = event.link();
        let changed = self.topology.apply(&event);

        match event.action {
            LinkAction::Add => {
                if changed && !link.uses_tunnel_port(self.tunnel_port_start()) {
                    let total = self.config.reservable_bandwidth(event.src, &link);
                    self.ledger.init_link(event.src, link, total);
                }
                self.cache.add_link(event.src, link);
                log::info!("LinkUp: {} -[{}/{}]-> {}", event.src, event.sport, event.dport, event.dst);
                Ok(Vec::new())
            }
            LinkAction::Remove => {
                self.cache.remove_link(event.src, link);
                let affected = self.ledger.tunnels_on(event.src, &link);
                log::info!("LinkDown: {} -[{}/{}]-> {}", event.src, event.sport, event.dport, event.dst);
                if !affected.is_empty() {
                    log::warn!("Tunnels {:?} still hold reservations on the failed link {} -> {} and are not rerouted", affected, event.src, event.dst);
                }
                Ok(affected)
            }
        }
    }

    fn get_route(&mut self, id: RouteId, tid: TunnelId, bandwidth: u32, priority: u8) -> Result<AdmittedRoute> {
        if self.ledger.holds(tid) {
            log::warn!("Tunnel {} rejected: it already holds a reservation", tid);
            self.record_admission("Duplicate", tid, id, bandwidth, priority, None);
            return Err(Error::TunnelExists(tid));
        }

        let request = RouteRequest::new(id, tid, bandwidth, priority);
        let mut evictions = EvictionMap::new();

        let Some(route) = find_route(&self.topology, &self.ledger, &request, self.tunnel_port_start(), &mut evictions) else {
            log::warn!("Tunnel {} rejected: no route {} for bandwidth {} at priority {}", tid, id, bandwidth, priority);
            self.record_admission("Rejected", tid, id, bandwidth, priority, None);
            return Err(Error::NoFeasibleRoute { src: id.src, dst: id.dst, bandwidth, priority });
        };

        let ejected = evictions.ejected_along(&route);
        self.ledger.remove_tunnels(&ejected);
        self.ledger.set_route(&route, tid, priority, bandwidth);

        let admitted = AdmittedRoute { route, ejected };
        log::info!("Tunnel {} admitted on {} (ejected {:?})", tid, admitted.route, admitted.ejected);
        self.record_admission("Admitted", tid, id, bandwidth, priority, Some(&admitted));
        Ok(admitted)
    }

    fn check_route(&self, route: &Route, inport: u16, outport: u16) -> Result<bool> {
        let accepted = match (route.path.first(), route.path.last()) {
            (Some(first), Some(last)) => inport != first.outport && outport != last.inport,
            _ => inport != outport,
        };
        Ok(accepted)
    }

    fn clear_route(&mut self, route: &Route, tid: TunnelId) -> Result<()> {
        // Bandwidth is not credited back here; release_tunnels does that.
        self.ledger.clear_route(route, tid);
        log::debug!("Cleared tunnel {} from {}", tid, route);
        Ok(())
    }

    fn release_tunnels(&mut self, tids: &[TunnelId]) -> Result<()> {
        self.ledger.remove_tunnels(tids);
        log::debug!("Released tunnels {:?}", tids);
        Ok(())
    }

    fn check_explicit_route(&self, src: SwitchId, hops: &[ExplicitHop], bandwidth: u32, priority: u8) -> Result<AdmittedRoute> {
        let mut evictions = EvictionMap::new();
        let mut visited: HashSet<SwitchId> = HashSet::from([src]);
        let mut current = src;
        let mut path: Vec<Link> = Vec::with_capacity(hops.len());

        for (index, hop) in hops.iter().enumerate() {
            if !visited.insert(hop.dst) {
                return Err(Error::ExplicitRouteRejected { hop: index, reason: format!("switch {} is visited twice", hop.dst) });
            }
            let link = self.explicit_link(index, current, hop, bandwidth, priority, &mut evictions)?;
            path.push(link);
            current = hop.dst;
        }

        let route = Route::new(RouteId::new(src, current), path);
        let ejected = evictions.ejected_along(&route);
        log::debug!("Explicit route {} admits bandwidth {} at priority {} (ejects {:?})", route, bandwidth, priority, ejected);
        Ok(AdmittedRoute { route, ejected })
    }

    fn check_existing_route(&mut self, route: &Route, current_bandwidth: u32, priority: u8, tid: TunnelId, new_bandwidth: u32) -> Result<ResizeCheck> {
        if new_bandwidth <= current_bandwidth {
            return Ok(ResizeCheck { fits: true, new_route: None, ejected: Vec::new() });
        }

        let delta = new_bandwidth - current_bandwidth;
        let mut evictions = EvictionMap::new();
        if route.hops().all(|(src, link)| self.ledger.fits(src, link, delta, priority, &mut evictions)) {
            let ejected = evictions.ejected_along(route);
            return Ok(ResizeCheck { fits: true, new_route: None, ejected });
        }

        // The tunnel must not block itself while looking for a new route.
        let zeroed = self.ledger.change_bw(route, tid, current_bandwidth, 0);
        if zeroed != route.len() {
            self.ledger.change_bw(route, tid, 0, current_bandwidth);
            log::error!("Tunnel {} holds a reservation on only {} of {} links of {}; resize aborted", tid, zeroed, route.len(), route);
            return Err(Error::ReservationInconsistent { tunnel: tid, route: route.id });
        }

        evictions.clear();
        let request = RouteRequest::new(route.id, tid, new_bandwidth, priority);
        let candidate = find_route(&self.topology, &self.ledger, &request, self.tunnel_port_start(), &mut evictions);

        self.ledger.change_bw(route, tid, 0, current_bandwidth);

        match candidate {
            Some(new_route) => {
                let ejected = evictions.ejected_along(&new_route);
                log::debug!("Tunnel {} needs to move to {} for bandwidth {}", tid, new_route, new_bandwidth);
                Ok(ResizeCheck { fits: true, new_route: Some(new_route), ejected })
            }
            None => {
                log::debug!("Tunnel {} cannot grow from {} to {}", tid, current_bandwidth, new_bandwidth);
                Ok(ResizeCheck::rejected())
            }
        }
    }

    fn set_existing_route(&mut self, tid: TunnelId, priority: u8, current_bandwidth: u32, new_bandwidth: u32, route: &Route, check: &ResizeCheck) -> Result<()> {
        if !check.fits {
            log::warn!("Ignoring commit of a rejected resize for tunnel {}", tid);
            return Ok(());
        }

        self.ledger.remove_tunnels(&check.ejected);

        match &check.new_route {
            None => {
                let changed = self.ledger.change_bw(route, tid, current_bandwidth, new_bandwidth);
                if changed != route.len() {
                    log::warn!("Tunnel {} resized on {} of {} links of {}", tid, changed, route.len(), route);
                }
            }
            Some(new_route) => {
                self.ledger.remove_tid(tid);
                self.ledger.set_route(new_route, tid, priority, new_bandwidth);
            }
        }

        let outcome = if check.new_route.is_some() { "Rerouted" } else { "Resized" };
        let admitted = AdmittedRoute { route: check.new_route.clone().unwrap_or_else(|| route.clone()), ejected: check.ejected.clone() };
        self.record_admission(outcome, tid, route.id, new_bandwidth, priority, Some(&admitted));
        Ok(())
    }

    fn resize_tunnel(&mut self, route: &Route, tid: TunnelId, priority: u8, current_bandwidth: u32, new_bandwidth: u32) -> Result<ResizeCheck> {
        let check = self.check_existing_route(route, current_bandwidth, priority, tid, new_bandwidth)?;
        if check.fits {
            self.set_existing_route(tid, priority, current_bandwidth, new_bandwidth, route, &check)?;
        } else {
            self.record_admission("ResizeRejected", tid, route.id, new_bandwidth, priority, None);
        }
        Ok(check)
    }

    fn cached_route(&self, id: RouteId) -> Result<Option<Route>> {
        Ok(self.cache.shortest(&id).cloned())
    }

    fn link_report(&self) -> Result<Vec<LinkReport>> {
        let mut report: Vec<LinkReport> = self
            .ledger
            .entries()
            .map(|(src, link, entry)| LinkReport { src, link: *link, total: entry.total(), available: entry.available(), tunnels: entry.tunnels().to_vec() })
            .collect();
        report.sort_by(|a, b| (a.src, a.link).cmp(&(b.src, b.link)));
        Ok(report)
    }
}
