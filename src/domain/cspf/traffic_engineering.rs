use serde::Serialize;

use crate::domain::network::link::{Link, LinkEvent, Route, RouteId};
use crate::domain::reservation::tunnel_reservation::TunnelReservation;
use crate::domain::utils::id::{SwitchId, TunnelId};
use crate::error::Result;

/// A route that passed admission, together with the tunnels it preempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmittedRoute {
    pub route: Route,
    /// Tunnels that lose their reservations, each listed once, in path order.
    pub ejected: Vec<TunnelId>,
}

/// Outcome of probing a bandwidth change of an established tunnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeCheck {
    pub fits: bool,
    /// `Some` when the tunnel has to move; `None` when the current route can carry the new bandwidth.
    pub new_route: Option<Route>,
    pub ejected: Vec<TunnelId>,
}

impl ResizeCheck {
    pub fn rejected() -> Self {
        Self { fits: false, new_route: None, ejected: Vec::new() }
    }
}

/// One step of an operator-specified route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplicitHop {
    pub dst: SwitchId,
    /// `(outport, inport)` to pin a specific parallel link; `None` picks the first that admits the tunnel.
    pub ports: Option<(u16, u16)>,
}

impl ExplicitHop {
    pub fn to(dst: SwitchId) -> Self {
        Self { dst, ports: None }
    }

    pub fn via(dst: SwitchId, outport: u16, inport: u16) -> Self {
        Self { dst, ports: Some((outport, inport)) }
    }
}

/// Snapshot of one ledger entry, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    pub src: SwitchId,
    pub link: Link,
    pub total: u32,
    pub available: i64,
    pub tunnels: Vec<TunnelReservation>,
}

/// Operations the tunnel manager invokes on the traffic-engineering core.
///
/// Implemented by the engine itself and by the proxy that forwards calls to an engine running
/// on its own thread. The proxy reports a stopped engine as `Error::EngineUnavailable`; every
/// other error originates in the engine.
pub trait TrafficEngineering {
    /// Feeds a link up/down notification into topology, ledger and shortest-path cache.
    ///
    /// # Returns
    /// Tunnels holding reservations on a link that went down. They are not rerouted.
    fn handle_link_event(&mut self, event: LinkEvent) -> Result<Vec<TunnelId>>;

    /// Finds and books a route for a new tunnel, preempting lower-priority tunnels if needed.
    ///
    /// Fails with `Error::TunnelExists` while `tid` still holds a reservation anywhere.
    fn get_route(&mut self, id: RouteId, tid: TunnelId, bandwidth: u32, priority: u8) -> Result<AdmittedRoute>;

    /// Rejects a route that would send a packet back out of the port it arrived on: the first hop
    /// may not leave through `inport` and the last hop may not arrive on `outport`.
    fn check_route(&self, route: &Route, inport: u16, outport: u16) -> Result<bool>;

    /// Removes `tid` from the links of `route` without returning its bandwidth.
    fn clear_route(&mut self, route: &Route, tid: TunnelId) -> Result<()>;

    /// Removes every reservation of the given tunnels and returns their bandwidth.
    fn release_tunnels(&mut self, tids: &[TunnelId]) -> Result<()>;

    /// Admission check of a route chosen hop by hop. Nothing is booked.
    fn check_explicit_route(&self, src: SwitchId, hops: &[ExplicitHop], bandwidth: u32, priority: u8) -> Result<AdmittedRoute>;

    /// Probes whether `tid` can change from `current_bandwidth` to `new_bandwidth`. The ledger is unchanged afterwards.
    fn check_existing_route(&mut self, route: &Route, current_bandwidth: u32, priority: u8, tid: TunnelId, new_bandwidth: u32) -> Result<ResizeCheck>;

    /// Commits a resize previously approved by [`TrafficEngineering::check_existing_route`].
    fn set_existing_route(&mut self, tid: TunnelId, priority: u8, current_bandwidth: u32, new_bandwidth: u32, route: &Route, check: &ResizeCheck) -> Result<()>;

    /// Probe and commit in one step.
    fn resize_tunnel(&mut self, route: &Route, tid: TunnelId, priority: u8, current_bandwidth: u32, new_bandwidth: u32) -> Result<ResizeCheck>;

    /// The cached shortest route for `id`, ignoring bandwidth.
    fn cached_route(&self, id: RouteId) -> Result<Option<Route>>;

    /// Current state of every ledger entry, ordered by source switch and link.
    fn link_report(&self) -> Result<Vec<LinkReport>>;
}
