use std::sync::mpsc;

use crate::domain::cspf::registry::engine_message::EngineMessage;
use crate::domain::cspf::traffic_engineering::{AdmittedRoute, ExplicitHop, LinkReport, ResizeCheck, TrafficEngineering};
use crate::domain::network::link::{LinkEvent, Route, RouteId};
use crate::domain::utils::id::{SwitchId, TunnelId};
use crate::error::{Error, Result};

/// Proxy forwards every call to the thread owning the engine and waits for the answer.
///
/// Calls from clones of the same proxy are executed one at a time, in the order they reach
/// the engine thread. A probe and its commit are therefore only back-to-back if a single
/// caller drives that tunnel; [`TrafficEngineering::resize_tunnel`] does both in one message.
#[derive(Debug, Clone)]
pub struct CspfEngineProxy {
    pub name: String,
    pub tx: mpsc::Sender<EngineMessage>,
}

impl CspfEngineProxy {
    fn call<R, F>(&self, msg_builder: F) -> Result<R>
    where
        F: FnOnce(mpsc::Sender<R>) -> EngineMessage,
    {
        let (reply_tx, reply_rx) = mpsc::channel();
        let msg = msg_builder(reply_tx);

        if self.tx.send(msg).is_err() {
            return Err(Error::EngineUnavailable(format!("engine {} no longer accepts requests", self.name)));
        }
        reply_rx.recv().map_err(|_| Error::EngineUnavailable(format!("engine {} stopped before answering", self.name)))
    }

    /// Asks the engine thread to stop once it has drained the messages queued before this one.
    pub fn shutdown(&self) -> Result<()> {
        self.tx.send(EngineMessage::Shutdown).map_err(|_| Error::EngineUnavailable(format!("engine {} already stopped", self.name)))
    }
}

impl TrafficEngineering for CspfEngineProxy {
    fn handle_link_event(&mut self, event: LinkEvent) -> Result<Vec<TunnelId>> {
        self.call(|tx| EngineMessage::LinkEvent { event, reply_to: tx })?
    }

    fn get_route(&mut self, id: RouteId, tid: TunnelId, bandwidth: u32, priority: u8) -> Result<AdmittedRoute> {
        self.call(|tx| EngineMessage::GetRoute { id, tid, bandwidth, priority, reply_to: tx })?
    }

    fn check_route(&self, route: &Route, inport: u16, outport: u16) -> Result<bool> {
        self.call(|tx| EngineMessage::CheckRoute { route: route.clone(), inport, outport, reply_to: tx })?
    }

    fn clear_route(&mut self, route: &Route, tid: TunnelId) -> Result<()> {
        self.call(|tx| EngineMessage::ClearRoute { route: route.clone(), tid, reply_to: tx })?
    }

    fn release_tunnels(&mut self, tids: &[TunnelId]) -> Result<()> {
        self.call(|tx| EngineMessage::ReleaseTunnels { tids: tids.to_vec(), reply_to: tx })?
    }

    fn check_explicit_route(&self, src: SwitchId, hops: &[ExplicitHop], bandwidth: u32, priority: u8) -> Result<AdmittedRoute> {
        self.call(|tx| EngineMessage::CheckExplicitRoute { src, hops: hops.to_vec(), bandwidth, priority, reply_to: tx })?
    }

    fn check_existing_route(&mut self, route: &Route, current_bandwidth: u32, priority: u8, tid: TunnelId, new_bandwidth: u32) -> Result<ResizeCheck> {
        self.call(|tx| EngineMessage::CheckExistingRoute { route: route.clone(), current_bandwidth, priority, tid, new_bandwidth, reply_to: tx })?
    }

    fn set_existing_route(&mut self, tid: TunnelId, priority: u8, current_bandwidth: u32, new_bandwidth: u32, route: &Route, check: &ResizeCheck) -> Result<()> {
        self.call(|tx| EngineMessage::SetExistingRoute {
            tid,
            priority,
            current_bandwidth,
            new_bandwidth,
            route: route.clone(),
            check: check.clone(),
            reply_to: tx,
        })?
    }

    fn resize_tunnel(&mut self, route: &Route, tid: TunnelId, priority: u8, current_bandwidth: u32, new_bandwidth: u32) -> Result<ResizeCheck> {
        self.call(|tx| EngineMessage::ResizeTunnel { route: route.clone(), tid, priority, current_bandwidth, new_bandwidth, reply_to: tx })?
    }

    fn cached_route(&self, id: RouteId) -> Result<Option<Route>> {
        self.call(|tx| EngineMessage::CachedRoute { id, reply_to: tx })?
    }

    fn link_report(&self) -> Result<Vec<LinkReport>> {
        self.call(EngineMessage::LinkReport)?
    }
}
