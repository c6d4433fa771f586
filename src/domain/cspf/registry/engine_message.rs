use std::sync::mpsc;

use crate::domain::cspf::traffic_engineering::{AdmittedRoute, ExplicitHop, LinkReport, ResizeCheck};
use crate::domain::network::link::{LinkEvent, Route, RouteId};
use crate::domain::utils::id::{SwitchId, TunnelId};
use crate::error::Result;

/// One message per method of the TrafficEngineering trait.
/// Arguments are owned so the call can cross into the engine thread.
pub enum EngineMessage {
    LinkEvent {
        event: LinkEvent,
        reply_to: mpsc::Sender<Result<Vec<TunnelId>>>,
    },

    GetRoute {
        id: RouteId,
        tid: TunnelId,
        bandwidth: u32,
        priority: u8,
        reply_to: mpsc::Sender<Result<AdmittedRoute>>,
    },

    CheckRoute {
        route: Route,
        inport: u16,
        outport: u16,
        reply_to: mpsc::Sender<Result<bool>>,
    },

    ClearRoute {
        route: Route,
        tid: TunnelId,
        reply_to: mpsc::Sender<Result<()>>,
    },

    ReleaseTunnels {
        tids: Vec<TunnelId>,
        reply_to: mpsc::Sender<Result<()>>,
    },

    CheckExplicitRoute {
        src: SwitchId,
        hops: Vec<ExplicitHop>,
        bandwidth: u32,
        priority: u8,
        reply_to: mpsc::Sender<Result<AdmittedRoute>>,
    },

    CheckExistingRoute {
        route: Route,
        current_bandwidth: u32,
        priority: u8,
        tid: TunnelId,
        new_bandwidth: u32,
        reply_to: mpsc::Sender<Result<ResizeCheck>>,
    },

    SetExistingRoute {
        tid: TunnelId,
        priority: u8,
        current_bandwidth: u32,
        new_bandwidth: u32,
        route: Route,
        check: ResizeCheck,
        reply_to: mpsc::Sender<Result<()>>,
    },

    ResizeTunnel {
        route: Route,
        tid: TunnelId,
        priority: u8,
        current_bandwidth: u32,
        new_bandwidth: u32,
        reply_to: mpsc::Sender<Result<ResizeCheck>>,
    },

    CachedRoute {
        id: RouteId,
        reply_to: mpsc::Sender<Result<Option<Route>>>,
    },

    LinkReport(mpsc::Sender<Result<Vec<LinkReport>>>),

    Shutdown,
}
