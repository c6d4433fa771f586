use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::scenario_dto::{LinkDto, ScenarioDto, ScenarioStepDto};
use crate::domain::cspf::traffic_engineering::{LinkReport, TrafficEngineering};
use crate::domain::network::link::{LinkEvent, Route, RouteId};
use crate::domain::utils::id::{SwitchId, TunnelId};
use crate::error::{Error, Result};

/// A recorded sequence of link events and tunnel requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioStep {
    Link(LinkEvent),
    RequestTunnel { tid: TunnelId, id: RouteId, bandwidth: u32, priority: u8 },
    ResizeTunnel { tid: TunnelId, bandwidth: u32 },
    ReleaseTunnel { tid: TunnelId },
}

impl From<ScenarioDto> for Scenario {
    fn from(dto: ScenarioDto) -> Self {
        let mut steps = Vec::with_capacity(dto.steps.len());
        for step in dto.steps {
            match step {
                ScenarioStepDto::LinkUp(link) => push_link_events(&mut steps, &link, LinkEvent::add),
                ScenarioStepDto::LinkDown(link) => push_link_events(&mut steps, &link, LinkEvent::remove),
                ScenarioStepDto::RequestTunnel(request) => steps.push(ScenarioStep::RequestTunnel {
                    tid: TunnelId::new(request.tunnel_id),
                    id: RouteId::new(SwitchId::new(request.src), SwitchId::new(request.dst)),
                    bandwidth: request.bandwidth,
                    priority: request.priority,
                }),
                ScenarioStepDto::ResizeTunnel(resize) => steps.push(ScenarioStep::ResizeTunnel { tid: TunnelId::new(resize.tunnel_id), bandwidth: resize.bandwidth }),
                ScenarioStepDto::ReleaseTunnel(release) => steps.push(ScenarioStep::ReleaseTunnel { tid: TunnelId::new(release.tunnel_id) }),
            }
        }
        Scenario { steps }
    }
}

fn push_link_events(steps: &mut Vec<ScenarioStep>, link: &LinkDto, event: fn(SwitchId, SwitchId, u16, u16) -> LinkEvent) {
    let (src, dst) = (SwitchId::new(link.src), SwitchId::new(link.dst));
    steps.push(ScenarioStep::Link(event(src, dst, link.src_port, link.dst_port)));
    if link.bidirectional {
        steps.push(ScenarioStep::Link(event(dst, src, link.dst_port, link.src_port)));
    }
}

/// What happened to one scenario step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum StepOutcome {
    LinkApplied { affected: Vec<TunnelId> },
    Admitted { tunnel: TunnelId, route: Route, ejected: Vec<TunnelId> },
    Rejected { tunnel: TunnelId, reason: String },
    Resized { tunnel: TunnelId, bandwidth: u32, rerouted: bool, ejected: Vec<TunnelId> },
    Released { tunnel: TunnelId },
    UnknownTunnel { tunnel: TunnelId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelState {
    pub tunnel: TunnelId,
    pub route: Route,
    pub bandwidth: u32,
    pub priority: u8,
}

/// Result of a replay: one outcome per executed step, the surviving tunnels and the final ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub outcomes: Vec<StepOutcome>,
    pub tunnels: Vec<TunnelState>,
    pub links: Vec<LinkReport>,
}

/// Plays a [`Scenario`] against any [`TrafficEngineering`] implementation, acting as the
/// tunnel manager: it remembers where each tunnel runs and forgets tunnels that get ejected.
///
/// Infeasible requests and rolled-back resizes are reported as outcomes. Any other error
/// aborts the replay.
pub struct ScenarioRunner<E: TrafficEngineering> {
    engine: E,
    tunnels: BTreeMap<TunnelId, TunnelState>,
}

impl<E: TrafficEngineering> ScenarioRunner<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, tunnels: BTreeMap::new() }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn tunnel(&self, tid: TunnelId) -> Option<&TunnelState> {
        self.tunnels.get(&tid)
    }

    pub fn run(&mut self, scenario: &Scenario) -> Result<ScenarioReport> {
        let mut outcomes = Vec::with_capacity(scenario.steps.len());
        for step in &scenario.steps {
            outcomes.push(self.step(step)?);
        }

        Ok(ScenarioReport { outcomes, tunnels: self.tunnels.values().cloned().collect(), links: self.engine.link_report()? })
    }

    pub fn step(&mut self, step: &ScenarioStep) -> Result<StepOutcome> {
        match step {
            ScenarioStep::Link(event) => {
                let affected = self.engine.handle_link_event(*event)?;
                Ok(StepOutcome::LinkApplied { affected })
            }
            ScenarioStep::RequestTunnel { tid, id, bandwidth, priority } => self.request_tunnel(*tid, *id, *bandwidth, *priority),
            ScenarioStep::ResizeTunnel { tid, bandwidth } => self.resize_tunnel(*tid, *bandwidth),
            ScenarioStep::ReleaseTunnel { tid } => {
                if self.tunnels.remove(tid).is_none() {
                    return Ok(StepOutcome::UnknownTunnel { tunnel: *tid });
                }
                self.engine.release_tunnels(&[*tid])?;
                Ok(StepOutcome::Released { tunnel: *tid })
            }
        }
    }

    fn request_tunnel(&mut self, tid: TunnelId, id: RouteId, bandwidth: u32, priority: u8) -> Result<StepOutcome> {
        if self.tunnels.contains_key(&tid) {
            return Ok(StepOutcome::Rejected { tunnel: tid, reason: format!("tunnel {} is already established", tid) });
        }

        match self.engine.get_route(id, tid, bandwidth, priority) {
            Ok(admitted) => {
                self.forget(&admitted.ejected);
                self.tunnels.insert(tid, TunnelState { tunnel: tid, route: admitted.route.clone(), bandwidth, priority });
                Ok(StepOutcome::Admitted { tunnel: tid, route: admitted.route, ejected: admitted.ejected })
            }
            Err(e @ (Error::NoFeasibleRoute { .. } | Error::TunnelExists(_))) => Ok(StepOutcome::Rejected { tunnel: tid, reason: e.to_string() }),
            Err(e) => Err(e),
        }
    }

    fn resize_tunnel(&mut self, tid: TunnelId, bandwidth: u32) -> Result<StepOutcome> {
        let Some(state) = self.tunnels.get(&tid).cloned() else {
            return Ok(StepOutcome::UnknownTunnel { tunnel: tid });
        };

        let check = match self.engine.resize_tunnel(&state.route, tid, state.priority, state.bandwidth, bandwidth) {
            Ok(check) => check,
            Err(e @ Error::ReservationInconsistent { .. }) => return Ok(StepOutcome::Rejected { tunnel: tid, reason: e.to_string() }),
            Err(e) => return Err(e),
        };

        if !check.fits {
            return Ok(StepOutcome::Rejected { tunnel: tid, reason: format!("no capacity for bandwidth {}", bandwidth) });
        }

        self.forget(&check.ejected);
        let rerouted = check.new_route.is_some();
        let route = check.new_route.unwrap_or(state.route);
        self.tunnels.insert(tid, TunnelState { route, bandwidth, ..state });
        Ok(StepOutcome::Resized { tunnel: tid, bandwidth, rerouted, ejected: check.ejected })
    }

    fn forget(&mut self, ejected: &[TunnelId]) {
        for tid in ejected {
            if self.tunnels.remove(tid).is_some() {
                log::info!("Tunnel {} was preempted", tid);
            }
        }
    }
}
