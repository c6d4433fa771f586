use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::domain::utils::id::SwitchId;
use crate::error::{Error, Result};

/// First port number of the virtual tunnel interface range.
///
/// Ports at or above this number belong to established tunnels, never to physical links.
pub const DEFAULT_TUNNEL_PORT_START: u16 = 0x7e00;

/// A directed link as seen from the switch it leaves.
///
/// The source switch is implicit: it is either the route source or the `dst` of the
/// preceding link on the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Link {
    /// Switch at the far end of the link.
    pub dst: SwitchId,
    /// Port on the current switch the link is attached to.
    pub outport: u16,
    /// Port on `dst` the link arrives at.
    pub inport: u16,
}

impl Link {
    pub fn new(dst: SwitchId, outport: u16, inport: u16) -> Self {
        Self { dst, outport, inport }
    }

    /// Returns `true` if either end of the link is a virtual tunnel port.
    pub fn uses_tunnel_port(&self, tunnel_port_start: u16) -> bool {
        self.outport >= tunnel_port_start || self.inport >= tunnel_port_start
    }
}

/// Start and end switch of a route. Order matters for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RouteId {
    pub src: SwitchId,
    pub dst: SwitchId,
}

impl RouteId {
    pub fn new(src: SwitchId, dst: SwitchId) -> Self {
        Self { src, dst }
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.src, self.dst)
    }
}

/// A simple path of links from `id.src` to `id.dst`.
///
/// An empty path is only valid when source and destination are the same switch.
/// Equality covers the id and every link, so two routes between the same pair over
/// different ports are distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Route {
    pub id: RouteId,
    pub path: Vec<Link>,
}

impl Route {
    pub fn new(id: RouteId, path: Vec<Link>) -> Self {
        Self { id, path }
    }

    /// The zero-hop route of a switch to itself.
    pub fn empty(switch: SwitchId) -> Self {
        Self { id: RouteId::new(switch, switch), path: Vec::new() }
    }

    pub fn single_hop(src: SwitchId, link: Link) -> Self {
        Self { id: RouteId::new(src, link.dst), path: vec![link] }
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Iterates over the links paired with the switch each one leaves from.
    pub fn hops(&self) -> impl Iterator<Item = (SwitchId, &Link)> + '_ {
        let mut current = self.id.src;
        self.path.iter().map(move |link| {
            let from = current;
            current = link.dst;
            (from, link)
        })
    }

    /// Returns `true` if `link` leaving `from` is one of the hops of this route.
    pub fn traverses(&self, from: SwitchId, link: &Link) -> bool {
        self.hops().any(|(src, l)| src == from && l == link)
    }

    /// The route with its last hop trimmed off.
    pub fn without_last(&self) -> Route {
        let mut path = self.path.clone();
        path.pop();
        let dst = path.last().map(|link| link.dst).unwrap_or(self.id.src);
        Route { id: RouteId::new(self.id.src, dst), path }
    }

    /// The route with its first hop trimmed off.
    pub fn without_first(&self) -> Route {
        match self.path.first() {
            Some(first) => Route { id: RouteId::new(first.dst, self.id.dst), path: self.path[1..].to_vec() },
            None => self.clone(),
        }
    }

    /// A new route that reaches this one through `link` leaving `src`.
    pub fn prepend(&self, src: SwitchId, link: Link) -> Route {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.push(link);
        path.extend_from_slice(&self.path);
        Route { id: RouteId::new(src, self.id.dst), path }
    }

    /// A new route that continues past this one's destination through `link`.
    pub fn append(&self, link: Link) -> Route {
        let mut path = self.path.clone();
        path.push(link);
        Route { id: RouteId::new(self.id.src, link.dst), path }
    }

    /// Checks that the links chain from `id.src` to `id.dst` without revisiting a switch.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<SwitchId> = HashSet::new();
        seen.insert(self.id.src);

        for link in &self.path {
            if !seen.insert(link.dst) {
                return Err(Error::InvalidRoute(format!("route {} visits switch {} twice", self.id, link.dst)));
            }
        }

        let end = self.path.last().map(|link| link.dst).unwrap_or(self.id.src);
        if end != self.id.dst {
            return Err(Error::InvalidRoute(format!("route {} ends at {} instead of {}", self.id, end, self.id.dst)));
        }

        Ok(())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id.src)?;
        for link in &self.path {
            write!(f, " -[{}/{}]-> {}", link.outport, link.inport, link.dst)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Add,
    Remove,
}

/// Link up/down notification from topology discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkEvent {
    pub src: SwitchId,
    pub dst: SwitchId,
    pub sport: u16,
    pub dport: u16,
    pub action: LinkAction,
}

impl LinkEvent {
    pub fn add(src: SwitchId, dst: SwitchId, sport: u16, dport: u16) -> Self {
        Self { src, dst, sport, dport, action: LinkAction::Add }
    }

    pub fn remove(src: SwitchId, dst: SwitchId, sport: u16, dport: u16) -> Self {
        Self { src, dst, sport, dport, action: LinkAction::Remove }
    }

    /// The link as seen from `src`.
    pub fn link(&self) -> Link {
        Link::new(self.dst, self.sport, self.dport)
    }
}
