use std::collections::HashMap;

use crate::domain::network::link::{Link, Route};
use crate::domain::reservation::tunnel_reservation::{LinkLedgerEntry, TunnelReservation};
use crate::domain::utils::id::{SwitchId, TunnelId};

/// Reservations an admission probe would have to preempt, per (source switch, link).
///
/// Filled by [`Ledger::fits`]; nothing recorded here has been removed from the ledger.
#[derive(Debug, Clone, Default)]
pub struct EvictionMap {
    entries: HashMap<SwitchId, HashMap<Link, Vec<TunnelReservation>>>,
}

impl EvictionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|links| links.values().all(|tunnels| tunnels.is_empty()))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, src: SwitchId, link: &Link) -> &[TunnelReservation] {
        self.entries.get(&src).and_then(|links| links.get(link)).map(|tunnels| tunnels.as_slice()).unwrap_or(&[])
    }

    fn record(&mut self, src: SwitchId, link: Link, victims: Vec<TunnelReservation>) {
        self.entries.entry(src).or_default().entry(link).or_default().extend(victims);
    }

    /// Tunnel ids to eject along `route`, each listed once, in path order of first appearance.
    pub fn ejected_along(&self, route: &Route) -> Vec<TunnelId> {
        let mut ejected: Vec<TunnelId> = Vec::new();
        for (src, link) in route.hops() {
            for victim in self.get(src, link) {
                if !ejected.contains(&victim.tid) {
                    ejected.push(victim.tid);
                }
            }
        }
        ejected
    }
}

/// Per-link bandwidth ledger, keyed by the switch a link leaves and the link itself.
///
/// The two directions of a cable are separate entries.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    links: HashMap<SwitchId, HashMap<Link, LinkLedgerEntry>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the entry for a link, or changes the capacity of an existing one.
    pub fn init_link(&mut self, src: SwitchId, link: Link, total: u32) {
        self.links
            .entry(src)
            .or_default()
            .entry(link)
            .and_modify(|entry| {
                log::debug!("Link {} -[{}/{}]-> {} re-initialised with total bandwidth {}", src, link.outport, link.inport, link.dst, total);
                entry.set_total(total);
            })
            .or_insert_with(|| LinkLedgerEntry::new(total));
    }

    pub fn entry(&self, src: SwitchId, link: &Link) -> Option<&LinkLedgerEntry> {
        self.links.get(&src).and_then(|links| links.get(link))
    }

    /// Iterates over every ledger entry with the switch its link leaves.
    pub fn entries(&self) -> impl Iterator<Item = (SwitchId, &Link, &LinkLedgerEntry)> + '_ {
        self.links.iter().flat_map(|(src, links)| links.iter().map(move |(link, entry)| (*src, link, entry)))
    }

    /// Tunnels holding bandwidth on a link.
    pub fn tunnels_on(&self, src: SwitchId, link: &Link) -> Vec<TunnelId> {
        self.entry(src, link).map(|entry| entry.tunnels().iter().map(|t| t.tid).collect()).unwrap_or_default()
    }

    /// Returns `true` if `tid` holds a reservation on any link.
    pub fn holds(&self, tid: TunnelId) -> bool {
        self.links.values().flat_map(|links| links.values()).any(|entry| entry.holds(tid))
    }

    /// Admission test for a single link.
    ///
    /// Admits at once when `resbw` is available. Otherwise walks the link's reservations from
    /// the least important (highest priority value) upwards, marking each one evictable until
    /// enough bandwidth is freed. The walk stops with a rejection at the first reservation whose
    /// priority is equal to or more important than `priority`.
    ///
    /// A link without a ledger entry has no capacity. Evictable reservations are recorded in
    /// `evictions` only when the link is admitted; the ledger itself is never modified.
    pub fn fits(&self, src: SwitchId, link: &Link, resbw: u32, priority: u8, evictions: &mut EvictionMap) -> bool {
        let empty = LinkLedgerEntry::default();
        let entry = self.entry(src, link).unwrap_or(&empty);
        let needed = i64::from(resbw);
        let mut available = entry.available();

        if available >= needed {
            return true;
        }
        if entry.total() < resbw {
            return false;
        }

        let mut candidates: Vec<TunnelReservation> = entry.tunnels().to_vec();
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut victims: Vec<TunnelReservation> = Vec::new();
        for candidate in candidates {
            if candidate.priority <= priority {
                return false;
            }
            available += i64::from(candidate.bandwidth);
            victims.push(candidate);
            if available >= needed {
                log::debug!(
                    "Link {} -> {} admits {} at priority {} by ejecting {:?}",
                    src,
                    link.dst,
                    resbw,
                    priority,
                    victims.iter().map(|v| v.tid).collect::<Vec<_>>()
                );
                evictions.record(src, *link, victims);
                return true;
            }
        }
        false
    }

    /// Books `resbw` for `tid` on every link of `route`. Admission must have been checked.
    pub fn set_route(&mut self, route: &Route, tid: TunnelId, priority: u8, resbw: u32) {
        for (src, link) in route.hops() {
            self.links.entry(src).or_default().entry(*link).or_default().reserve(TunnelReservation::new(tid, priority, resbw));
        }
    }

    /// Changes the reservation of `tid` on every link of `route` from `oldbw` to `newbw`.
    ///
    /// # Returns
    /// The number of links on which `tid` was found.
    pub fn change_bw(&mut self, route: &Route, tid: TunnelId, oldbw: u32, newbw: u32) -> usize {
        let mut changed = 0;
        for (src, link) in route.hops() {
            if let Some(entry) = self.entry_mut(src, link) {
                if entry.resize(tid, oldbw, newbw) {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Removes `tid` from every link in the ledger, crediting its bandwidth back.
    ///
    /// # Returns
    /// The number of reservations removed.
    pub fn remove_tid(&mut self, tid: TunnelId) -> usize {
        let mut removed = 0;
        for links in self.links.values_mut() {
            for (link, entry) in links.iter_mut() {
                let count = entry.release(tid);
                if count > 0 {
                    log::debug!("Removed tunnel {} from link towards {} (port {})", tid, link.dst, link.outport);
                }
                removed += count;
            }
        }
        removed
    }

    pub fn remove_tunnels(&mut self, ejected: &[TunnelId]) {
        for tid in ejected {
            self.remove_tid(*tid);
        }
    }

    /// Removes `tid` from exactly the links of `route`.
    ///
    /// The freed bandwidth is NOT returned to the links, so `available` stays short of
    /// `total - reserved` afterwards. Callers that need the capacity back must use
    /// [`Ledger::remove_tunnels`].
    pub fn clear_route(&mut self, route: &Route, tid: TunnelId) {
        for (src, link) in route.hops() {
            if let Some(entry) = self.entry_mut(src, link) {
                entry.detach(tid);
            }
        }
    }

    fn entry_mut(&mut self, src: SwitchId, link: &Link) -> Option<&mut LinkLedgerEntry> {
        self.links.get_mut(&src).and_then(|links| links.get_mut(link))
    }
}
