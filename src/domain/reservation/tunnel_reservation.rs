use serde::Serialize;

use crate::domain::utils::id::TunnelId;

/// Bandwidth held by one tunnel on one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TunnelReservation {
    pub tid: TunnelId,
    /// 0 is the most important priority. Numerically higher values can be preempted by lower ones.
    pub priority: u8,
    pub bandwidth: u32,
}

impl TunnelReservation {
    pub fn new(tid: TunnelId, priority: u8, bandwidth: u32) -> Self {
        Self { tid, priority, bandwidth }
    }
}

/// Bandwidth bookkeeping of a single directed link.
///
/// `available` always equals `total` minus the bandwidth of all reservations, except
/// after [`LinkLedgerEntry::detach`] which drops a reservation without crediting it back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkLedgerEntry {
    total: u32,
    available: i64,
    tunnels: Vec<TunnelReservation>,
}

impl LinkLedgerEntry {
    pub fn new(total: u32) -> Self {
        Self { total, available: i64::from(total), tunnels: Vec::new() }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn available(&self) -> i64 {
        self.available
    }

    /// Reservations in the order they were admitted.
    pub fn tunnels(&self) -> &[TunnelReservation] {
        &self.tunnels
    }

    /// Sum of all reserved bandwidth on this link.
    pub fn reserved(&self) -> i64 {
        self.tunnels.iter().map(|t| i64::from(t.bandwidth)).sum()
    }

    pub fn holds(&self, tid: TunnelId) -> bool {
        self.tunnels.iter().any(|t| t.tid == tid)
    }

    /// Changes the link capacity, keeping existing reservations.
    pub(crate) fn set_total(&mut self, total: u32) {
        self.total = total;
        self.available = i64::from(total) - self.reserved();
    }

    pub(crate) fn reserve(&mut self, reservation: TunnelReservation) {
        self.available -= i64::from(reservation.bandwidth);
        self.tunnels.push(reservation);
    }

    /// Drops every reservation of `tid` and credits its bandwidth back.
    ///
    /// # Returns
    /// The number of reservations released.
    pub(crate) fn release(&mut self, tid: TunnelId) -> usize {
        let before = self.tunnels.len();
        let mut freed: i64 = 0;
        self.tunnels.retain(|t| {
            if t.tid == tid {
                freed += i64::from(t.bandwidth);
                false
            } else {
                true
            }
        });
        self.available += freed;
        before - self.tunnels.len()
    }

    /// Sets the bandwidth of the first reservation of `tid`.
    ///
    /// `available` moves by the difference between `old_bandwidth` and `new_bandwidth`,
    /// the figures the caller believes in, not by what was stored.
    ///
    /// # Returns
    /// `false` if `tid` holds no reservation on this link.
    pub(crate) fn resize(&mut self, tid: TunnelId, old_bandwidth: u32, new_bandwidth: u32) -> bool {
        let Some(reservation) = self.tunnels.iter_mut().find(|t| t.tid == tid) else {
            return false;
        };
        reservation.bandwidth = new_bandwidth;
        self.available -= i64::from(new_bandwidth) - i64::from(old_bandwidth);
        true
    }

    /// Drops the first reservation of `tid` WITHOUT crediting its bandwidth back.
    ///
    /// Tunnel teardown has always behaved this way; available bandwidth leaks until the
    /// link is re-initialised. Use [`LinkLedgerEntry::release`] when the freed capacity matters.
    pub(crate) fn detach(&mut self, tid: TunnelId) -> bool {
        match self.tunnels.iter().position(|t| t.tid == tid) {
            Some(index) => {
                self.tunnels.remove(index);
                true
            }
            None => false,
        }
    }
}
