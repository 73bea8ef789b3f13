use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};

use multitalk_ethertalk::{EthAddr, Packet};

/// Default number of transmitted packets remembered by a [`LoopGuard`].
pub const DEFAULT_LOOP_GUARD_CAPACITY: usize = 256;

/// Suppresses the bridge's own transmissions when they come back on capture.
///
/// A promiscuous capture sees every frame the bridge sends on the same
/// device. Each recorded packet cancels exactly one matching capture. If the
/// capture never shows up, the oldest record is evicted once the guard is
/// full.
#[derive(Debug)]
pub struct LoopGuard<P = Packet> {
    sent: Mutex<VecDeque<P>>,
    capacity: usize,
}

impl<P: PartialEq> LoopGuard<P> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOOP_GUARD_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sent: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Remember a packet about to be transmitted.
    pub fn record(&self, packet: P) {
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        if sent.len() == self.capacity {
            sent.pop_front();
        }
        sent.push_back(packet);
    }

    /// Returns true if `packet` was recorded, consuming the record.
    pub fn suppress(&self, packet: &P) -> bool {
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        match sent.iter().position(|p| p == packet) {
            Some(pos) => {
                sent.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of transmissions not yet seen on capture.
    pub fn pending(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<P: PartialEq> Default for LoopGuard<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Hardware addresses known to be on the local segment.
///
/// A station is local once it has been seen sending a packet that was
/// forwarded. Packets addressed to a local station are not forwarded.
#[derive(Debug, Default)]
pub struct LocalStations {
    addrs: HashSet<EthAddr>,
}

impl LocalStations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a captured packet should cross the bridge, learning
    /// its source address if so.
    pub fn admit(&mut self, packet: &Packet) -> bool {
        if self.addrs.contains(&packet.dst) {
            return false;
        }
        self.addrs.insert(packet.src);
        true
    }

    pub fn is_local(&self, addr: &EthAddr) -> bool {
        self.addrs.contains(addr)
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}
