use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use multitalk_tash::TashConfig;

use crate::error::{BridgeError, Result};

/// Default depth of each interface queue, in packets.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Packets buffered per direction per interface before the bridge starts
    /// dropping.
    pub queue_depth: usize,
    /// Codec settings for LocalTalk interfaces.
    pub tash: TashConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            queue_depth: DEFAULT_QUEUE_DEPTH,
            tash: TashConfig::default(),
        }
    }
}

/// One member of a bridge group.
///
/// Dropping `send` tells the interface's transmit worker to stop. The
/// interface closes `recv` when its device stops delivering packets.
pub struct Interface<P> {
    name: String,
    send: SyncSender<P>,
    recv: Receiver<P>,
}

/// The device side of an [`Interface`], held by its worker threads.
pub(crate) struct Endpoint<P> {
    /// Packets the bridge wants transmitted.
    pub outbound: Receiver<P>,
    /// Packets picked up by the device.
    pub inbound: SyncSender<P>,
}

impl<P> Interface<P> {
    /// Build an interface from existing queues.
    pub fn new(name: impl Into<String>, send: SyncSender<P>, recv: Receiver<P>) -> Self {
        Self {
            name: name.into(),
            send,
            recv,
        }
    }

    pub(crate) fn channel(name: &str, depth: usize) -> (Self, Endpoint<P>) {
        let (send, outbound) = mpsc::sync_channel(depth);
        let (inbound, recv) = mpsc::sync_channel(depth);
        (Self::new(name, send, recv), Endpoint { outbound, inbound })
    }

    /// Interface name for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a packet for transmission.
    pub fn sender(&self) -> &SyncSender<P> {
        &self.send
    }

    /// Packets received by the interface.
    pub fn receiver(&self) -> &Receiver<P> {
        &self.recv
    }

    pub fn into_parts(self) -> (String, SyncSender<P>, Receiver<P>) {
        (self.name, self.send, self.recv)
    }
}

pub(crate) fn spawn_worker<F>(name: &str, role: &str, f: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(format!("{role}-{name}"))
        .spawn(f)
        .map_err(|source| BridgeError::Spawn {
            name: name.to_string(),
            source,
        })
}
