use std::sync::mpsc::{self, Receiver, Sender, TrySendError};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::interface::{spawn_worker, Interface};

enum Event<P> {
    Packet { from: usize, packet: P },
    Closed { id: usize },
}

struct Member<P> {
    id: usize,
    name: String,
    /// `None` once the interface's transmit worker has gone away.
    send: Option<mpsc::SyncSender<P>>,
}

/// A set of interfaces that hear each other.
///
/// Every packet received on one member is queued for transmission on every
/// other member. Delivery is best effort: a member whose send queue is full
/// misses the packet.
pub struct Group<P> {
    members: Vec<Member<P>>,
    events: Sender<Event<P>>,
    inbox: Receiver<Event<P>>,
    next_id: usize,
}

impl<P: Clone + Send + 'static> Group<P> {
    pub fn new() -> Self {
        let (events, inbox) = mpsc::channel();
        Self {
            members: Vec::new(),
            events,
            inbox,
            next_id: 0,
        }
    }

    /// Add an interface to the group.
    ///
    /// Packets start flowing once [`Group::run`] is called.
    pub fn add(&mut self, iface: Interface<P>) -> Result<()> {
        let (name, send, recv) = iface.into_parts();
        let id = self.next_id;
        self.next_id += 1;

        let events = self.events.clone();
        spawn_worker(&name, "relay", move || {
            for packet in recv {
                if events.send(Event::Packet { from: id, packet }).is_err() {
                    return;
                }
            }
            let _ = events.send(Event::Closed { id });
        })?;

        info!(interface = %name, "added interface");
        self.members.push(Member {
            id,
            name,
            send: Some(send),
        });
        Ok(())
    }

    /// Number of live interfaces.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Relay packets until every interface has closed.
    pub fn run(mut self) {
        while !self.members.is_empty() {
            let Ok(event) = self.inbox.recv() else {
                break;
            };
            match event {
                Event::Packet { from, packet } => self.relay(from, packet),
                Event::Closed { id } => self.remove(id),
            }
        }
        info!("all interfaces closed");
    }

    fn relay(&mut self, from: usize, packet: P) {
        for member in self.members.iter_mut().filter(|m| m.id != from) {
            let Some(send) = &member.send else {
                continue;
            };
            match send.try_send(packet.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(interface = %member.name, "send queue full, dropping packet");
                }
                Err(TrySendError::Disconnected(_)) => {
                    debug!(interface = %member.name, "transmit worker stopped");
                    member.send = None;
                }
            }
        }
    }

    fn remove(&mut self, id: usize) {
        if let Some(pos) = self.members.iter().position(|m| m.id == id) {
            // Dropping the member closes its send queue.
            let member = self.members.remove(pos);
            info!(interface = %member.name, "removed interface");
        }
    }
}

impl<P: Clone + Send + 'static> Default for Group<P> {
    fn default() -> Self {
        Self::new()
    }
}
