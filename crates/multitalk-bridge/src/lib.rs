//! Bridge groups and the interfaces that feed them.
//!
//! An [`Interface`] is a pair of packet queues: packets the bridge should
//! transmit go into `send`, packets the interface picked up come out of
//! `recv`. A [`Group`] relays every received packet to every other member.
//!
//! The adapter functions wire a device into an interface with a pair of
//! worker threads:
//! - [`ethertalk()`]: a raw Ethernet device carrying EtherTalk frames
//! - [`tcp()`]: a TCP tunnel carrying EtherTalk frames
//! - [`localtalk()`]: a TashTalk board on a LocalTalk bus

pub mod error;
pub mod ethertalk;
pub mod group;
pub mod guard;
pub mod interface;
pub mod localtalk;
pub mod tcp;

pub use error::{BridgeError, Result};
pub use ethertalk::ethertalk;
pub use group::Group;
pub use guard::{LocalStations, LoopGuard, DEFAULT_LOOP_GUARD_CAPACITY};
pub use interface::{BridgeConfig, Interface, DEFAULT_QUEUE_DEPTH};
pub use localtalk::localtalk;
pub use tcp::tcp;
