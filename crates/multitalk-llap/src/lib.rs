//! LocalTalk Link Access Protocol (LLAP) packet model.
//!
//! An LLAP frame is a 3-byte header followed by an optional payload:
//! - destination node ID (1 byte)
//! - source node ID (1 byte)
//! - LLAP type (1 byte)
//!
//! Control frames (Enq, Ack, RTS, CTS) carry no payload. Data frames carry a
//! DDP datagram whose first two bytes describe its own length. Nothing here
//! interprets DDP beyond that length field.

pub mod error;
pub mod kind;
pub mod packet;

pub use error::{LlapError, Result};
pub use kind::Kind;
pub use packet::{
    ddp_length, Header, Packet, DDP_LENGTH_MASK, DDP_LENGTH_SIZE, HEADER_SIZE, MAX_DDP_PAYLOAD,
};
