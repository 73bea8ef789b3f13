//! TashTalk serial-link codec.
//!
//! A TashTalk board sits on a LocalTalk bus and relays LLAP frames over a
//! UART. This crate turns [`Packet`] values into the byte stream the board
//! expects, and turns the board's output back into validated packets.
//!
//! Outbound, every operation is introduced by a command byte:
//! - `0x01` transmits a frame: `header ‖ payload ‖ FCS`, with each `0x00`
//!   escaped as `0x00 0xFF`
//! - `0x02` sets the node-ID filter: a raw 32-byte bitmap
//!
//! The first operation on an encoder is preceded by 1024 zero bytes, which
//! puts the board into a known state.
//!
//! Inbound, frames are terminated by `0x00 0xFD`. A `0x00 0xFA` or `0x00 0xFE`
//! marks an aborted frame or a UART framing error. Frames that fail the FCS
//! check or carry an unknown LLAP type are dropped without interrupting the
//! stream.

pub mod codec;
pub mod error;
pub mod fcs;
pub mod nodes;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    encode_node_ids, encode_packet, DecodeStats, Decoded, Discard, FrameDecoder, TashConfig,
    CMD_SET_NODE_IDS, CMD_TRANSMIT, DEFAULT_MAX_FRAME_SIZE, FCS_SIZE, MIN_FRAME_SIZE, PREAMBLE_LEN,
};
pub use error::{Result, TashError};
pub use fcs::{fcs, Fcs};
pub use multitalk_llap::{Header, Kind, Packet};
pub use nodes::{NodeSet, NODE_SET_SIZE};
pub use reader::Decoder;
pub use writer::Encoder;

#[cfg(feature = "async")]
pub use async_codec::TashCodec;
