use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{LlapError, Result};
use crate::kind::Kind;

/// LLAP header: destination (1) + source (1) + type (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Mask selecting the DDP length field from the first two payload bytes.
pub const DDP_LENGTH_MASK: u16 = 0x03ff;

/// Size of the DDP length field at the start of every DDP payload.
pub const DDP_LENGTH_SIZE: usize = 2;

/// Largest payload the DDP length field can describe.
pub const MAX_DDP_PAYLOAD: usize = DDP_LENGTH_MASK as usize;

/// The addressing part of an LLAP frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    /// Destination node ID (0xFF is broadcast).
    pub dst_node: u8,
    /// Source node ID.
    pub src_node: u8,
    /// LLAP type.
    pub kind: Kind,
}

/// An LLAP frame without its frame check sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
}

impl Header {
    /// Create a new header.
    pub fn new(dst_node: u8, src_node: u8, kind: impl Into<Kind>) -> Self {
        Self {
            dst_node,
            src_node,
            kind: kind.into(),
        }
    }
}

impl Packet {
    /// Create a new packet.
    pub fn new(header: Header, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            payload: payload.into(),
        }
    }

    /// Create a payload-less control packet.
    pub fn control(dst_node: u8, src_node: u8, kind: Kind) -> Self {
        Self::new(Header::new(dst_node, src_node, kind), Bytes::new())
    }

    /// Check the packet against the LLAP invariants.
    ///
    /// The type must be defined, control frames must be empty, and DDP
    /// payloads must be at least two bytes and carry their own length in the
    /// low 10 bits of those two bytes.
    pub fn validate(&self) -> Result<()> {
        let kind = self.header.kind;
        if !kind.is_known() {
            return Err(LlapError::InvalidKind(kind.0));
        }
        if kind.is_control() && !self.payload.is_empty() {
            return Err(LlapError::ControlWithPayload);
        }
        if kind.is_ddp() {
            if self.payload.len() < DDP_LENGTH_SIZE {
                return Err(LlapError::LengthMismatch {
                    actual: self.payload.len(),
                    expected: 0,
                });
            }
            let expected = ddp_length(&self.payload);
            if expected != self.payload.len() {
                return Err(LlapError::LengthMismatch {
                    actual: self.payload.len(),
                    expected,
                });
            }
        }
        Ok(())
    }

    /// Number of bytes in `header ‖ payload`.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Append `header ‖ payload` to `dst`, without escaping or checksum.
    pub fn put(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_size());
        dst.put_u8(self.header.dst_node);
        dst.put_u8(self.header.src_node);
        dst.put_u8(self.header.kind.0);
        dst.put_slice(&self.payload);
    }

    /// Parse `header ‖ payload` from raw, unescaped bytes.
    ///
    /// Only the header is checked: the type must be defined. Payload
    /// invariants are left to [`Packet::validate`]. The payload shares
    /// `data`'s buffer.
    pub fn parse(data: Bytes) -> Result<Self> {
        let &[dst_node, src_node, kind, ..] = data.as_ref() else {
            return Err(LlapError::TooShort {
                len: data.len(),
                min: HEADER_SIZE,
            });
        };
        let kind = Kind(kind);
        if !kind.is_known() {
            return Err(LlapError::InvalidKind(kind.0));
        }
        Ok(Self::new(
            Header::new(dst_node, src_node, kind),
            data.slice(HEADER_SIZE..),
        ))
    }
}

/// The length a DDP payload claims for itself.
///
/// Reads the first two bytes big-endian and keeps the low 10 bits. The top 6
/// bits are hop count and reserved flags. A payload too short to hold the
/// field claims a length of zero.
pub fn ddp_length(payload: &[u8]) -> usize {
    match payload {
        [hi, lo, ..] => (u16::from_be_bytes([*hi, *lo]) & DDP_LENGTH_MASK) as usize,
        _ => 0,
    }
}
