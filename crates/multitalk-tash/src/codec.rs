use std::fmt;

use bytes::{BufMut, BytesMut};
use multitalk_llap::{LlapError, Packet, HEADER_SIZE, MAX_DDP_PAYLOAD};

use crate::error::Result;
use crate::fcs::{fcs, Fcs};
use crate::nodes::NodeSet;

/// Frame check sequence: 2 bytes, least-significant first.
pub const FCS_SIZE: usize = 2;

/// Smallest frame the decoder will consider: header + FCS.
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + FCS_SIZE;

/// Default limit on buffered inbound frame bytes.
pub const DEFAULT_MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_DDP_PAYLOAD + FCS_SIZE;

/// Number of zero bytes sent before the first command on a fresh encoder.
pub const PREAMBLE_LEN: usize = 1024;

/// Command byte: transmit an escaped frame.
pub const CMD_TRANSMIT: u8 = 0x01;
/// Command byte: set the node-ID filter.
pub const CMD_SET_NODE_IDS: u8 = 0x02;

/// Escape introducer on the wire.
pub const ESCAPE: u8 = 0x00;
/// `0x00 0xFF`: a literal zero data byte.
pub const ESC_LITERAL_ZERO: u8 = 0xff;
/// `0x00 0xFD`: end of a good frame.
pub const ESC_END_OF_FRAME: u8 = 0xfd;
/// `0x00 0xFA`: frame aborted by the line.
pub const ESC_ABORT: u8 = 0xfa;
/// `0x00 0xFE`: UART framing error.
pub const ESC_FRAMING_ERROR: u8 = 0xfe;

/// Configuration for the TashTalk codec.
#[derive(Debug, Clone)]
pub struct TashConfig {
    /// Zero bytes emitted before the first command. Default: 1024.
    pub preamble_len: usize,
    /// Inbound frames longer than this are discarded.
    pub max_frame_size: usize,
}

impl Default for TashConfig {
    fn default() -> Self {
        Self {
            preamble_len: PREAMBLE_LEN,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Encode a transmit command for `packet`.
///
/// Wire format:
/// ```text
/// ┌──────┬──────────────────────────────────────────┐
/// │ 0x01 │ escape(dst ‖ src ‖ kind ‖ payload ‖ FCS) │
/// └──────┴──────────────────────────────────────────┘
/// ```
///
/// The packet is validated first; on failure `dst` is left untouched.
pub fn encode_packet(packet: &Packet, dst: &mut BytesMut) -> Result<()> {
    packet.validate()?;
    put_frame(packet, dst);
    Ok(())
}

/// Encode a set-node-IDs command: `0x02` followed by the raw bitmap.
///
/// The bitmap has a fixed length, so it is sent without escaping.
pub fn encode_node_ids(nodes: &NodeSet, dst: &mut BytesMut) {
    dst.reserve(1 + nodes.as_bytes().len());
    dst.put_u8(CMD_SET_NODE_IDS);
    dst.put_slice(nodes.as_bytes());
}

/// Append the preamble to `dst`.
pub(crate) fn put_preamble(len: usize, dst: &mut BytesMut) {
    dst.put_bytes(0, len);
}

/// Append a transmit command without validating the packet.
pub(crate) fn put_frame(packet: &Packet, dst: &mut BytesMut) {
    let mut body = BytesMut::with_capacity(packet.wire_size() + FCS_SIZE);
    packet.put(&mut body);
    let check = Fcs::new().update(&body).to_bytes();
    body.put_slice(&check);

    // Worst case every byte doubles.
    dst.reserve(1 + 2 * body.len());
    dst.put_u8(CMD_TRANSMIT);
    put_escaped(&body, dst);
}

fn put_escaped(src: &[u8], dst: &mut BytesMut) {
    for &byte in src {
        if byte == ESCAPE {
            dst.put_slice(&[ESCAPE, ESC_LITERAL_ZERO]);
        } else {
            dst.put_u8(byte);
        }
    }
}

/// Why an inbound frame was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    /// Fewer bytes than a header and FCS.
    TooShort { len: usize },
    /// The received FCS did not match the computed one.
    BadChecksum { received: u16, computed: u16 },
    /// The LLAP type is not defined.
    InvalidKind(u8),
    /// The line hardware aborted the frame.
    Aborted,
    /// The UART reported a framing error.
    FramingError,
    /// The frame grew past the configured maximum.
    Oversized { len: usize },
}

impl fmt::Display for Discard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discard::TooShort { len } => write!(f, "frame too short ({len} bytes)"),
            Discard::BadChecksum { received, computed } => write!(
                f,
                "checksum mismatch (received ${received:04x}, computed ${computed:04x})"
            ),
            Discard::InvalidKind(kind) => write!(f, "invalid packet type: ${kind:02x}"),
            Discard::Aborted => f.write_str("frame aborted"),
            Discard::FramingError => f.write_str("framing error"),
            Discard::Oversized { len } => write!(f, "frame too large ({len} bytes)"),
        }
    }
}

/// The outcome of a completed inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Packet(Packet),
    Discarded(Discard),
}

/// Counters for inbound frames, by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub packets: u64,
    pub too_short: u64,
    pub bad_checksum: u64,
    pub invalid_kind: u64,
    pub aborted: u64,
    pub framing_errors: u64,
    pub oversized: u64,
}

impl DecodeStats {
    pub fn record(&mut self, decoded: &Decoded) {
        let counter = match decoded {
            Decoded::Packet(_) => &mut self.packets,
            Decoded::Discarded(Discard::TooShort { .. }) => &mut self.too_short,
            Decoded::Discarded(Discard::BadChecksum { .. }) => &mut self.bad_checksum,
            Decoded::Discarded(Discard::InvalidKind(_)) => &mut self.invalid_kind,
            Decoded::Discarded(Discard::Aborted) => &mut self.aborted,
            Decoded::Discarded(Discard::FramingError) => &mut self.framing_errors,
            Decoded::Discarded(Discard::Oversized { .. }) => &mut self.oversized,
        };
        *counter = counter.saturating_add(1);
    }

    /// Total frames dropped for any reason.
    pub fn discarded(&self) -> u64 {
        self.too_short
            + self.bad_checksum
            + self.invalid_kind
            + self.aborted
            + self.framing_errors
            + self.oversized
    }
}

/// Inbound unescaping state machine.
///
/// Bytes are pushed one at a time. A frame is completed only by an escape
/// sequence; everything else accumulates in the frame buffer.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    escaped: bool,
    overflow: usize,
    max_frame_size: usize,
}

impl FrameDecoder {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_frame_size.min(DEFAULT_MAX_FRAME_SIZE)),
            escaped: false,
            overflow: 0,
            max_frame_size,
        }
    }

    /// Feed one wire byte. Returns the outcome when it completes a frame.
    pub fn push(&mut self, byte: u8) -> Option<Decoded> {
        if !self.escaped {
            if byte == ESCAPE {
                self.escaped = true;
            } else {
                self.append(byte);
            }
            return None;
        }

        match byte {
            ESC_LITERAL_ZERO => {
                self.escaped = false;
                self.append(0x00);
                None
            }
            ESC_END_OF_FRAME => Some(self.finish()),
            ESC_ABORT => Some(self.discard(Discard::Aborted)),
            ESC_FRAMING_ERROR => Some(self.discard(Discard::FramingError)),
            // Idle runs of zeros and unknown codes keep the escape pending.
            _ => None,
        }
    }

    /// Returns true between frames.
    pub fn is_idle(&self) -> bool {
        self.buf.is_empty() && self.overflow == 0 && !self.escaped
    }

    /// Bytes of the frame in progress, including any past the size limit.
    pub fn pending_len(&self) -> usize {
        self.buf.len() + self.overflow
    }

    fn append(&mut self, byte: u8) {
        if self.buf.len() < self.max_frame_size {
            self.buf.put_u8(byte);
        } else {
            self.overflow += 1;
        }
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.escaped = false;
        self.overflow = 0;
    }

    fn discard(&mut self, reason: Discard) -> Decoded {
        self.reset();
        Decoded::Discarded(reason)
    }

    fn finish(&mut self) -> Decoded {
        let len = self.pending_len();
        if self.overflow > 0 {
            return self.discard(Discard::Oversized { len });
        }
        if len < MIN_FRAME_SIZE {
            return self.discard(Discard::TooShort { len });
        }

        let frame = self.buf.split().freeze();
        self.reset();

        let body_len = len - FCS_SIZE;
        let received = u16::from_le_bytes([frame[body_len], frame[body_len + 1]]);
        let computed = fcs(&frame[..body_len]);
        if received != computed {
            return Decoded::Discarded(Discard::BadChecksum { received, computed });
        }

        match Packet::parse(frame.slice(..body_len)) {
            Ok(packet) => Decoded::Packet(packet),
            Err(LlapError::InvalidKind(kind)) => Decoded::Discarded(Discard::InvalidKind(kind)),
            Err(_) => Decoded::Discarded(Discard::TooShort { len }),
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}
