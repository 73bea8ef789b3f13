use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::addr::EthAddr;
use crate::error::{EtherTalkError, Result};

/// 802.3 header: destination (6) + source (6) + length (2) = 14 bytes.
pub const HEADER_SIZE: usize = 14;

/// 802.2 LLC (3) + SNAP (5) = 8 bytes.
pub const SNAP_SIZE: usize = 8;

/// Minimum Ethernet frame size, excluding the trailing CRC.
pub const MIN_FRAME_SIZE: usize = 60;

/// Largest payload that fits behind the SNAP header in an 802.3 frame.
pub const MAX_PAYLOAD: usize = 1500 - SNAP_SIZE;

/// SNAP organization code for AppleTalk (Apple Computer).
pub const APPLETALK_OUI: [u8; 3] = [0x08, 0x00, 0x07];

/// SNAP protocol ID of AppleTalk DDP.
pub const APPLETALK_PROTO: u16 = 0x809b;

/// SNAP protocol ID of the AppleTalk Address Resolution Protocol.
pub const AARP_PROTO: u16 = 0x80f3;

const LLC_SAP_SNAP: u8 = 0xaa;
const LLC_UI: u8 = 0x03;

/// An 802.2 LLC header followed by a SNAP extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Snap {
    pub dsap: u8,
    pub ssap: u8,
    pub control: u8,
    pub oui: [u8; 3],
    pub proto: u16,
}

impl Snap {
    /// SNAP header for AppleTalk DDP.
    pub fn appletalk() -> Self {
        Self::with_proto(APPLETALK_OUI, APPLETALK_PROTO)
    }

    /// SNAP header for AARP.
    pub fn aarp() -> Self {
        Self::with_proto([0x00, 0x00, 0x00], AARP_PROTO)
    }

    fn with_proto(oui: [u8; 3], proto: u16) -> Self {
        Self {
            dsap: LLC_SAP_SNAP,
            ssap: LLC_SAP_SNAP,
            control: LLC_UI,
            oui,
            proto,
        }
    }
}

/// An EtherTalk frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    pub dst: EthAddr,
    pub src: EthAddr,
    pub snap: Snap,
    pub payload: Bytes,
}

impl Packet {
    /// Create a new packet.
    pub fn new(dst: EthAddr, src: EthAddr, snap: Snap, payload: impl Into<Bytes>) -> Self {
        Self {
            dst,
            src,
            snap,
            payload: payload.into(),
        }
    }

    /// Returns true if the frame carries AppleTalk or AARP.
    pub fn is_appletalk(&self) -> bool {
        matches!(self.snap.proto, APPLETALK_PROTO | AARP_PROTO)
    }

    /// Append the wire form of this frame to `dst`.
    ///
    /// Wire format:
    /// ```text
    /// ┌─────┬─────┬────────┬──────┬──────┬──────┬─────┬───────┬─────────┬─────┐
    /// │ dst │ src │ length │ DSAP │ SSAP │ ctrl │ OUI │ proto │ payload │ pad │
    /// │ 6B  │ 6B  │ 2B BE  │ 1B   │ 1B   │ 1B   │ 3B  │ 2B BE │         │     │
    /// └─────┴─────┴────────┴──────┴──────┴──────┴─────┴───────┴─────────┴─────┘
    /// ```
    ///
    /// `length` counts the SNAP header and payload. Short frames are padded
    /// with zeros to the Ethernet minimum.
    pub fn put(&self, dst: &mut BytesMut) -> Result<()> {
        if self.payload.len() > MAX_PAYLOAD {
            return Err(EtherTalkError::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        let length = SNAP_SIZE + self.payload.len();
        let total = HEADER_SIZE + length;

        dst.reserve(total.max(MIN_FRAME_SIZE));
        dst.put_slice(&self.dst.0);
        dst.put_slice(&self.src.0);
        dst.put_u16(length as u16);
        dst.put_u8(self.snap.dsap);
        dst.put_u8(self.snap.ssap);
        dst.put_u8(self.snap.control);
        dst.put_slice(&self.snap.oui);
        dst.put_u16(self.snap.proto);
        dst.put_slice(&self.payload);
        if total < MIN_FRAME_SIZE {
            dst.put_bytes(0, MIN_FRAME_SIZE - total);
        }
        Ok(())
    }

    /// Marshal this frame into a new buffer.
    pub fn marshal(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.put(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Parse a frame. Bytes past the 802.3 length (padding) are ignored.
    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        const MIN: usize = HEADER_SIZE + SNAP_SIZE;
        if data.len() < MIN {
            return Err(EtherTalkError::TooShort {
                len: data.len(),
                min: MIN,
            });
        }

        let mut buf = data;
        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        buf.copy_to_slice(&mut dst);
        buf.copy_to_slice(&mut src);
        let length = buf.get_u16() as usize;
        if length < SNAP_SIZE {
            return Err(EtherTalkError::TooShort {
                len: HEADER_SIZE + length,
                min: MIN,
            });
        }
        if length > buf.len() {
            return Err(EtherTalkError::LengthOverrun {
                claimed: length,
                available: buf.len(),
            });
        }

        let dsap = buf.get_u8();
        let ssap = buf.get_u8();
        let control = buf.get_u8();
        let mut oui = [0u8; 3];
        buf.copy_to_slice(&mut oui);
        let proto = buf.get_u16();
        let payload = Bytes::copy_from_slice(&buf[..length - SNAP_SIZE]);

        Ok(Self {
            dst: EthAddr(dst),
            src: EthAddr(src),
            snap: Snap {
                dsap,
                ssap,
                control,
                oui,
                proto,
            },
            payload,
        })
    }
}
