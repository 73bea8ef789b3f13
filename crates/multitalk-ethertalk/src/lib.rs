//! EtherTalk Phase 2 frames.
//!
//! AppleTalk over Ethernet uses IEEE 802.3 framing with an 802.2 LLC/SNAP
//! header. Only the framing is handled here; the DDP or AARP payload is
//! carried opaquely.

pub mod addr;
pub mod error;
pub mod packet;

pub use addr::EthAddr;
pub use error::{EtherTalkError, Result};
pub use packet::{
    Packet, Snap, AARP_PROTO, APPLETALK_OUI, APPLETALK_PROTO, HEADER_SIZE, MAX_PAYLOAD,
    MIN_FRAME_SIZE, SNAP_SIZE,
};
