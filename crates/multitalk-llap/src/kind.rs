//! LLAP type values.
//!
//! Types 0x01-0x7F are data frames, 0x80-0xFF are control frames. Only the
//! values below are defined; anything else is rejected before transmission.

use std::fmt;

/// The one-byte LLAP type carried in every frame header.
///
/// This is a thin wrapper over the raw byte so that packets built by an
/// application can hold any value; [`Kind::is_known`] tells whether the value
/// may be put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kind(pub u8);

impl Kind {
    /// DDP datagram with a short header.
    pub const DDP: Kind = Kind(0x01);
    /// DDP datagram with an extended header.
    pub const DDP_EXTENDED: Kind = Kind(0x02);
    /// Enquiry, used for dynamic node ID acquisition.
    pub const ENQ: Kind = Kind(0x81);
    /// Acknowledgement of an enquiry.
    pub const ACK: Kind = Kind(0x82);
    /// Request to send.
    pub const RTS: Kind = Kind(0x84);
    /// Clear to send.
    pub const CTS: Kind = Kind(0x85);

    /// All defined LLAP types.
    pub const ALL: [Kind; 6] = [
        Kind::DDP,
        Kind::DDP_EXTENDED,
        Kind::ENQ,
        Kind::ACK,
        Kind::RTS,
        Kind::CTS,
    ];

    /// Returns true if this is one of the defined LLAP types.
    pub fn is_known(self) -> bool {
        Self::ALL.contains(&self)
    }

    /// Returns true for control frame types, which never carry a payload.
    pub fn is_control(self) -> bool {
        self.0 & 0x80 != 0
    }

    /// Returns true for either DDP type.
    pub fn is_ddp(self) -> bool {
        self == Kind::DDP || self == Kind::DDP_EXTENDED
    }

    /// Returns a human-readable name for the type.
    pub fn name(self) -> &'static str {
        match self {
            Kind::DDP => "DDP",
            Kind::DDP_EXTENDED => "DDP-EXT",
            Kind::ENQ => "ENQ",
            Kind::ACK => "ACK",
            Kind::RTS => "RTS",
            Kind::CTS => "CTS",
            _ => "UNKNOWN",
        }
    }
}

impl From<u8> for Kind {
    fn from(value: u8) -> Self {
        Kind(value)
    }
}

impl From<Kind> for u8 {
    fn from(kind: Kind) -> Self {
        kind.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (${:02x})", self.name(), self.0)
    }
}
