/// Errors that can occur while marshalling Ethernet frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EtherTalkError {
    /// The frame is shorter than the 802.3 and SNAP headers.
    #[error("frame too short ({len} bytes, need at least {min})")]
    TooShort { len: usize, min: usize },

    /// The 802.3 length field claims more bytes than the frame holds.
    #[error("length field {claimed} exceeds frame body ({available} bytes)")]
    LengthOverrun { claimed: usize, available: usize },

    /// The payload does not fit in an 802.3 frame.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The text is not a MAC address.
    #[error("invalid Ethernet address: {0:?}")]
    InvalidAddr(String),
}

pub type Result<T> = std::result::Result<T, EtherTalkError>;
