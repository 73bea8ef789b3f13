/// Errors raised while validating or parsing LLAP packets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlapError {
    /// The LLAP type byte is not a recognized value.
    #[error("invalid packet type: ${0:02x}")]
    InvalidKind(u8),

    /// A control frame (Enq, Ack, RTS, CTS) was given a payload.
    #[error("control frame packet with payload")]
    ControlWithPayload,

    /// The DDP self-length does not match the payload length.
    #[error("DDP packet length mismatch: {actual} vs. {expected}")]
    LengthMismatch { actual: usize, expected: usize },

    /// Raw bytes are too short to hold an LLAP header.
    #[error("packet too short ({len} bytes, need at least {min})")]
    TooShort { len: usize, min: usize },
}

pub type Result<T> = std::result::Result<T, LlapError>;
