use multitalk_llap::LlapError;

/// Errors that can occur while encoding to or decoding from a TashTalk link.
///
/// Malformed inbound frames are not errors; the decoder drops them and moves
/// on. Only a rejected outbound packet or a failure of the stream itself is
/// reported.
#[derive(Debug, thiserror::Error)]
pub enum TashError {
    /// The packet failed validation and nothing was written.
    #[error(transparent)]
    InvalidPacket(#[from] LlapError),

    /// An I/O error occurred on the serial stream.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached end of file.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, TashError>;
