use std::path::PathBuf;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open or configure a serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to open or bind a network interface.
    #[error("failed to open interface {name}: {source}")]
    Interface {
        name: String,
        source: std::io::Error,
    },

    /// Failed to connect to a tunnel server.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// The requested baud rate has no termios equivalent.
    #[error("unsupported baud rate {0}")]
    UnsupportedBaudRate(u32),

    /// A tunnel frame exceeded the configured maximum.
    #[error("tunnel frame too large ({len} bytes, max {max})")]
    FrameTooLarge { len: usize, max: usize },

    /// An I/O error occurred on an open transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
