use std::fmt;
use std::io;

use multitalk_bridge::BridgeError;
use multitalk_tash::TashError;
use multitalk_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { ref source, .. }
        | TransportError::Interface { ref source, .. }
        | TransportError::Connect { ref source, .. } => {
            let code = match source.kind() {
                io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
                io::ErrorKind::TimedOut => TIMEOUT,
                _ => TRANSPORT_ERROR,
            };
            CliError::new(code, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
        TransportError::UnsupportedBaudRate(_) => CliError::usage(format!("{context}: {err}")),
        TransportError::FrameTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        TransportError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn tash_error(context: &str, err: TashError) -> CliError {
    match err {
        TashError::Io(source) => io_error(context, source),
        TashError::InvalidPacket(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        TashError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn bridge_error(context: &str, err: BridgeError) -> CliError {
    match err {
        BridgeError::Tash(err) => tash_error(context, err),
        BridgeError::Spawn { .. } => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn open_errors_map_by_cause() {
        let denied = TransportError::Open {
            path: PathBuf::from("/dev/ttyUSB0"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(transport_error("open", denied).code, PERMISSION_DENIED);

        let missing = TransportError::Open {
            path: PathBuf::from("/dev/ttyUSB0"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let err = transport_error("open", missing);
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.starts_with("open: failed to open /dev/ttyUSB0"));
    }

    #[test]
    fn bridge_errors_unwrap_to_their_cause() {
        let err = bridge_error("localtalk", BridgeError::Tash(TashError::ConnectionClosed));
        assert_eq!(err.code, FAILURE);
        assert_eq!(err.to_string(), "localtalk: connection closed");

        let err = bridge_error(
            "ethertalk",
            BridgeError::Spawn {
                name: "eth0".to_string(),
                source: io::Error::from(io::ErrorKind::OutOfMemory),
            },
        );
        assert_eq!(err.code, INTERNAL);
        assert!(err.message.starts_with("ethertalk: failed to start worker for eth0"));
    }
}
