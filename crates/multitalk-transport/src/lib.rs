//! Transports that carry AppleTalk traffic into and out of the bridge.
//!
//! - [`SerialPort`]: a tty attached to a TashTalk board (Unix)
//! - [`RawSocket`]: an `AF_PACKET` socket bound to an Ethernet interface (Linux)
//! - [`Tunnel`]: a TCP connection carrying length-prefixed Ethernet frames
//!
//! Everything here moves bytes; packet formats live in the codec crates.

pub mod error;
pub mod traits;
pub mod tunnel;

#[cfg(target_os = "linux")]
pub mod raw;
#[cfg(unix)]
pub mod serial;

pub use error::{Result, TransportError};
pub use traits::LinkDevice;
pub use tunnel::{Tunnel, TunnelConfig, DEFAULT_MAX_TUNNEL_FRAME};

#[cfg(target_os = "linux")]
pub use raw::RawSocket;
#[cfg(unix)]
pub use serial::{SerialConfig, SerialPort, DEFAULT_BAUD_RATE};
