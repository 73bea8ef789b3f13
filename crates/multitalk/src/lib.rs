//! AppleTalk bridging between EtherTalk, TCP tunnels and LocalTalk.
//!
//! # Crate Structure
//!
//! - [`llap`]: LocalTalk Link Access Protocol packets
//! - [`tash`]: codec for TashTalk serial adapters
//! - [`ethertalk`]: EtherTalk (802.3 + SNAP) frames
//! - [`transport`]: serial ports, raw Ethernet sockets, TCP tunnels
//! - [`bridge`]: bridge groups and interface adapters

/// Re-export LLAP types.
pub mod llap {
    pub use multitalk_llap::*;
}

/// Re-export TashTalk codec types.
pub mod tash {
    pub use multitalk_tash::*;
}

/// Re-export EtherTalk types.
pub mod ethertalk {
    pub use multitalk_ethertalk::*;
}

/// Re-export transport types.
pub mod transport {
    pub use multitalk_transport::*;
}

/// Re-export bridge types.
pub mod bridge {
    pub use multitalk_bridge::*;
}
