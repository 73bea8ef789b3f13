use std::fmt;
use std::str::FromStr;

use crate::error::EtherTalkError;

/// A 48-bit Ethernet hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EthAddr(pub [u8; 6]);

impl EthAddr {
    pub const BROADCAST: EthAddr = EthAddr([0xff; 6]);

    /// Returns true for group (multicast and broadcast) addresses.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Display for EthAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for EthAddr {
    type Err = EtherTalkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EtherTalkError::InvalidAddr(s.to_string());
        let mut addr = [0u8; 6];
        let mut parts = s.split(':');
        for byte in &mut addr {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(EthAddr(addr))
    }
}
