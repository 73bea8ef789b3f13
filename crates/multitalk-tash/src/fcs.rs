//! LLAP frame check sequence.
//!
//! CRC-16/X.25: reflected polynomial 0x1021 (0x8408 bit-reversed), initial
//! value 0xFFFF, final complement. Sent least-significant byte first.

const POLY: u16 = 0x8408;
const INIT: u16 = 0xffff;

const TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Incremental FCS computation.
#[derive(Debug, Clone, Copy)]
pub struct Fcs {
    crc: u16,
}

impl Fcs {
    pub fn new() -> Self {
        Self { crc: INIT }
    }

    /// Feed more bytes into the checksum.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        for &byte in data {
            let index = ((self.crc ^ u16::from(byte)) & 0xff) as usize;
            self.crc = (self.crc >> 8) ^ TABLE[index];
        }
        self
    }

    /// The final checksum value.
    pub fn value(&self) -> u16 {
        !self.crc
    }

    /// The checksum in wire order.
    pub fn to_bytes(&self) -> [u8; 2] {
        self.value().to_le_bytes()
    }
}

impl Default for Fcs {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the FCS of `data` in one call.
pub fn fcs(data: &[u8]) -> u16 {
    Fcs::new().update(data).value()
}
