//! `tokio_util::codec` adapter for TashTalk streams.

use bytes::{Buf, BytesMut};
use multitalk_llap::Packet;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::codec::{
    encode_node_ids, put_frame, put_preamble, DecodeStats, Decoded, FrameDecoder, TashConfig,
};
use crate::error::TashError;
use crate::nodes::NodeSet;

/// Codec for use with `FramedRead`/`FramedWrite` over a serial stream.
///
/// Decoding yields good packets only; discarded frames are logged and
/// counted. Encoding follows the same preamble rule as [`crate::Encoder`].
#[derive(Debug)]
pub struct TashCodec {
    frame: FrameDecoder,
    stats: DecodeStats,
    preamble_len: usize,
    preamble_sent: bool,
}

impl TashCodec {
    pub fn new() -> Self {
        Self::with_config(&TashConfig::default())
    }

    pub fn with_config(config: &TashConfig) -> Self {
        Self {
            frame: FrameDecoder::new(config.max_frame_size),
            stats: DecodeStats::default(),
            preamble_len: config.preamble_len,
            preamble_sent: false,
        }
    }

    /// Counters for frames decoded so far.
    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    fn start_command(&mut self, dst: &mut BytesMut) {
        if !self.preamble_sent {
            put_preamble(self.preamble_len, dst);
            self.preamble_sent = true;
        }
    }
}

impl Default for TashCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for TashCodec {
    type Item = Packet;
    type Error = TashError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, TashError> {
        let mut consumed = 0;
        let mut found = None;
        for &byte in src.iter() {
            consumed += 1;
            let Some(decoded) = self.frame.push(byte) else {
                continue;
            };
            self.stats.record(&decoded);
            match decoded {
                Decoded::Packet(packet) => {
                    found = Some(packet);
                    break;
                }
                Decoded::Discarded(reason) => debug!(%reason, "discarded inbound frame"),
            }
        }
        src.advance(consumed);
        Ok(found)
    }
}

impl Encoder<Packet> for TashCodec {
    type Error = TashError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), TashError> {
        packet.validate()?;
        self.start_command(dst);
        put_frame(&packet, dst);
        Ok(())
    }
}

impl<'a> Encoder<&'a NodeSet> for TashCodec {
    type Error = TashError;

    fn encode(&mut self, nodes: &'a NodeSet, dst: &mut BytesMut) -> Result<(), TashError> {
        self.start_command(dst);
        encode_node_ids(nodes, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use multitalk_llap::Kind;

    use super::*;
    use crate::codec::PREAMBLE_LEN;

    #[test]
    fn decode_across_chunks() {
        let mut codec = TashCodec::new();
        let mut buf = BytesMut::from(&[0x02, 0x01, 0x81][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());

        buf.extend_from_slice(&[0x2d, 0xff, 0x00, 0xfd, 0x01]);
        let packet = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(packet, Packet::control(2, 1, Kind::ENQ));
        assert_eq!(buf.as_ref(), &[0x01]);
    }

    #[test]
    fn decode_skips_bad_frames() {
        let mut codec = TashCodec::new();
        let mut buf = BytesMut::from(
            &[
                0x02, 0x01, 0x81, 0xea, 0xea, 0x00, 0xfd, // bad FCS
                0x01, 0x02, 0x82, 0xba, 0x08, 0x00, 0xfd,
            ][..],
        );
        let packet = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(packet, Packet::control(1, 2, Kind::ACK));
        assert_eq!(codec.stats().bad_checksum, 1);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn encode_preamble_once() {
        let mut codec = TashCodec::new();
        let mut dst = BytesMut::new();
        codec
            .encode(&NodeSet::new([1, 2, 3, 4, 5, 254]), &mut dst)
            .unwrap();
        codec
            .encode(Packet::control(2, 1, Kind::ENQ), &mut dst)
            .unwrap();
        assert_eq!(dst.len(), PREAMBLE_LEN + 33 + 6);
        assert_eq!(dst[PREAMBLE_LEN], 0x02);
        assert_eq!(
            &dst[PREAMBLE_LEN + 33..],
            &[0x01, 0x02, 0x01, 0x81, 0x2d, 0xff]
        );
    }

    #[test]
    fn encode_rejects_without_output() {
        let mut codec = TashCodec::new();
        let mut dst = BytesMut::new();
        let err = codec
            .encode(Packet::control(2, 1, Kind(13)), &mut dst)
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid packet type: $0d");
        assert!(dst.is_empty());
    }
}
