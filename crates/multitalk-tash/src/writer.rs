use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use multitalk_llap::Packet;
use tracing::debug;

use crate::codec::{encode_node_ids, encode_packet, put_preamble, TashConfig};
use crate::error::{Result, TashError};
use crate::nodes::NodeSet;

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Writes commands to a TashTalk board.
///
/// The first command written by each encoder is preceded by the line-reset
/// preamble. Packets are validated before anything is written, so a rejected
/// packet leaves the stream untouched.
pub struct Encoder<W> {
    inner: W,
    buf: BytesMut,
    preamble_len: usize,
    preamble_sent: bool,
}

impl<W: Write> Encoder<W> {
    /// Create a new encoder with default configuration.
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, &TashConfig::default())
    }

    /// Create a new encoder with explicit configuration.
    pub fn with_config(inner: W, config: &TashConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            preamble_len: config.preamble_len,
            preamble_sent: false,
        }
    }

    /// Transmit a packet on the LocalTalk bus.
    pub fn encode(&mut self, packet: &Packet) -> Result<()> {
        self.buf.clear();
        self.start_command();
        encode_packet(packet, &mut self.buf)?;
        self.send()
    }

    /// Set the node IDs the board answers for.
    pub fn set_node_ids(&mut self, nodes: &NodeSet) -> Result<()> {
        self.buf.clear();
        self.start_command();
        encode_node_ids(nodes, &mut self.buf);
        self.send()?;
        debug!(?nodes, "set node-ID filter");
        Ok(())
    }

    fn start_command(&mut self) {
        if !self.preamble_sent {
            put_preamble(self.preamble_len, &mut self.buf);
        }
    }

    fn send(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(TashError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TashError::Io(err)),
            }
        }
        if !self.preamble_sent {
            debug!(len = self.preamble_len, "sent line-reset preamble");
            self.preamble_sent = true;
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TashError::Io(err)),
            }
        }
    }

    /// Whether the line-reset preamble has gone out.
    pub fn preamble_sent(&self) -> bool {
        self.preamble_sent
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the encoder and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use bytes::Bytes;
    use multitalk_llap::{Header, Kind, LlapError};

    use super::*;
    use crate::codec::PREAMBLE_LEN;

    fn encoder() -> Encoder<Cursor<Vec<u8>>> {
        Encoder::new(Cursor::new(Vec::new()))
    }

    fn written(encoder: Encoder<Cursor<Vec<u8>>>) -> Vec<u8> {
        encoder.into_inner().into_inner()
    }

    fn with_preamble(body: &[u8]) -> Vec<u8> {
        let mut want = vec![0u8; PREAMBLE_LEN];
        want.extend_from_slice(body);
        want
    }

    #[test]
    fn first_packet_gets_preamble() {
        let mut enc = encoder();
        enc.encode(&Packet::control(2, 1, Kind::ENQ)).unwrap();
        assert!(enc.preamble_sent());
        assert_eq!(
            written(enc),
            with_preamble(&[0x01, 0x02, 0x01, 0x81, 0x2d, 0xff])
        );
    }

    #[test]
    fn preamble_only_once() {
        let mut enc = encoder();
        enc.encode(&Packet::control(2, 1, Kind::ENQ)).unwrap();
        enc.encode(&Packet::control(1, 2, Kind::ACK)).unwrap();
        assert_eq!(
            written(enc),
            with_preamble(&[
                0x01, 0x02, 0x01, 0x81, 0x2d, 0xff, //
                0x01, 0x01, 0x02, 0x82, 0xba, 0x08,
            ])
        );
    }

    #[test]
    fn set_node_ids_first() {
        let mut enc = encoder();
        enc.set_node_ids(&NodeSet::new([1, 2, 3, 4, 5, 254]))
            .unwrap();
        let out = written(enc);
        assert_eq!(out.len(), PREAMBLE_LEN + 33);
        assert!(out[..PREAMBLE_LEN].iter().all(|&b| b == 0));
        assert_eq!(out[PREAMBLE_LEN], 0x02);
        assert_eq!(out[PREAMBLE_LEN + 1], 0x3e);
        assert_eq!(out[PREAMBLE_LEN + 32], 0x40);
    }

    #[test]
    fn node_ids_then_packet() {
        let mut enc = encoder();
        enc.set_node_ids(&NodeSet::new([1])).unwrap();
        enc.encode(&Packet::control(2, 1, Kind::ENQ)).unwrap();
        let out = written(enc);
        assert_eq!(&out[PREAMBLE_LEN + 33..], &[0x01, 0x02, 0x01, 0x81, 0x2d, 0xff]);
    }

    #[test]
    fn rejected_packets_write_nothing() {
        let bad = [
            (
                Packet::control(2, 1, Kind(13)),
                "invalid packet type: $0d",
            ),
            (
                Packet::new(Header::new(2, 1, Kind::ENQ), vec![0x00, 0x02]),
                "control frame packet with payload",
            ),
            (
                Packet::new(Header::new(2, 1, Kind::DDP), vec![0x00, 0x04, 0x03]),
                "DDP packet length mismatch: 3 vs. 4",
            ),
            (
                Packet::new(Header::new(2, 1, Kind::DDP), Bytes::new()),
                "DDP packet length mismatch: 0 vs. 0",
            ),
        ];
        for (packet, message) in bad {
            let mut enc = encoder();
            let err = enc.encode(&packet).unwrap_err();
            assert!(matches!(err, TashError::InvalidPacket(_)));
            assert_eq!(err.to_string(), message);
            assert!(!enc.preamble_sent());
            assert!(written(enc).is_empty());
        }
    }

    #[test]
    fn rejected_packet_keeps_preamble_pending() {
        let mut enc = encoder();
        let err = enc.encode(&Packet::control(2, 1, Kind(13))).unwrap_err();
        assert!(matches!(
            err,
            TashError::InvalidPacket(LlapError::InvalidKind(13))
        ));
        enc.encode(&Packet::control(2, 1, Kind::ENQ)).unwrap();
        assert_eq!(
            written(enc),
            with_preamble(&[0x01, 0x02, 0x01, 0x81, 0x2d, 0xff])
        );
    }

    #[test]
    fn zero_bytes_escaped() {
        let mut payload = vec![0x00, 0x08];
        payload.extend_from_slice(&[0x00; 6]);
        let pak = Packet::new(Header::new(0, 1, Kind::DDP), Bytes::from(payload));
        let mut enc = Encoder::with_config(
            Cursor::new(Vec::new()),
            &TashConfig {
                preamble_len: 0,
                ..TashConfig::default()
            },
        );
        enc.encode(&pak).unwrap();
        let out = written(enc);
        // dst 0x00 and seven zero payload bytes become 0x00 0xFF each.
        let zeros = out
            .windows(2)
            .filter(|w| w[0] == 0x00 && w[1] == 0xff)
            .count();
        assert_eq!(zeros, 8);
        assert!(!out.windows(2).any(|w| w[0] == 0x00 && w[1] != 0xff));
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut enc = Encoder::new(sink);
        enc.encode(&Packet::control(2, 1, Kind::ENQ)).unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write() {
        let mut enc = Encoder::new(InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        });
        enc.encode(&Packet::control(2, 1, Kind::ENQ)).unwrap();
        assert_eq!(enc.into_inner().data.len(), PREAMBLE_LEN + 6);
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut enc = Encoder::new(ZeroWriter);
        let err = enc.encode(&Packet::control(2, 1, Kind::ENQ)).unwrap_err();
        assert!(matches!(err, TashError::ConnectionClosed));
        assert!(!enc.preamble_sent());
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
