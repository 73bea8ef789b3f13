use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use multitalk_llap::Packet;
use tracing::debug;

use crate::codec::{DecodeStats, Decoded, FrameDecoder, TashConfig};
use crate::error::{Result, TashError};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads LLAP packets from the output of a TashTalk board.
///
/// Frames that fail validation are dropped and counted; callers only ever
/// see good packets. Bytes left over from one read are kept for the next
/// call, so decoding resumes exactly where the stream left off.
pub struct Decoder<R> {
    inner: R,
    pending: BytesMut,
    frame: FrameDecoder,
    stats: DecodeStats,
}

impl<R: Read> Decoder<R> {
    /// Create a new decoder with default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, &TashConfig::default())
    }

    /// Create a new decoder with explicit configuration.
    pub fn with_config(inner: R, config: &TashConfig) -> Self {
        Self {
            inner,
            pending: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            frame: FrameDecoder::new(config.max_frame_size),
            stats: DecodeStats::default(),
        }
    }

    /// Read the next good packet (blocking).
    ///
    /// Returns `Err(TashError::ConnectionClosed)` when EOF is reached. A frame
    /// still in progress at EOF is dropped.
    pub fn decode(&mut self) -> Result<Packet> {
        loop {
            if let Decoded::Packet(packet) = self.next_frame()? {
                return Ok(packet);
            }
        }
    }

    /// Read until the next frame boundary and report its outcome, whether a
    /// packet or a discarded frame.
    pub fn next_frame(&mut self) -> Result<Decoded> {
        loop {
            if let Some(decoded) = self.drain_pending() {
                self.stats.record(&decoded);
                if let Decoded::Discarded(reason) = &decoded {
                    debug!(%reason, "discarded inbound frame");
                }
                return Ok(decoded);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TashError::Io(err)),
            };

            if read == 0 {
                if !self.frame.is_idle() {
                    debug!(
                        len = self.frame.pending_len(),
                        "stream ended inside a frame"
                    );
                }
                return Err(TashError::ConnectionClosed);
            }

            self.pending.extend_from_slice(&chunk[..read]);
        }
    }

    fn drain_pending(&mut self) -> Option<Decoded> {
        let mut consumed = 0;
        let mut decoded = None;
        for &byte in self.pending.iter() {
            consumed += 1;
            decoded = self.frame.push(byte);
            if decoded.is_some() {
                break;
            }
        }
        self.pending.advance(consumed);
        decoded
    }

    /// Counters for frames seen so far.
    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the decoder and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Yields packets until end of stream. I/O errors are yielded once each.
impl<R: Read> Iterator for Decoder<R> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.decode() {
            Ok(packet) => Some(Ok(packet)),
            Err(TashError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
