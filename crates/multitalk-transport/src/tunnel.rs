use std::io::{self, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};

/// Default maximum tunnel frame: larger than any Ethernet frame.
pub const DEFAULT_MAX_TUNNEL_FRAME: usize = 4096;

const LENGTH_SIZE: usize = 4;

/// Configuration for a TCP tunnel.
#[derive(Debug, Clone)]
pub struct TunnelConfig {
    /// Frames longer than this are rejected on send and skipped on receive.
    pub max_frame: usize,
    /// Connect timeout. `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            max_frame: DEFAULT_MAX_TUNNEL_FRAME,
            connect_timeout: None,
        }
    }
}

/// A stream of frames, each prefixed by its length as a big-endian u32.
///
/// ```text
/// ┌──────────────┬─────────────────┐
/// │ Length (4B)  │ Frame           │
/// │ big-endian   │ (Length bytes)  │
/// └──────────────┴─────────────────┘
/// ```
pub struct Tunnel<S = TcpStream> {
    inner: S,
    config: TunnelConfig,
    buf: BytesMut,
}

impl Tunnel<TcpStream> {
    /// Connect to a tunnel server.
    pub fn connect(addr: &str, config: TunnelConfig) -> Result<Self> {
        let connect_err = |source| TransportError::Connect {
            addr: addr.to_string(),
            source,
        };
        let stream = match config.connect_timeout {
            Some(timeout) => {
                let mut last = io::Error::new(ErrorKind::NotFound, "no addresses resolved");
                let mut connected = None;
                for sock_addr in std::net::ToSocketAddrs::to_socket_addrs(addr)
                    .map_err(connect_err)?
                {
                    match TcpStream::connect_timeout(&sock_addr, timeout) {
                        Ok(stream) => {
                            connected = Some(stream);
                            break;
                        }
                        Err(err) => last = err,
                    }
                }
                connected.ok_or_else(|| connect_err(last))?
            }
            None => TcpStream::connect(addr).map_err(connect_err)?,
        };
        stream.set_nodelay(true)?;
        info!(addr, "connected to tunnel server");
        Ok(Self::new(stream, config))
    }

    /// Clone the connection so reads and writes can happen on separate threads.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self::new(self.inner.try_clone()?, self.config.clone()))
    }
}

impl<S: Read + Write> Tunnel<S> {
    /// Wrap an already-connected stream.
    pub fn new(inner: S, config: TunnelConfig) -> Self {
        Self {
            inner,
            config,
            buf: BytesMut::new(),
        }
    }

    /// Send one frame.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() > self.config.max_frame {
            return Err(TransportError::FrameTooLarge {
                len: frame.len(),
                max: self.config.max_frame,
            });
        }
        self.buf.clear();
        self.buf.reserve(LENGTH_SIZE + frame.len());
        self.buf.put_u32(frame.len() as u32);
        self.buf.put_slice(frame);
        self.inner.write_all(&self.buf).map_err(closed_on_eof)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Receive the next frame (blocking).
    ///
    /// Oversized frames are read off the stream and dropped, so the stream
    /// stays aligned on length prefixes.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            let mut prefix = [0u8; LENGTH_SIZE];
            self.inner.read_exact(&mut prefix).map_err(closed_on_eof)?;
            let len = u32::from_be_bytes(prefix) as usize;

            if len > self.config.max_frame {
                warn!(len, max = self.config.max_frame, "skipping oversized tunnel frame");
                let skipped = io::copy(&mut (&mut self.inner).take(len as u64), &mut io::sink())?;
                if skipped < len as u64 {
                    return Err(TransportError::ConnectionClosed);
                }
                continue;
            }

            let mut frame = vec![0u8; len];
            self.inner.read_exact(&mut frame).map_err(closed_on_eof)?;
            debug!(len, "received tunnel frame");
            return Ok(Bytes::from(frame));
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Consume the tunnel and return the inner stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

fn closed_on_eof(err: io::Error) -> TransportError {
    match err.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::WriteZero => TransportError::ConnectionClosed,
        _ => TransportError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::net::TcpListener;

    use super::*;

    fn tunnel(bytes: Vec<u8>) -> Tunnel<Cursor<Vec<u8>>> {
        Tunnel::new(Cursor::new(bytes), TunnelConfig::default())
    }

    #[test]
    fn write_prefixes_length() {
        let mut t = tunnel(Vec::new());
        t.write_frame(b"abc").unwrap();
        assert_eq!(t.into_inner().into_inner(), b"\x00\x00\x00\x03abc");
    }

    #[test]
    fn read_frames_in_order() {
        let mut t = tunnel(b"\x00\x00\x00\x02hi\x00\x00\x00\x00\x00\x00\x00\x03you".to_vec());
        assert_eq!(t.read_frame().unwrap().as_ref(), b"hi");
        assert!(t.read_frame().unwrap().is_empty());
        assert_eq!(t.read_frame().unwrap().as_ref(), b"you");
        assert!(matches!(
            t.read_frame().unwrap_err(),
            TransportError::ConnectionClosed
        ));
    }

    #[test]
    fn oversized_frame_is_skipped() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&8u32.to_be_bytes());
        wire.extend_from_slice(b"toolong!");
        wire.extend_from_slice(&2u32.to_be_bytes());
        wire.extend_from_slice(b"ok");

        let mut t = Tunnel::new(
            Cursor::new(wire),
            TunnelConfig {
                max_frame: 4,
                ..TunnelConfig::default()
            },
        );
        assert_eq!(t.read_frame().unwrap().as_ref(), b"ok");
    }

    #[test]
    fn oversized_frame_rejected_on_write() {
        let mut t = Tunnel::new(
            Cursor::new(Vec::new()),
            TunnelConfig {
                max_frame: 4,
                ..TunnelConfig::default()
            },
        );
        assert!(matches!(
            t.write_frame(b"toolong!"),
            Err(TransportError::FrameTooLarge { len: 8, max: 4 })
        ));
        assert!(t.into_inner().into_inner().is_empty());
    }

    #[test]
    fn truncated_frame_is_connection_closed() {
        let mut t = tunnel(b"\x00\x00\x00\x05ab".to_vec());
        assert!(matches!(
            t.read_frame().unwrap_err(),
            TransportError::ConnectionClosed
        ));
    }

    #[test]
    fn connect_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut t = Tunnel::new(stream, TunnelConfig::default());
            let frame = t.read_frame().unwrap();
            t.write_frame(&frame).unwrap();
        });

        let mut client = Tunnel::connect(&addr, TunnelConfig::default()).unwrap();
        let mut reader = client.try_clone().unwrap();
        client.write_frame(b"echo").unwrap();
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"echo");
        server.join().unwrap();
    }

    #[test]
    fn connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let config = TunnelConfig {
            connect_timeout: Some(Duration::from_millis(500)),
            ..TunnelConfig::default()
        };
        assert!(matches!(
            Tunnel::connect(&addr, config),
            Err(TransportError::Connect { .. })
        ));
    }
}
