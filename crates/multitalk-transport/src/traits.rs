use std::io;

/// A device that moves whole link-layer frames.
///
/// Unlike a byte stream, each `recv` returns exactly one frame and each
/// `send` transmits exactly one. Methods take `&self` so one handle can be
/// shared by a capture thread and a transmit thread.
pub trait LinkDevice: Send + Sync {
    /// Block until a frame arrives and copy it into `buf`.
    ///
    /// Returns the frame length; frames longer than `buf` are truncated.
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Transmit one frame.
    fn send(&self, frame: &[u8]) -> io::Result<()>;

    /// Device name for diagnostics.
    fn name(&self) -> &str;
}
