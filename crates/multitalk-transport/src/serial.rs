use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, TransportError};

/// TashTalk boards run their UART at 1 Mbit/s.
pub const DEFAULT_BAUD_RATE: u32 = 1_000_000;

/// Line settings for a serial device.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub baud_rate: u32,
    /// RTS/CTS hardware flow control.
    pub flow_control: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            flow_control: true,
        }
    }
}

/// A tty in raw mode: 8N1, no echo, no line discipline.
pub struct SerialPort {
    file: File,
    path: PathBuf,
}

impl SerialPort {
    /// Open and configure a serial device.
    pub fn open(path: impl AsRef<Path>, config: &SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let speed = baud_to_speed(config.baud_rate)
            .ok_or(TransportError::UnsupportedBaudRate(config.baud_rate))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;

        configure(file.as_raw_fd(), speed, config.flow_control).map_err(|e| {
            TransportError::Open {
                path: path.clone(),
                source: e,
            }
        })?;

        info!(
            ?path,
            baud = config.baud_rate,
            flow_control = config.flow_control,
            "opened serial port"
        );
        Ok(Self { file, path })
    }

    /// Duplicate the handle so reads and writes can happen on separate threads.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            path: self.path.clone(),
        })
    }

    /// The device path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn configure(fd: RawFd, speed: libc::speed_t, flow_control: bool) -> io::Result<()> {
    // SAFETY: termios is plain data; tcgetattr fills it before any field is read.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is an open descriptor owned by the caller and `tio` is a
    // valid writable termios.
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: `tio` was initialized by tcgetattr above.
    unsafe {
        libc::cfmakeraw(&mut tio);
        if libc::cfsetispeed(&mut tio, speed) != 0 || libc::cfsetospeed(&mut tio, speed) != 0 {
            return Err(io::Error::last_os_error());
        }
    }

    tio.c_cflag |= libc::CLOCAL | libc::CREAD;
    if flow_control {
        tio.c_cflag |= libc::CRTSCTS;
    } else {
        tio.c_cflag &= !libc::CRTSCTS;
    }
    tio.c_cc[libc::VMIN] = 1;
    tio.c_cc[libc::VTIME] = 0;

    // SAFETY: `fd` is open and `tio` is fully initialized.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(io::Error::last_os_error());
    }

    // Drop anything the board sent before we were listening.
    // SAFETY: `fd` is open.
    if unsafe { libc::tcflush(fd, libc::TCIOFLUSH) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn baud_to_speed(baud: u32) -> Option<libc::speed_t> {
    let speed = match baud {
        9_600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        #[cfg(target_os = "linux")]
        460_800 => libc::B460800,
        #[cfg(target_os = "linux")]
        921_600 => libc::B921600,
        #[cfg(target_os = "linux")]
        1_000_000 => libc::B1000000,
        _ => return None,
    };
    Some(speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_board() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 1_000_000);
        assert!(config.flow_control);
    }

    #[test]
    fn unsupported_baud_rate() {
        let config = SerialConfig {
            baud_rate: 12_345,
            ..SerialConfig::default()
        };
        assert!(matches!(
            SerialPort::open("/dev/null", &config),
            Err(TransportError::UnsupportedBaudRate(12_345))
        ));
    }

    #[test]
    fn missing_device() {
        let config = SerialConfig {
            baud_rate: 115_200,
            ..SerialConfig::default()
        };
        let err = SerialPort::open("/nonexistent/tty", &config).err();
        assert!(matches!(err, Some(TransportError::Open { .. })));
    }

    #[test]
    fn not_a_tty() {
        let file = std::env::temp_dir().join(format!("multitalk-serial-{}", std::process::id()));
        std::fs::write(&file, b"").unwrap();
        let config = SerialConfig {
            baud_rate: 115_200,
            ..SerialConfig::default()
        };
        let result = SerialPort::open(&file, &config);
        let _ = std::fs::remove_file(&file);
        assert!(matches!(result, Err(TransportError::Open { .. })));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn raw_mode_over_pty() {
        use std::ffi::CStr;

        let mut master = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open("/dev/ptmx")
            .unwrap();
        let fd = master.as_raw_fd();
        let mut name = [0 as libc::c_char; 128];
        // SAFETY: `fd` is an open pty master and `name` is a writable buffer
        // of the given length.
        unsafe {
            assert_eq!(libc::grantpt(fd), 0);
            assert_eq!(libc::unlockpt(fd), 0);
            assert_eq!(libc::ptsname_r(fd, name.as_mut_ptr(), name.len()), 0);
        }
        // SAFETY: ptsname_r wrote a NUL-terminated string into `name`.
        let slave = unsafe { CStr::from_ptr(name.as_ptr()) }
            .to_str()
            .unwrap()
            .to_string();

        let mut port = SerialPort::open(&slave, &SerialConfig::default()).unwrap();
        assert_eq!(port.path(), Path::new(&slave));

        // Raw mode: zero bytes and newlines pass through untranslated.
        port.write_all(&[0x00, 0x0a, 0xfd]).unwrap();
        let mut buf = [0u8; 3];
        master.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0x00, 0x0a, 0xfd]);

        master.write_all(&[0x0d, 0x00, 0x03]).unwrap();
        let mut reader = port.try_clone().unwrap();
        let mut buf = [0u8; 3];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0x0d, 0x00, 0x03]);
    }
}
