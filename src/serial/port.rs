//! Abstractions for working with serial ports.

use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};

use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

/// A function for opening serial ports given a path.
pub trait OpenPort: FnOnce(&Path) -> serialport::Result<Box<dyn SerialPort>> + Send {}

impl<T> OpenPort for T
where
    T: FnOnce(&Path) -> serialport::Result<Box<dyn SerialPort>> + Send {}

/// The link parameters for the hardware UART, fixed when the port is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// The read timeout. Reads in this crate only ever drain already-buffered bytes, so this
    /// bounds the transport call rather than the wait for a reply.
    pub timeout: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        LinkSettings {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_secs(1),
        }
    }
}

/// A wrapper around an open serial port.
///
/// The port is opened once, at construction; there is no reconnection logic. A failure to open
/// is fatal to the process, while transport errors on an open port are reported per operation.
pub struct Port {
    port: Box<dyn SerialPort>,
}

impl Port {
    /// Opens the serial port at `path` with the default [`LinkSettings`].
    pub fn open(path: &Path) -> serialport::Result<Self> {
        Port::with_open_fn(path, open_serial_port)
    }

    /// Like [`open`][Self::open], but uses a custom function for opening the serial port.
    pub fn with_open_fn<F: OpenPort>(path: &Path, open_fn: F) -> serialport::Result<Self> {
        open_fn(path).map(|port| Port { port })
    }

    /// Returns how many bytes are currently buffered for reading, without blocking.
    pub fn bytes_to_read(&mut self) -> io::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(Into::into)
    }

    /// Reads and returns exactly the currently buffered bytes, which may be none.
    pub fn read_available(&mut self) -> io::Result<Vec<u8>> {
        let available = self.bytes_to_read()?;

        let mut buf = vec![0; available];
        let bytes = if available > 0 {
            self.port.read(&mut buf)?
        } else {
            0
        };
        buf.truncate(bytes);

        Ok(buf)
    }
}

impl Read for Port {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for Port {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

/// Attempts to open the serial port at the provided path with the default link settings.
fn open_serial_port(path: &Path) -> serialport::Result<Box<dyn SerialPort>> {
    let settings = LinkSettings::default();

    serialport::new(path.to_string_lossy(), settings.baud_rate)
        .data_bits(settings.data_bits)
        .parity(settings.parity)
        .stop_bits(settings.stop_bits)
        .timeout(settings.timeout)
        .open()
        .and_then(|p| {
            // Clear the serial port buffers to avoid reading garbage data
            p.clear(ClearBuffer::All).map(|_| p)
        })
}

#[cfg(test)]
mod tests {
    use mock::serial::TestPort;

    use super::*;

    const FAKE_PORT: &str = "fakeport";

    /// Returns a `Port` backed by a `TestPort` and a handle to control it.
    fn initialize_port() -> (Port, TestPort) {
        let test_port = TestPort::new().unwrap();
        let test_port_handle = test_port.clone();

        let port = Port::with_open_fn(
            Path::new(FAKE_PORT),
            move |_: &Path| -> serialport::Result<Box<dyn SerialPort>> {
                Ok(Box::new(test_port))
            },
        ).unwrap();

        (port, test_port_handle)
    }

    #[test]
    fn test_default_link_settings() {
        let settings = LinkSettings::default();

        assert_eq!(9600, settings.baud_rate);
        assert_eq!(DataBits::Eight, settings.data_bits);
        assert_eq!(Parity::None, settings.parity);
        assert_eq!(StopBits::One, settings.stop_bits);
        assert_eq!(Duration::from_secs(1), settings.timeout);
    }

    #[test]
    fn test_open_failure() {
        let result = Port::with_open_fn(
            Path::new(FAKE_PORT),
            |_: &Path| -> serialport::Result<Box<dyn SerialPort>> {
                Err(serialport::Error::new(
                    serialport::ErrorKind::NoDevice,
                    "no device",
                ))
            },
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_write() {
        let (mut port, handle) = initialize_port();

        port.write_all(b"KEY 0 1000\r").unwrap();
        port.flush().unwrap();

        assert_eq!(b"KEY 0 1000\r".to_vec(), handle.written());
    }

    #[test]
    fn test_bytes_to_read_and_read_available() {
        let (mut port, handle) = initialize_port();

        // Nothing is buffered yet
        assert_eq!(0, port.bytes_to_read().unwrap());
        assert_eq!(Vec::<u8>::new(), port.read_available().unwrap());

        // A scripted reply becomes available once a full frame is written
        handle.push_reply(b"ACK");
        port.write_all(b"KEY 0 1000\r").unwrap();

        assert_eq!(3, port.bytes_to_read().unwrap());
        assert_eq!(b"ACK".to_vec(), port.read_available().unwrap());

        // The buffer is drained exactly once
        assert_eq!(0, port.bytes_to_read().unwrap());
        assert_eq!(Vec::<u8>::new(), port.read_available().unwrap());
    }

    #[test]
    fn test_transport_errors() {
        let (mut port, handle) = initialize_port();

        handle.set_has_error(true);

        assert!(port.write_all(b"VON\r").is_err());
        assert!(port.bytes_to_read().is_err());
        assert!(port.read_available().is_err());

        // The port remains usable once the fault clears
        handle.set_has_error(false);

        assert!(port.write_all(b"VON\r").is_ok());
    }
}
