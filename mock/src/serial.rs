//! A mock serial port implementation.

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// The buffers on either side of the simulated link.
#[derive(Default)]
struct Buffers {
    /// Every byte the host has written to the port.
    written: Vec<u8>,
    /// Bytes buffered for the host to read.
    read_buf: Vec<u8>,
    /// Scripted replies, released one per carriage-return-terminated frame the host writes.
    replies: VecDeque<Vec<u8>>,
}

/// A serial port implementation that plays the part of the hardware: each scripted reply is
/// placed in the read buffer when the host finishes writing a `\r`-terminated command frame.
/// Frames written with no reply scripted go unanswered.
///
/// This type is a handle that can be cloned to control the port from multiple locations.
#[derive(Clone)]
pub struct TestPort {
    /// The port's internal buffers.
    buffers: Arc<Mutex<Buffers>>,
    /// Whether the port has an error. Simulates a transport fault if `true`.
    has_error: Arc<AtomicBool>,
}

impl TestPort {
    /// Returns a new `TestPort` with no errors and no scripted replies.
    pub fn new() -> serialport::Result<Self> {
        Ok(Self {
            buffers: Arc::new(Mutex::new(Buffers::default())),
            has_error: Arc::new(false.into()),
        })
    }

    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }

    pub fn set_has_error(&self, has_error: bool) {
        self.has_error.store(has_error, Ordering::SeqCst);
    }

    /// Scripts `reply` to be sent in response to the next unanswered command frame.
    pub fn push_reply(&self, reply: &[u8]) {
        self.buffers().replies.push_back(reply.to_vec());
    }

    /// Returns every byte written to the port so far.
    pub fn written(&self) -> Vec<u8> {
        self.buffers().written.clone()
    }

    /// Returns the `\r`-terminated frames written to the port so far, terminators removed.
    /// Trailing bytes not yet terminated are omitted.
    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        let buffers = self.buffers();
        let mut frames: Vec<Vec<u8>> = buffers
            .written
            .split(|&b| b == b'\r')
            .map(<[u8]>::to_vec)
            .collect();

        // `split` yields one more chunk than there are terminators
        frames.pop();
        frames
    }

    // Returns `Err` if the `has_error` flag is true.
    fn try_access(&self) -> io::Result<()> {
        if self.has_error() {
            Err(io::ErrorKind::BrokenPipe.into())
        } else {
            Ok(())
        }
    }

    /// Returns a reference to the port's internal buffers.
    fn buffers(&self) -> MutexGuard<Buffers> {
        self.buffers.lock().unwrap()
    }
}

impl Write for TestPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.try_access()?;

        let mut buffers = self.buffers();
        buffers.written.extend_from_slice(buf);

        // Each completed frame releases one scripted reply, if any remain
        let frames_completed = buf.iter().filter(|&&b| b == b'\r').count();
        for _ in 0..frames_completed {
            if let Some(reply) = buffers.replies.pop_front() {
                buffers.read_buf.extend_from_slice(&reply);
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.try_access()
    }
}

impl Read for TestPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.try_access().map(|_| {
            let mut buffers = self.buffers();

            // Read bytes equal to the smaller of the lengths of the target buffer and the
            // internal buffer
            let bytes = buf.len().min(buffers.read_buf.len());
            buf[..bytes].copy_from_slice(&buffers.read_buf[..bytes]);

            // Clear the read bytes
            if bytes == buffers.read_buf.len() {
                buffers.read_buf.clear();
            } else {
                buffers.read_buf = buffers.read_buf[bytes..].to_vec();
            }

            bytes
        })
    }
}

impl SerialPort for TestPort {
    fn name(&self) -> Option<String> {
        None
    }

    fn baud_rate(&self) -> serialport::Result<u32> {
        self.try_access().map(|_| 9600).map_err(Into::into)
    }

    fn data_bits(&self) -> serialport::Result<DataBits> {
        self.try_access().map(|_| DataBits::Eight).map_err(Into::into)
    }

    fn flow_control(&self) -> serialport::Result<FlowControl> {
        self.try_access().map(|_| FlowControl::None).map_err(Into::into)
    }

    fn parity(&self) -> serialport::Result<Parity> {
        self.try_access().map(|_| Parity::None).map_err(Into::into)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn set_baud_rate(&mut self, _baud_rate: u32) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn stop_bits(&self) -> serialport::Result<StopBits> {
        self.try_access().map(|_| StopBits::One).map_err(Into::into)
    }

    fn set_data_bits(&mut self, _data_bits: DataBits) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn set_flow_control(&mut self, _flow_control: FlowControl) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn set_parity(&mut self, _parity: Parity) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn set_stop_bits(&mut self, _stop_bits: StopBits) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn set_timeout(&mut self, _timeout: Duration) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn write_request_to_send(&mut self, _level: bool) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn write_data_terminal_ready(&mut self, _level: bool) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn read_clear_to_send(&mut self) -> serialport::Result<bool> {
        self.try_access().map(|_| true).map_err(Into::into)
    }

    fn read_ring_indicator(&mut self) -> serialport::Result<bool> {
        self.try_access().map(|_| true).map_err(Into::into)
    }

    fn read_carrier_detect(&mut self) -> serialport::Result<bool> {
        self.try_access().map(|_| true).map_err(Into::into)
    }

    fn bytes_to_read(&self) -> serialport::Result<u32> {
        self.try_access()
            .map(|_| self.buffers().read_buf.len() as u32)
            .map_err(Into::into)
    }

    fn bytes_to_write(&self) -> serialport::Result<u32> {
        self.try_access().map(|_| 0).map_err(Into::into)
    }

    fn read_data_set_ready(&mut self) -> serialport::Result<bool> {
        self.try_access().map(|_| true).map_err(Into::into)
    }

    fn clear(&self, buffer_to_clear: ClearBuffer) -> serialport::Result<()> {
        self.try_access()?;

        let mut buffers = self.buffers();
        match buffer_to_clear {
            ClearBuffer::Input => buffers.read_buf.clear(),
            ClearBuffer::Output => buffers.written.clear(),
            ClearBuffer::All => {
                buffers.read_buf.clear();
                buffers.written.clear();
            }
        }

        Ok(())
    }

    fn try_clone(&self) -> serialport::Result<Box<dyn SerialPort>> {
        Ok(Box::new(self.clone()))
    }

    fn set_break(&self) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }

    fn clear_break(&self) -> serialport::Result<()> {
        self.try_access().map_err(Into::into)
    }
}
