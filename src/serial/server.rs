//! A server for serial port communication.

use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::channel::oneshot;
use serialport::Error;
use tokio::sync::watch::Receiver;

use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use super::port::{OpenPort, Port};
use super::Client;
use crate::protocol::{classify, Command, Context, ResponseOutcome};

/// How long the server sleeps between checks for a pending request.
const IDLE_POLL: Duration = Duration::from_millis(5);

/// Settle windows and polling granularity for the command/response exchange.
///
/// The hardware protocol has no reply delimiter, so the only way to know a reply is complete is
/// to give the hardware a fixed window to produce it. The server polls the receive buffer within
/// that window rather than sleeping through all of it, which lets prompt replies resolve early
/// while preserving the window as the upper bound.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    /// How long to wait for a reply to a key-press command.
    pub key_press_settle: Duration,
    /// How long to wait for a reply to a toggle command.
    pub toggle_settle: Duration,
    /// How often the receive buffer is checked within a settle window.
    pub poll_interval: Duration,
}

impl Timing {
    /// Returns the settle window for replies in `context`.
    fn settle_for(&self, context: Context) -> Duration {
        match context {
            Context::KeyPress => self.key_press_settle,
            Context::Toggle => self.toggle_settle,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            key_press_settle: Duration::from_millis(500),
            toggle_settle: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// A request for a single command/response exchange, paired with the channel to reply on.
pub(crate) struct Request {
    pub command: Command,
    pub reply: oneshot::Sender<io::Result<ResponseOutcome>>,
}

/// A server that owns the serial port and executes command/response exchanges one at a time on
/// behalf of a [`Client`].
///
/// Exchanges are serialized by construction: the server handles one request to completion before
/// looking at the next, so the port is never accessed by two commands simultaneously.
pub struct Server {
    /// The serial port itself.
    port: Port,
    /// Settle windows for the exchange.
    timing: Timing,
    /// A receiver for exchange requests.
    rx: UnboundedReceiver<Request>,
    /// A receiver for termination signals.
    terminate_rx: Receiver<()>,
}

impl Server {
    /// Returns a new `Server` and [`Client`] for the serial port at `path`, or `Err` if the
    /// serial port could not be opened.
    ///
    /// An open failure is fatal: no `Server` or `Client` is constructed and the caller must not
    /// proceed to accept commands. `terminate_rx` is watched for a signal that the process is
    /// shutting down, in which case the server loop exits and the port is closed.
    pub fn new(
        path: &Path,
        timing: Timing,
        terminate_rx: Receiver<()>,
    ) -> Result<(Server, Client), Error> {
        Port::open(path).map(|port| Server::with_port(port, timing, terminate_rx))
    }

    /// Like [`new`][Self::new], but accesses the serial port at `path` by calling
    /// `port_open_fn`.
    pub fn with_port_open_fn<F: OpenPort>(
        path: &Path,
        port_open_fn: F,
        timing: Timing,
        terminate_rx: Receiver<()>,
    ) -> Result<(Server, Client), Error> {
        Port::with_open_fn(path, port_open_fn)
            .map(|port| Server::with_port(port, timing, terminate_rx))
    }

    fn with_port(port: Port, timing: Timing, terminate_rx: Receiver<()>) -> (Server, Client) {
        let (tx, rx) = mpsc::unbounded();

        let server = Server {
            port,
            timing,
            rx,
            terminate_rx,
        };

        (server, Client::new(tx))
    }

    /// Runs the serial exchange server loop until the client is dropped or termination is
    /// signaled.
    ///
    /// A separate thread must be used for this as it blocks for the lifetime of the client.
    pub fn run(mut self) {
        loop {
            // Watch for termination signal
            if self.terminate_rx.has_changed().unwrap_or(true) {
                break;
            }

            match self.rx.try_next() {
                // Execute the next exchange and report its outcome. The client may have been
                // dropped while the exchange ran, so a failed reply send is ignored.
                Ok(Some(request)) => {
                    let result = self.execute(request.command);
                    let _ = request.reply.send(result);
                }
                // All clients are gone; no more requests can arrive
                Ok(None) => break,
                // No request is pending
                Err(_) => thread::sleep(IDLE_POLL),
            }
        }
    }

    /// Executes one full exchange: write the command frame, wait out the settle window, then
    /// drain and classify whatever the hardware sent back.
    ///
    /// Transport failures are returned as `Err` for the caller to report; they do not terminate
    /// the server, and the port remains open for subsequent exchanges.
    fn execute(&mut self, command: Command) -> io::Result<ResponseOutcome> {
        let frame = command.encode();
        self.port.write_all(&frame)?;
        self.port.flush()?;

        let raw = self.drain_within(self.timing.settle_for(command.context()))?;

        Ok(classify(&raw, command.context()))
    }

    /// Polls the receive buffer for up to `settle` and returns the buffered reply bytes, or an
    /// empty buffer if the window elapses with nothing received.
    ///
    /// Once bytes appear, one extra poll interval is granted for the remainder of the reply to
    /// arrive before the buffer is drained.
    fn drain_within(&mut self, settle: Duration) -> io::Result<Vec<u8>> {
        let deadline = Instant::now() + settle;

        loop {
            if self.port.bytes_to_read()? > 0 {
                thread::sleep(self.timing.poll_interval);
                return self.port.read_available();
            }

            if Instant::now() >= deadline {
                return Ok(Vec::new());
            }

            thread::sleep(self.timing.poll_interval);
        }
    }
}
