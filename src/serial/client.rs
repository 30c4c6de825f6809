//! A client for executing commands through the serial I/O server.

use futures::channel::mpsc::UnboundedSender;
use futures::channel::oneshot;

use std::io;

use super::server::Request;
use crate::protocol::{Command, ResponseOutcome, DEFAULT_KEY_PRESS_MS};
use crate::toggle::ToggleState;

/// A handle for sending commands to the serial I/O [`Server`][super::Server] and receiving
/// classified outcomes back.
///
/// A single client is provided when the serial port is first opened, and it should be passed
/// around as needed. Its command methods take `&mut self` and resolve an exchange fully before
/// returning, so no two commands are ever in flight at the same time.
pub struct Client {
    /// A sender for exchange requests.
    tx: UnboundedSender<Request>,
    /// The vending machine state, advanced by each [`send_toggle`][Self::send_toggle] call.
    toggle: ToggleState,
    /// The key closure duration used for key-press commands.
    key_press_ms: u32,
}

impl Client {
    pub(crate) fn new(tx: UnboundedSender<Request>) -> Self {
        Client {
            tx,
            toggle: ToggleState::default(),
            key_press_ms: DEFAULT_KEY_PRESS_MS,
        }
    }

    /// Sets the key closure duration for subsequent key-press commands.
    pub fn set_key_press_ms(&mut self, key_press_ms: u32) {
        self.key_press_ms = key_press_ms;
    }

    /// Returns the current vending machine state.
    pub fn toggle_state(&self) -> ToggleState {
        self.toggle
    }

    /// Pulses key `index` and returns the classified reply.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a valid key index. Nothing is written to the port in that case.
    pub async fn send_key_press(&mut self, index: u8) -> io::Result<ResponseOutcome> {
        self.request(Command::key_press(index, self.key_press_ms)).await
    }

    /// Sends the command that switches the vending machine to the opposite of the current state
    /// and returns the new state along with the classified reply.
    ///
    /// The state advances after every send attempt, whether or not the hardware acknowledged
    /// the command. This matches the behavior of the original operator console for this
    /// hardware; see `DESIGN.md`.
    pub async fn send_toggle(&mut self) -> (ToggleState, io::Result<ResponseOutcome>) {
        let command = Command::vending_toggle(!self.toggle.is_on());
        let result = self.request(command).await;
        let new_state = self.toggle.flip();

        (new_state, result)
    }

    /// Submits one exchange to the server and waits for its outcome.
    async fn request(&mut self, command: Command) -> io::Result<ResponseOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();

        let request = Request {
            command,
            reply: reply_tx,
        };

        // Both failure paths mean the server loop has exited and no further exchanges are
        // possible
        self.tx
            .unbounded_send(request)
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;

        reply_rx
            .await
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?
    }
}
