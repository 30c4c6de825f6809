//! Encoding of outgoing commands.

use super::Context;

/// The number of keys on the keypad-emulation board.
pub const KEY_COUNT: u8 = 8;

/// The default key closure duration, in milliseconds.
pub const DEFAULT_KEY_PRESS_MS: u32 = 1000;

/// A symbolic command for the hardware. Serialized to a single ASCII line terminated by a
/// carriage return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Pulse key `index` closed for `duration_ms` milliseconds.
    KeyPress {
        index: u8,
        duration_ms: u32,
    },
    /// Turn the vending machine on or off.
    VendingToggle {
        turning_on: bool,
    },
}

impl Command {
    /// Returns a key-press command for `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in `[0, KEY_COUNT)`. Callers must validate untrusted input
    /// before constructing the command.
    pub fn key_press(index: u8, duration_ms: u32) -> Self {
        assert!(index < KEY_COUNT, "key index out of range: {}", index);

        Command::KeyPress {
            index,
            duration_ms,
        }
    }

    /// Returns a vending machine toggle command.
    pub fn vending_toggle(turning_on: bool) -> Self {
        Command::VendingToggle {
            turning_on,
        }
    }

    /// Encodes the command as the exact byte sequence to write to the serial port.
    ///
    /// This performs no validation; see [`key_press`][Self::key_press].
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Command::KeyPress { index, duration_ms } => {
                format!("KEY {} {}\r", index, duration_ms).into_bytes()
            }
            Command::VendingToggle { turning_on: true } => b"VON\r".to_vec(),
            Command::VendingToggle { turning_on: false } => b"VOFF\r".to_vec(),
        }
    }

    /// Returns the response context this command's reply is classified under.
    pub fn context(&self) -> Context {
        match self {
            Command::KeyPress { .. } => Context::KeyPress,
            Command::VendingToggle { .. } => Context::Toggle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key_press() {
        for index in 0..KEY_COUNT {
            let expected = format!("KEY {} 1000\r", index).into_bytes();
            assert_eq!(expected, Command::key_press(index, 1000).encode());
        }

        // No leading zeros, no trailing newline
        assert_eq!(b"KEY 0 1\r".to_vec(), Command::key_press(0, 1).encode());
        assert_eq!(b"KEY 7 250\r".to_vec(), Command::key_press(7, 250).encode());
    }

    #[test]
    fn test_encode_toggle() {
        assert_eq!(b"VON\r".to_vec(), Command::vending_toggle(true).encode());
        assert_eq!(b"VOFF\r".to_vec(), Command::vending_toggle(false).encode());
    }

    #[test]
    #[should_panic(expected = "key index out of range")]
    fn test_key_press_index_out_of_range() {
        Command::key_press(KEY_COUNT, 1000);
    }

    #[test]
    fn test_context() {
        assert_eq!(Context::KeyPress, Command::key_press(0, 1000).context());
        assert_eq!(Context::Toggle, Command::vending_toggle(true).context());
    }
}
